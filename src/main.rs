use anyhow;
use clap::Parser;

use kpsym::interfaces::cli::{log_heading, setup_logging, Cli};
use kpsym::interfaces::input::Input;
use kpsym::interfaces::InputHandle;
use kpsym::io::read_kpsym_yaml;

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    setup_logging(cli.output.as_deref(), cli.verbose)?;
    log_heading();

    let input = read_kpsym_yaml::<Input, _>(&cli.config).map_err(|err| {
        log::error!("Unable to read {}: {err}", cli.config.display());
        err
    })?;
    input.handle()
}
