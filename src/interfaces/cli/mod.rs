//! Command-line interface of the `kpsym` binary.

use std::path::{Path, PathBuf};

use anyhow::{self, format_err};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;

use crate::io::format::kpsym_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted `kpsym` heading to the `kpsym-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    kpsym_output!("╭─────────────────────────────────────────────────────────────────────────────╮");
    kpsym_output!("│  k   k  ppppp   sssss  y   y  m   m                                         │");
    kpsym_output!("│  k  k   p    p  s       y y   mm mm                                         │");
    kpsym_output!("│  kkk    ppppp   sssss    y    m m m                                         │");
    kpsym_output!("│  k  k   p           s    y    m   m                                         │");
    kpsym_output!("│  k   k  p       sssss    y    m   m                                         │");
    kpsym_output!("│                                                                             │");
    kpsym_output!("│  Brillouin-zone k-point symmetry reduction                    {version:>13} │");
    kpsym_output!("╰─────────────────────────────────────────────────────────────────────────────╯");
    kpsym_output!("");
}

/// Command-line arguments of the `kpsym` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML input file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Optional path to a file to which the main output is also written.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Increases the verbosity of diagnostic messages on the standard error. May be given
    /// several times.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Configures `log4rs` for the `kpsym` binary.
///
/// Messages to the `kpsym-output` target are written to the standard output, and also to
/// `output` if given. All other messages go to the standard error, filtered by `verbose`.
///
/// # Arguments
///
/// * `output` - An optional path to an output file, which is truncated.
/// * `verbose` - The verbosity level: `0` for warnings, `1` for information, `2` for debugging
///   messages, and anything higher for tracing messages.
pub fn setup_logging(output: Option<&Path>, verbose: u8) -> Result<log4rs::Handle, anyhow::Error> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}",
        )))
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build("kpsym-stdout", Box::new(stdout)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        );
    let mut output_appenders = vec!["kpsym-stdout"];
    if let Some(path) = output {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{m}{n}")))
            .append(false)
            .build(path)
            .map_err(|err| format_err!("Unable to open {}: {err}", path.display()))?;
        builder = builder.appender(Appender::builder().build("kpsym-file", Box::new(file)));
        output_appenders.push("kpsym-file");
    }
    let config = builder
        .logger(
            Logger::builder()
                .appenders(output_appenders)
                .additive(false)
                .build("kpsym-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|err| format_err!(err))?;
    log4rs::init_config(config).map_err(|err| format_err!(err))
}
