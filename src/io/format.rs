//! Nice `kpsym` output formatting.

use std::fmt;

use log;

const KPSYM_BANNER_LENGTH: usize = 79;

/// Logs an error to both the default logger and the `kpsym-output` logger.
macro_rules! kpsym_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "kpsym-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `kpsym-output` logger.
macro_rules! kpsym_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "kpsym-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `kpsym-output` logger.
macro_rules! kpsym_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "kpsym-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {kpsym_error, kpsym_output, kpsym_warn};

/// Logs a nicely formatted section title to the `kpsym-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(KPSYM_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    kpsym_output!("┌──{bar}──┐");
    kpsym_output!("│§ {title:^length$} §│");
    kpsym_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `kpsym-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    kpsym_output!("{}", subtitle);
    kpsym_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// Formats a k-point in scaled coordinates with fixed-width signed components.
pub(crate) fn format_kpoint<'a, I>(components: I) -> String
where
    I: IntoIterator<Item = &'a f64>,
{
    let parts = components
        .into_iter()
        .map(|x| format!("{x:+.6}"))
        .collect::<Vec<_>>();
    format!("({})", parts.join(", "))
}

/// A trait for logging `kpsym` outputs nicely.
pub(crate) trait KPSymOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            kpsym_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> KPSymOutput for T where T: fmt::Debug + fmt::Display {}
