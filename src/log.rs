//! The program logger.
//!
//! Log messages are written to stderr so that stdout only ever carries JSON results.
use anyhow::{Context, Result};
use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::env;
use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};

/// The default log level for the program.
///
/// Used when neither the settings file nor the `LCOE_LOG_LEVEL` environment variable specify one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which overrides the log level from the settings file
const LOG_LEVEL_ENV_VAR: &str = "LCOE_LOG_LEVEL";

/// Set once the logger has been installed
static LOGGER_INITIALISED: OnceLock<()> = OnceLock::new();

/// Held while the logger is being installed
static LOGGER_INIT_LOCK: Mutex<()> = Mutex::new(());

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INITIALISED.get().is_some()
}

/// Resolve the log level to use, giving precedence to the environment variable
fn get_log_level(log_level_from_settings: &str) -> Result<LevelFilter> {
    let log_level = env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| log_level_from_settings.into());
    LevelFilter::from_str(log_level.trim())
        .with_context(|| format!("Invalid log level: {log_level}"))
}

/// Initialise the program logger.
///
/// Calling this more than once is harmless: only the first call installs a logger.
///
/// # Arguments
///
/// * `log_level_from_settings` - The log level specified in the program settings (e.g. "info")
pub fn init(log_level_from_settings: &str) -> Result<()> {
    let _guard = LOGGER_INIT_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if is_logger_initialised() {
        return Ok(());
    }

    let level = get_log_level(log_level_from_settings)?;
    let use_colour = std::io::stderr().is_terminal();
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    Dispatch::new()
        .format(move |out, message, record| {
            let timestamp = Local::now().format("%H:%M:%S");
            if use_colour {
                out.finish(format_args!(
                    "[{timestamp} {} {}] {message}",
                    colours.color(record.level()),
                    record.target()
                ));
            } else {
                out.finish(format_args!(
                    "[{timestamp} {} {}] {message}",
                    record.level(),
                    record.target()
                ));
            }
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("Logger already set")?;

    let _ = LOGGER_INITIALISED.set(());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("info", LevelFilter::Info)]
    #[case("warn", LevelFilter::Warn)]
    #[case(" DEBUG ", LevelFilter::Debug)]
    #[case("off", LevelFilter::Off)]
    fn get_log_level_from_settings(#[case] level: &str, #[case] expected: LevelFilter) {
        // NB: the environment variable is never set in unit tests
        assert_eq!(get_log_level(level).unwrap(), expected);
    }

    #[test]
    fn get_log_level_invalid() {
        assert!(get_log_level("loud").is_err());
    }
}
