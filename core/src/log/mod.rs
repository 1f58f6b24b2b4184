//!
//! Logger bootstrap on top of `log4rs`, plus re-exports of the `log` macros so that
//! workspace crates log through `blockdag_core::log::*`.
//!

mod appender;
mod consts;
mod logger;

pub use log::{Level, LevelFilter, debug, error, info, log_enabled, trace, warn};

use appender::AppenderSpec;
use consts::{CONSOLE_APPENDER, DEFAULT_LOGGER_ENV, ERR_LOG_FILE_APPENDER, ERR_LOG_FILE_NAME, LOG_FILE_APPENDER, LOG_FILE_NAME};
use log4rs::config::{Config, Root};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("log path is not valid UTF-8: {0}")]
    InvalidLogPath(String),

    #[error("appender error: {0}")]
    AppenderError(String),

    #[error("logger configuration error: {0}")]
    ConfigError(String),

    #[error("a global logger is already set")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Builds and installs the global logger. Output always goes to the console; when `log_dir`
/// is provided, a rolling log file and an error-only rolling log file are written there too.
///
/// `filters` follows the `RUST_LOG` syntax and is applied on top of the `RUST_LOG` environment variable.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let loggers = logger::Builder::new().parse_env(DEFAULT_LOGGER_ENV).parse_expression(filters).build();

    let mut appenders = vec![AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }
    let names = appenders.iter().map(|x| x.name).collect::<Vec<_>>();

    let config = Config::builder()
        .appenders(appenders.into_iter().map(|x| x.appender()))
        .loggers(loggers.items())
        .build(Root::builder().appenders(names).build(loggers.root_level()))
        .map_err(|err| LogError::ConfigError(err.to_string()))?;

    log4rs::init_config(config)?;
    Ok(())
}

/// Console-only logger for tests. Safe to call repeatedly; only the first call installs a logger.
pub fn try_init_logger(filters: &str) {
    let _ = init_logger(None, filters);
}
