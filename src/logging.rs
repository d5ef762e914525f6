use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;
use thiserror::Error;

const LOG_FILE: &str = "erse_pricing.log";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {M} - {m}{n}";

/// Sets up logging to file, and optionally to stdout
///
/// # Arguments
///
/// * 'log_path' - directory to put the log file in
/// * 'log_level' - the level to log at
/// * 'log_to_stdout' - whether to also log to stdout
pub fn setup_logger(log_path: &str, log_level: LevelFilter, log_to_stdout: bool) -> Result<Handle, LoggerError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(format!("{}{}", log_path, LOG_FILE))
        .map_err(|e| LoggerError::FileAppenderError(e.to_string()))?;

    let mut builder = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let config = builder
        .build(root.build(log_level))
        .map_err(|e| LoggerError::ConfigError(e.to_string()))?;

    log4rs::init_config(config)
        .map_err(|e| LoggerError::InitError(e.to_string()))
}

/// Error depicting errors that occur while setting up logging
///
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("FileAppenderError: {0}")]
    FileAppenderError(String),
    #[error("ConfigError: {0}")]
    ConfigError(String),
    #[error("InitError: {0}")]
    InitError(String),
}
