use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The wait for a permit was cut short because the gate was shut down.
    #[error("Interrupted wait: {0}")]
    Interrupted(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Initialization error: {0}")]
    Init(String),
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(config::ConfigError::Message(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
