use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing setting: {key} - {message}")]
    MissingSetting { key: String, message: String },

    #[error("Invalid setting {key}={value}: {message}")]
    InvalidSetting {
        key: String,
        value: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
