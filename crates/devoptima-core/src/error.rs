use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CorrectionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
