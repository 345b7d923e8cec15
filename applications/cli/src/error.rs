/// Command line errors
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// Missing or malformed arguments
    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 1,
            CliError::Config(_) => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
