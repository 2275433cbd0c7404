use thiserror::Error;

/// revdash error types
#[derive(Error, Debug)]
pub enum RevdashError {
    /// Request to the data endpoint could not be completed
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for revdash
pub type Result<T> = std::result::Result<T, RevdashError>;
