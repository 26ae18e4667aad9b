//! Error types for DrishtiIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Push or pop against a stream identifier that was never registered
    #[error("Unknown stream: {0}")]
    UnknownStream(String),

    /// Stream identifier registered a second time
    #[error("Stream already registered: {0}")]
    DuplicateStream(String),

    /// Timestamp too large for 32-bit wire seconds
    #[error("Timestamp overflow: {0} us exceeds wire time range")]
    TimestampOverflow(u64),

    /// Malformed frame on the serial link
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Wire serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
