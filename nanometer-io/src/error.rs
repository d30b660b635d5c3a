//! Error types for Nanometer IO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Nanometer IO error types
///
/// Only [`Error::Config`] is fatal by policy. Every other variant is
/// recovered locally by substituting empty or default point data so the
/// output device never stalls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unrecognized protocol message
    #[error("Protocol decode error: {0}")]
    Decode(String),

    /// Message could not be serialized
    #[error("Protocol encode error: {0}")]
    Encode(String),

    /// Peer closed the connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// A point request is already waiting for its response
    #[error("A point request is already outstanding")]
    RequestInFlight,

    /// Local point source produced nothing, even after a restart
    #[error("Point source exhausted")]
    SourceExhausted,

    /// Configuration or wiring error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// True when the error means the peer is gone (clean or abrupt close)
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
