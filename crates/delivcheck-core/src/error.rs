use thiserror::Error;

/// Core error type shared across delivcheck crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The archive could not be opened or an entry could not be read.
    #[error("archive error: {0}")]
    Archive(String),
    /// A rule payload violates its invariants.
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Archive(err.to_string())
    }
}

/// Convenience alias for results returned by delivcheck crates.
pub type Result<T> = std::result::Result<T, Error>;
