use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BloomError>;

#[derive(Error, Debug)]
pub enum BloomError {
    /// The stream ended before a complete header or payload was read.
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid comment: {0}")]
    InvalidComment(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

// Truncation gets its own variant so callers can tell "need more data"
// apart from a broken stream.
impl From<io::Error> for BloomError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            BloomError::UnexpectedEof
        } else {
            BloomError::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        assert!(matches!(BloomError::from(eof), BloomError::UnexpectedEof));

        let other = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        match BloomError::from(other) {
            BloomError::Io(err) => {
                assert_eq!(err.kind(), io::ErrorKind::PermissionDenied)
            }
            err => panic!("expected Io, got {err:?}"),
        }
    }

    #[test]
    fn test_display_prefixes() {
        let err = BloomError::InvalidFormat("bad magic".to_string());
        assert_eq!(err.to_string(), "invalid format: bad magic");
        let err = BloomError::InvalidConfig("rate".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: rate");
    }
}
