//! Error types for chunkdoc
//!
//! Provides a unified error type for chunking, reconstruction, and the
//! store-facing layers built on top of them.

use thiserror::Error;

/// Result type alias for chunkdoc operations
pub type Result<T> = std::result::Result<T, ChunkDocError>;

/// Unified error type for chunkdoc
#[derive(Error, Debug)]
pub enum ChunkDocError {
    // ===== Caller Errors =====
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid document name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    // ===== Invariant Violations =====
    #[error("Integrity error: {0}")]
    Integrity(String),

    // ===== Reconstruction Errors =====
    #[error("Missing chunk: {hash}")]
    MissingChunk { hash: String },

    // ===== Lifecycle Errors =====
    #[error("Validation rejected: {0}")]
    ValidationRejected(String),

    #[error("Codec error: {0}")]
    Codec(String),

    // ===== Storage Errors =====
    #[error("Storage error: {0}")]
    Storage(String),

    // ===== I/O Errors =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Serialization Errors =====
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChunkDocError {
    /// Whether the error was caused by bad caller input rather than by
    /// stored data or a defect.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ChunkDocError::Configuration(_) | ChunkDocError::InvalidName { .. }
        )
    }
}

impl From<bincode::Error> for ChunkDocError {
    fn from(err: bincode::Error) -> Self {
        ChunkDocError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ChunkDocError {
    fn from(err: serde_json::Error) -> Self {
        ChunkDocError::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for ChunkDocError {
    fn from(err: base64::DecodeError) -> Self {
        ChunkDocError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChunkDocError::MissingChunk {
            hash: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Missing chunk: abc");

        let err = ChunkDocError::InvalidName {
            name: "a/b".to_string(),
            reason: "must not contain '/'",
        };
        assert_eq!(
            err.to_string(),
            "Invalid document name \"a/b\": must not contain '/'"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChunkDocError = io_err.into();
        assert!(matches!(err, ChunkDocError::Io(_)));
    }

    #[test]
    fn test_is_configuration() {
        assert!(ChunkDocError::Configuration("x".into()).is_configuration());
        assert!(!ChunkDocError::Integrity("x".into()).is_configuration());
    }
}
