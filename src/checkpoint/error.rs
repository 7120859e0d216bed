//! Checkpoint error types.

use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Checkpoint belongs to a different machine
    #[error("Checkpoint is for machine '{found}', expected '{expected}'")]
    MachineMismatch { expected: String, found: String },

    /// A capability needed at this point (codec, sink) was never supplied
    #[error("Missing capability: {0}")]
    MissingCapability(&'static str),

    /// The external sink rejected the checkpoint
    #[error("Checkpoint sink failed: {0}")]
    SinkFailed(String),
}
