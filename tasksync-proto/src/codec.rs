//! Binary snapshot encoding for task collections.
//!
//! Wire format: `[u8 version][postcard payload]`, where the payload is a
//! postcard-encoded `Vec<Task>`. The version byte lets older readers reject
//! snapshots they do not understand instead of misreading them.

use crate::task::Task;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Error type for snapshot encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The snapshot is empty or otherwise structurally invalid.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    /// The snapshot was written with a format this build does not read.
    #[error("unsupported snapshot version {0} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion(u8),
}

/// Encodes a task collection into a versioned binary snapshot.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the tasks cannot be serialized.
pub fn encode_snapshot(tasks: &[Task]) -> Result<Vec<u8>, CodecError> {
    let payload =
        postcard::to_allocvec(tasks).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let mut bytes = Vec::with_capacity(1 + payload.len());
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a versioned binary snapshot back into its tasks.
///
/// # Errors
///
/// Returns `CodecError::InvalidSnapshot` for empty input,
/// `CodecError::UnsupportedVersion` for an unknown version byte, or
/// `CodecError::Serialization` if the payload cannot be deserialized.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Vec<Task>, CodecError> {
    let Some((&version, payload)) = bytes.split_first() else {
        return Err(CodecError::InvalidSnapshot(
            "need at least 1 byte for the version prefix, got 0".into(),
        ));
    };
    if version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    postcard::from_bytes(payload).map_err(|e| CodecError::Serialization(e.to_string()))
}
