//! # Domain Errors
//!
//! Capacity exhaustion, missing units, corrupt records and protocol
//! mismatches are NOT errors here: they surface as result values or log
//! lines. These types cover genuine failures at the edges.

use thiserror::Error;

/// Errors returned by the storage service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Empty or whitespace-only unit identifier on a direct lookup.
    #[error("Unit identifier must not be empty")]
    InvalidUnitId,

    /// The durable medium rejected a read or write.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Item attributes could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A replication message could not be delivered.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors from a `UnitStore`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// I/O error during read/write.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The backing medium is not available (e.g. no save loaded).
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io {
            message: err.to_string(),
        }
    }
}

/// Errors from an `ItemCodec` or the unit envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encode failed: {0}")]
    Encode(String),

    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Errors from a `Transport`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Nobody is listening on the other side.
    #[error("Transport disconnected")]
    Disconnected,

    /// The message could not be put on the wire.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
