//! Core type definitions for ThingSync.
//!
//! This crate defines the fundamental, transport-agnostic types used
//! throughout the sync engine:
//! - Thing and band identifiers (opaque, assigned by whichever store owns
//!   the thing)
//! - The parameter records exchanged with transports (references, value
//!   envelopes, band sets)
//! - Wire timestamps (ISO-8601 in UTC, millisecond precision)
//!
//! Transport-specific types (URLs, channels, pagination cursors) belong in
//! their respective transport crates, not here.

mod ids;
mod record;
mod timestamp;

pub use ids::{Band, ThingId};
pub use record::{BandSet, ThingRef, ValueEnvelope};
pub use timestamp::{stamp, Timestamp, TIMESTAMP_KEY};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
