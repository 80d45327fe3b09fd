//! Wire timestamps.
//!
//! Values written through a transport may carry an `@timestamp` field
//! recording when the write was issued. Timestamps travel as ISO-8601 /
//! RFC 3339 strings in UTC with millisecond precision, so they sort
//! lexicographically in time order.

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The reserved key under which transports stamp outgoing values.
pub const TIMESTAMP_KEY: &str = "@timestamp";

/// A wire timestamp (UTC wall-clock instant).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Renders the wire form, e.g. `2016-01-20T12:34:56.789Z`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parses a wire timestamp.
    pub fn parse(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| Error::InvalidTimestamp(format!("{s:?}: {e}")))
    }
}

/// Adds `@timestamp` to `value` unless the caller already supplied one.
///
/// Returns whether a stamp was added.
pub fn stamp(value: &mut Map<String, Value>) -> bool {
    if value.contains_key(TIMESTAMP_KEY) {
        return false;
    }

    value.insert(
        TIMESTAMP_KEY.to_owned(),
        Value::String(Timestamp::now().to_wire()),
    );
    true
}
