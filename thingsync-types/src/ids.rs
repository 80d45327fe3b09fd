//! Identifier types used throughout the ThingSync core.
//!
//! Thing and band identifiers are opaque strings assigned by the store
//! that owns the thing; the core never parses or interprets them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a thing (a logical device or entity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThingId(String);

impl ThingId {
    /// Creates a thing ID from an existing identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID, returning the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThingId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ThingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ThingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Name of a band, one named sub-channel of a thing's state
/// (e.g. `"meta"`, `"ota"`, `"istate"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Band(String);

impl Band {
    /// Creates a band name from an existing string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the band name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the band, returning the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Band {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Band {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Band {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
