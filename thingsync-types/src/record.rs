//! Parameter records exchanged between the sync engine and transports.
//!
//! All three records are transient: a transport builds them per operation
//! and nothing holds them beyond the call that produced them.

use crate::ids::{Band, ThingId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Reference to a thing, optionally narrowed to one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingRef {
    /// The thing being referenced.
    pub id: ThingId,
    /// Absent means the whole thing rather than a specific band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<Band>,
}

impl ThingRef {
    /// References a whole thing.
    #[must_use]
    pub fn thing(id: impl Into<ThingId>) -> Self {
        Self {
            id: id.into(),
            band: None,
        }
    }

    /// References one band of a thing.
    #[must_use]
    pub fn band(id: impl Into<ThingId>, band: impl Into<Band>) -> Self {
        Self {
            id: id.into(),
            band: Some(band.into()),
        }
    }
}

/// A value read from or written to a thing.
///
/// `value` is an untyped JSON object; its interpretation belongs to the
/// band it was read from. Transports that stamp outgoing writes add an
/// [`@timestamp`](crate::TIMESTAMP_KEY) field to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEnvelope {
    /// The thing the value belongs to.
    pub id: ThingId,
    /// Absent when the value spans the whole thing rather than one band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<Band>,
    /// The payload.
    pub value: Map<String, Value>,
}

impl ValueEnvelope {
    /// Creates an envelope for one band of a thing.
    #[must_use]
    pub fn new(
        id: impl Into<ThingId>,
        band: impl Into<Band>,
        value: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            band: Some(band.into()),
            value,
        }
    }

    /// Creates a thing-level envelope (no band).
    #[must_use]
    pub fn thing_level(id: impl Into<ThingId>, value: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            band: None,
            value,
        }
    }

    /// The reference this envelope was read from or written to.
    #[must_use]
    pub fn to_ref(&self) -> ThingRef {
        ThingRef {
            id: self.id.clone(),
            band: self.band.clone(),
        }
    }
}

/// The set of bands a thing currently exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSet {
    /// The thing whose bands these are.
    pub id: ThingId,
    /// Every band present on the thing, in lexical order.
    pub bands: BTreeSet<Band>,
}

impl BandSet {
    /// Creates a band set from any iterator of band names.
    #[must_use]
    pub fn new(id: impl Into<ThingId>, bands: impl IntoIterator<Item = Band>) -> Self {
        Self {
            id: id.into(),
            bands: bands.into_iter().collect(),
        }
    }

    /// Whether the thing exposes the named band.
    #[must_use]
    pub fn contains(&self, band: &Band) -> bool {
        self.bands.contains(band)
    }
}
