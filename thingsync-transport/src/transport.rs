//! Transport layer abstraction.
//!
//! Defines the operations a thing store must support, allowing the sync
//! engine to work with any backend (remote HTTP APIs, in-memory stores,
//! message brokers, …).

use crate::error::TransportResult;
use async_trait::async_trait;
use thingsync_types::{Band, BandSet, ThingId, ThingRef, ValueEnvelope};
use tokio::sync::mpsc;

/// Selects which things a subscription observes.
///
/// Absent fields match everything: the default watch observes every band
/// of every thing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watch {
    /// Only observe this thing.
    pub id: Option<ThingId>,
    /// Only observe this band.
    pub band: Option<Band>,
}

impl Watch {
    /// Watches every thing and band.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Watches every band of one thing.
    #[must_use]
    pub fn thing(id: impl Into<ThingId>) -> Self {
        Self {
            id: Some(id.into()),
            band: None,
        }
    }

    /// Watches one band of one thing.
    #[must_use]
    pub fn band(id: impl Into<ThingId>, band: impl Into<Band>) -> Self {
        Self {
            id: Some(id.into()),
            band: Some(band.into()),
        }
    }

    /// Whether a change to `id` (and optionally `band`) falls under this
    /// watch.
    #[must_use]
    pub fn matches(&self, id: &ThingId, band: Option<&Band>) -> bool {
        if let Some(want) = &self.id {
            if want != id {
                return false;
            }
        }
        if let Some(want) = &self.band {
            if band != Some(want) {
                return false;
            }
        }
        true
    }
}

/// A store of thing state reachable through a small set of abstract
/// operations.
///
/// Implementations translate these operations onto their backend; the
/// engine holds a `dyn ThingTransport` and never sees backend details.
/// Backends that cannot provide an operation return
/// [`TransportError::Unsupported`](crate::TransportError::Unsupported)
/// rather than approximating it.
#[async_trait]
pub trait ThingTransport: Send + Sync {
    /// Enumerates every thing in the store.
    ///
    /// Items come back in the order the store reports them; stores that
    /// paginate fetch pages sequentially so ordering is preserved.
    async fn list(&self) -> TransportResult<Vec<ThingRef>>;

    /// Fetches the value of one band, or of the whole thing when the
    /// reference carries no band.
    async fn get(&self, thing: &ThingRef) -> TransportResult<ValueEnvelope>;

    /// Discovers which bands a thing currently exposes.
    async fn bands(&self, id: &ThingId) -> TransportResult<BandSet>;

    /// Writes a value.
    ///
    /// Returns the envelope as accepted by the store, which may differ
    /// from the input when the store canonicalizes values on write.
    async fn put(&self, envelope: ValueEnvelope) -> TransportResult<ValueEnvelope>;

    /// Subscribes to value changes falling under `watch`.
    ///
    /// Yields one envelope per observed change until the receiver is
    /// dropped.
    async fn updated(&self, watch: &Watch) -> TransportResult<mpsc::Receiver<ValueEnvelope>>;

    /// Subscribes to things newly appearing under `watch`.
    async fn added(&self, watch: &Watch) -> TransportResult<mpsc::Receiver<ThingRef>>;

    /// Removes a band, or a whole thing when the reference carries no
    /// band.
    async fn remove(&self, thing: &ThingRef) -> TransportResult<()>;
}

/// An in-memory transport for testing.
pub mod mock {
    use super::*;
    use crate::error::TransportError;
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// Notifications queued per watcher before older ones are dropped.
    const WATCH_BUFFER: usize = 64;

    #[derive(Default)]
    struct State {
        things: BTreeMap<ThingId, BTreeMap<Band, Map<String, Value>>>,
        update_watchers: Vec<(Watch, mpsc::Sender<ValueEnvelope>)>,
        added_watchers: Vec<(Watch, mpsc::Sender<ThingRef>)>,
    }

    /// A transport backed by a map, with working change notification.
    ///
    /// Implements the full capability set, including the subscription
    /// operations remote backends may not be able to provide.
    #[derive(Clone, Default)]
    pub struct MemoryTransport {
        state: Arc<Mutex<State>>,
    }

    impl MemoryTransport {
        /// Creates an empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds one band of a thing without notifying watchers.
        pub fn seed(
            &self,
            id: impl Into<ThingId>,
            band: impl Into<Band>,
            value: Map<String, Value>,
        ) {
            let mut state = self.state.lock().unwrap();
            state
                .things
                .entry(id.into())
                .or_default()
                .insert(band.into(), value);
        }
    }

    #[async_trait]
    impl ThingTransport for MemoryTransport {
        async fn list(&self) -> TransportResult<Vec<ThingRef>> {
            let state = self.state.lock().unwrap();
            Ok(state.things.keys().cloned().map(ThingRef::thing).collect())
        }

        async fn get(&self, thing: &ThingRef) -> TransportResult<ValueEnvelope> {
            let state = self.state.lock().unwrap();
            let bands = state.things.get(&thing.id).ok_or_else(|| {
                TransportError::Network(format!("no such thing: {}", thing.id))
            })?;

            let value = match &thing.band {
                Some(band) => bands.get(band).cloned().ok_or_else(|| {
                    TransportError::Network(format!("no such band: {}/{}", thing.id, band))
                })?,
                // thing-level read: one key per band, as remote stores
                // report it
                None => bands
                    .iter()
                    .map(|(band, value)| (band.to_string(), Value::Object(value.clone())))
                    .collect(),
            };

            Ok(ValueEnvelope {
                id: thing.id.clone(),
                band: thing.band.clone(),
                value,
            })
        }

        async fn bands(&self, id: &ThingId) -> TransportResult<BandSet> {
            let state = self.state.lock().unwrap();
            let bands = state
                .things
                .get(id)
                .ok_or_else(|| TransportError::Network(format!("no such thing: {id}")))?;
            Ok(BandSet::new(id.clone(), bands.keys().cloned()))
        }

        async fn put(&self, envelope: ValueEnvelope) -> TransportResult<ValueEnvelope> {
            let Some(band) = envelope.band.clone() else {
                return Err(TransportError::Unsupported(
                    "put: the memory store holds values per band",
                ));
            };

            let mut state = self.state.lock().unwrap();
            let is_new = !state.things.contains_key(&envelope.id);
            state
                .things
                .entry(envelope.id.clone())
                .or_default()
                .insert(band.clone(), envelope.value.clone());

            if is_new {
                let added = ThingRef::thing(envelope.id.clone());
                state.added_watchers.retain(|(watch, tx)| {
                    if tx.is_closed() {
                        return false;
                    }
                    if watch.matches(&envelope.id, None) {
                        // a full buffer drops the notification
                        let _ = tx.try_send(added.clone());
                    }
                    true
                });
            }

            state.update_watchers.retain(|(watch, tx)| {
                if tx.is_closed() {
                    return false;
                }
                if watch.matches(&envelope.id, Some(&band)) {
                    let _ = tx.try_send(envelope.clone());
                }
                true
            });

            Ok(envelope)
        }

        async fn updated(&self, watch: &Watch) -> TransportResult<mpsc::Receiver<ValueEnvelope>> {
            let (tx, rx) = mpsc::channel(WATCH_BUFFER);
            self.state
                .lock()
                .unwrap()
                .update_watchers
                .push((watch.clone(), tx));
            Ok(rx)
        }

        async fn added(&self, watch: &Watch) -> TransportResult<mpsc::Receiver<ThingRef>> {
            let (tx, rx) = mpsc::channel(WATCH_BUFFER);
            self.state
                .lock()
                .unwrap()
                .added_watchers
                .push((watch.clone(), tx));
            Ok(rx)
        }

        async fn remove(&self, thing: &ThingRef) -> TransportResult<()> {
            let mut state = self.state.lock().unwrap();

            match &thing.band {
                Some(band) => {
                    let now_empty = {
                        let bands = state.things.get_mut(&thing.id).ok_or_else(|| {
                            TransportError::Network(format!("no such thing: {}", thing.id))
                        })?;
                        if bands.remove(band).is_none() {
                            return Err(TransportError::Network(format!(
                                "no such band: {}/{}",
                                thing.id, band
                            )));
                        }
                        bands.is_empty()
                    };
                    if now_empty {
                        state.things.remove(&thing.id);
                    }
                }
                None => {
                    if state.things.remove(&thing.id).is_none() {
                        return Err(TransportError::Network(format!(
                            "no such thing: {}",
                            thing.id
                        )));
                    }
                }
            }

            Ok(())
        }
    }
}
