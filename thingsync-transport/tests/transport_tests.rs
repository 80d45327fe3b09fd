use serde_json::{json, Map, Value};
use thingsync_transport::transport::mock::MemoryTransport;
use thingsync_transport::{ThingTransport, TransportError, Watch};
use thingsync_types::{Band, ThingId, ThingRef, ValueEnvelope};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other:?}"),
    }
}

// ── Watch ─────────────────────────────────────────────────────────

#[test]
fn watch_all_matches_everything() {
    let watch = Watch::all();
    assert!(watch.matches(&ThingId::from("a"), None));
    assert!(watch.matches(&ThingId::from("b"), Some(&Band::from("meta"))));
}

#[test]
fn watch_default_is_all() {
    assert_eq!(Watch::default(), Watch::all());
}

#[test]
fn watch_thing_filters_by_id() {
    let watch = Watch::thing("a");
    assert!(watch.matches(&ThingId::from("a"), None));
    assert!(watch.matches(&ThingId::from("a"), Some(&Band::from("meta"))));
    assert!(!watch.matches(&ThingId::from("b"), None));
}

#[test]
fn watch_band_requires_the_band() {
    let watch = Watch::band("a", "meta");
    assert!(watch.matches(&ThingId::from("a"), Some(&Band::from("meta"))));
    assert!(!watch.matches(&ThingId::from("a"), Some(&Band::from("ota"))));
    assert!(!watch.matches(&ThingId::from("a"), None));
    assert!(!watch.matches(&ThingId::from("b"), Some(&Band::from("meta"))));
}

// ── MemoryTransport: basic operations ─────────────────────────────

#[tokio::test]
async fn put_then_get_roundtrip() {
    let transport = MemoryTransport::new();

    transport
        .put(ValueEnvelope::new("lamp", "istate", object(json!({"on": true}))))
        .await
        .unwrap();

    let envelope = transport
        .get(&ThingRef::band("lamp", "istate"))
        .await
        .unwrap();
    assert_eq!(envelope.value, object(json!({"on": true})));
}

#[tokio::test]
async fn list_reports_things_in_order() {
    let transport = MemoryTransport::new();
    transport.seed("c", "meta", Map::new());
    transport.seed("a", "meta", Map::new());
    transport.seed("b", "meta", Map::new());

    let things = transport.list().await.unwrap();
    let ids: Vec<_> = things.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn bands_reports_every_band() {
    let transport = MemoryTransport::new();
    transport.seed("lamp", "meta", Map::new());
    transport.seed("lamp", "istate", Map::new());

    let set = transport.bands(&"lamp".into()).await.unwrap();
    let names: Vec<_> = set.bands.iter().map(Band::as_str).collect();
    assert_eq!(names, ["istate", "meta"]);
}

#[tokio::test]
async fn thing_level_get_keys_by_band() {
    let transport = MemoryTransport::new();
    transport.seed("lamp", "meta", object(json!({"name": "Dave"})));
    transport.seed("lamp", "istate", object(json!({"on": false})));

    let envelope = transport.get(&ThingRef::thing("lamp")).await.unwrap();
    assert_eq!(
        envelope.value,
        object(json!({
            "istate": {"on": false},
            "meta": {"name": "Dave"}
        }))
    );
}

#[tokio::test]
async fn get_missing_thing_is_a_network_error() {
    let transport = MemoryTransport::new();
    let err = transport.get(&ThingRef::thing("ghost")).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)), "{err}");
}

#[tokio::test]
async fn put_without_a_band_is_unsupported() {
    let transport = MemoryTransport::new();
    let err = transport
        .put(ValueEnvelope::thing_level("lamp", Map::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Unsupported(_)), "{err}");
}

#[tokio::test]
async fn remove_band_then_thing() {
    let transport = MemoryTransport::new();
    transport.seed("lamp", "meta", Map::new());
    transport.seed("lamp", "istate", Map::new());

    transport
        .remove(&ThingRef::band("lamp", "istate"))
        .await
        .unwrap();
    let set = transport.bands(&"lamp".into()).await.unwrap();
    assert!(set.contains(&Band::from("meta")));
    assert!(!set.contains(&Band::from("istate")));

    transport.remove(&ThingRef::thing("lamp")).await.unwrap();
    assert!(transport.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_the_last_band_removes_the_thing() {
    let transport = MemoryTransport::new();
    transport.seed("lamp", "meta", Map::new());

    transport
        .remove(&ThingRef::band("lamp", "meta"))
        .await
        .unwrap();
    assert!(transport.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_missing_band_is_a_network_error() {
    let transport = MemoryTransport::new();
    transport.seed("lamp", "meta", Map::new());

    let err = transport
        .remove(&ThingRef::band("lamp", "ota"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)), "{err}");
}

// ── MemoryTransport: subscriptions ────────────────────────────────

#[tokio::test]
async fn updated_delivers_a_matching_put() {
    let transport = MemoryTransport::new();
    let mut changes = transport
        .updated(&Watch::band("lamp", "istate"))
        .await
        .unwrap();

    transport
        .put(ValueEnvelope::new("lamp", "istate", object(json!({"on": true}))))
        .await
        .unwrap();

    let change = changes.recv().await.unwrap();
    assert_eq!(change.id.as_str(), "lamp");
    assert_eq!(change.band, Some(Band::from("istate")));
    assert_eq!(change.value, object(json!({"on": true})));
}

#[tokio::test]
async fn updated_ignores_non_matching_puts() {
    let transport = MemoryTransport::new();
    let mut changes = transport.updated(&Watch::band("lamp", "meta")).await.unwrap();

    transport
        .put(ValueEnvelope::new("lamp", "istate", Map::new()))
        .await
        .unwrap();
    transport
        .put(ValueEnvelope::new("fan", "meta", Map::new()))
        .await
        .unwrap();

    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn updated_wildcard_sees_every_put() {
    let transport = MemoryTransport::new();
    let mut changes = transport.updated(&Watch::all()).await.unwrap();

    transport
        .put(ValueEnvelope::new("lamp", "istate", Map::new()))
        .await
        .unwrap();
    transport
        .put(ValueEnvelope::new("fan", "meta", Map::new()))
        .await
        .unwrap();

    assert_eq!(changes.recv().await.unwrap().id.as_str(), "lamp");
    assert_eq!(changes.recv().await.unwrap().id.as_str(), "fan");
}

#[tokio::test]
async fn added_fires_once_per_new_thing() {
    let transport = MemoryTransport::new();
    let mut added = transport.added(&Watch::all()).await.unwrap();

    transport
        .put(ValueEnvelope::new("lamp", "meta", Map::new()))
        .await
        .unwrap();
    transport
        .put(ValueEnvelope::new("lamp", "istate", Map::new()))
        .await
        .unwrap();

    assert_eq!(added.recv().await.unwrap().id.as_str(), "lamp");
    assert!(added.try_recv().is_err());
}

#[tokio::test]
async fn dropped_receivers_detach_their_watchers() {
    let transport = MemoryTransport::new();
    let changes = transport.updated(&Watch::all()).await.unwrap();
    drop(changes);

    // no watcher left; puts still succeed
    transport
        .put(ValueEnvelope::new("lamp", "istate", Map::new()))
        .await
        .unwrap();
    transport
        .put(ValueEnvelope::new("lamp", "istate", Map::new()))
        .await
        .unwrap();
}

// ── Trait objects ─────────────────────────────────────────────────

#[tokio::test]
async fn the_transport_trait_is_object_safe() {
    let transport: Box<dyn ThingTransport> = Box::new(MemoryTransport::new());
    assert!(transport.list().await.unwrap().is_empty());
}
