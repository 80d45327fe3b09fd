//! Homestar cloud transport implementation.
//!
//! Speaks the Homestar HTTP API: GET for listing and reads, PUT with a
//! JSON body for writes. Listings paginate through `pivot` continuation
//! tokens; response objects carry metadata under `@`-prefixed keys.

use crate::error::{TransportError, TransportResult};
use crate::remote::channel::ChannelCodec;
use crate::transport::{ThingTransport, Watch};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thingsync_types::{stamp, Band, BandSet, ThingId, ThingRef, ValueEnvelope};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Homestar-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomestarConfig {
    /// Base URL of the Homestar API.
    pub api: String,
    /// Identifier of the machine whose things live in the remote store.
    pub machine_id: String,
    /// Which of the machine's stores to address.
    pub store: String,
    /// Log every request and its outcome at info level.
    pub verbose: bool,
    /// Stamp outgoing values with `@timestamp` when the caller did not.
    pub add_timestamp: bool,
    /// Report writes as applied without waiting for a change
    /// notification.
    pub optimistic: bool,
}

impl Default for HomestarConfig {
    fn default() -> Self {
        Self {
            api: "https://api.homestar.io".to_owned(),
            machine_id: String::new(),
            store: "things".to_owned(),
            verbose: false,
            add_timestamp: true,
            optimistic: true,
        }
    }
}

/// Homestar API response structures.
#[derive(Debug, Deserialize)]
struct ListPage {
    /// Paths of the things on this page, server-relative.
    #[serde(default)]
    thing: Vec<String>,
    /// Continuation token; absent on the last page.
    pivot: Option<String>,
}

/// Homestar transport implementation.
#[derive(Debug)]
pub struct HomestarTransport {
    config: HomestarConfig,
    codec: ChannelCodec,
    client: Client,
}

impl HomestarTransport {
    /// Creates a transport from its configuration.
    ///
    /// Fails with [`TransportError::Config`] before any network activity
    /// when `machine_id` or `store` is empty or `api` is not a usable
    /// URL.
    pub fn new(config: HomestarConfig) -> TransportResult<Self> {
        let codec = ChannelCodec::new(&config.api, &config.machine_id, &config.store)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            codec,
            client,
        })
    }

    /// The configuration the transport was built from.
    #[must_use]
    pub fn config(&self) -> &HomestarConfig {
        &self.config
    }

    /// The channel codec derived from the configuration.
    #[must_use]
    pub fn codec(&self) -> &ChannelCodec {
        &self.codec
    }

    /// GETs `url` and decodes the JSON body.
    async fn fetch<T>(&self, op: &'static str, url: &str) -> TransportResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!("{op}: GET {url}");
        if self.config.verbose {
            info!(url, "{op}: requesting");
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(self.failure(op, url, format!("{op} failed: {e}")));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure(op, url, format!("{op} failed: {status}: {body}")));
        }

        match response.json::<T>().await {
            Ok(decoded) => {
                if self.config.verbose {
                    info!(url, "{op}: success");
                }
                Ok(decoded)
            }
            Err(e) => Err(self.failure(op, url, format!("{op}: failed to parse response: {e}"))),
        }
    }

    fn failure(&self, op: &'static str, url: &str, error: String) -> TransportError {
        if self.config.verbose {
            info!(url, %error, "{op}: failure");
        }
        TransportError::Network(error)
    }
}

#[async_trait]
impl ThingTransport for HomestarTransport {
    async fn list(&self) -> TransportResult<Vec<ThingRef>> {
        let mut things = Vec::new();
        let mut url = self.codec.root().to_owned();

        loop {
            let page: ListPage = self.fetch("list", &url).await?;
            debug!("list: page with {} entries", page.thing.len());

            for path in &page.thing {
                let item_url = self.codec.rewrite(path)?;
                if let Some((id, _band)) = self.codec.unchannel(&item_url) {
                    things.push(ThingRef::thing(id));
                }
            }

            match page.pivot {
                Some(pivot) => url = self.codec.rewrite(&pivot)?,
                None => break,
            }
        }

        Ok(things)
    }

    async fn get(&self, thing: &ThingRef) -> TransportResult<ValueEnvelope> {
        let url = self.codec.channel(&thing.id, thing.band.as_ref());
        let mut value: Map<String, Value> = self.fetch("get", &url).await?;
        value.remove("@id");

        Ok(ValueEnvelope {
            id: thing.id.clone(),
            band: thing.band.clone(),
            value,
        })
    }

    async fn bands(&self, id: &ThingId) -> TransportResult<BandSet> {
        let url = self.codec.channel(id, None);
        let value: Map<String, Value> = self.fetch("bands", &url).await?;

        let bands = value
            .keys()
            .filter(|key| !key.starts_with('@'))
            .map(|key| Band::from(key.as_str()));
        Ok(BandSet::new(id.clone(), bands))
    }

    async fn put(&self, mut envelope: ValueEnvelope) -> TransportResult<ValueEnvelope> {
        let url = self.codec.channel(&envelope.id, envelope.band.as_ref());

        if self.config.add_timestamp {
            stamp(&mut envelope.value);
        }

        debug!("put: PUT {url}");
        if self.config.verbose {
            info!(url, "put: sending value");
        }

        let response = match self.client.put(&url).json(&envelope.value).send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(self.failure("put", &url, format!("put failed: {e}")));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure("put", &url, format!("put failed: {status}: {body}")));
        }

        if self.config.verbose {
            info!(url, "put: success");
        }

        // the server may canonicalize the value on write; its version wins
        let body = response.text().await.unwrap_or_default();
        if let Ok(Value::Object(mut body)) = serde_json::from_str::<Value>(&body) {
            if let Some(Value::Object(canonical)) = body.remove("value") {
                envelope.value = canonical;
            }
        }

        Ok(envelope)
    }

    async fn updated(&self, _watch: &Watch) -> TransportResult<mpsc::Receiver<ValueEnvelope>> {
        Err(TransportError::Unsupported(
            "updated: the Homestar API exposes no change feed",
        ))
    }

    async fn added(&self, _watch: &Watch) -> TransportResult<mpsc::Receiver<ThingRef>> {
        Err(TransportError::Unsupported(
            "added: the Homestar API exposes no change feed",
        ))
    }

    async fn remove(&self, _thing: &ThingRef) -> TransportResult<()> {
        Err(TransportError::Unsupported(
            "remove: the Homestar API exposes no delete operation",
        ))
    }
}
