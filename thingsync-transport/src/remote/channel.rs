//! Channel derivation for remote thing stores.
//!
//! A *channel* is the URL naming a thing or a thing/band pair inside one
//! machine's store on the remote API. Every channel lives under a fixed
//! prefix:
//!
//! ```text
//! {api}/iotdb/homestar/0/{machine_id}/{store}/{id}[/{band}]
//! ```
//!
//! The codec owns both directions: composing channels for requests and
//! decoding thing paths found in listing responses.

use crate::error::{TransportError, TransportResult};
use reqwest::Url;
use std::borrow::Cow;
use thingsync_types::{Band, ThingId};

/// Path segments every channel sits under, between the API host and the
/// machine/store pair.
const API_ROOT: [&str; 3] = ["iotdb", "homestar", "0"];

/// Derives and decodes channel URLs for one machine's store.
#[derive(Debug, Clone)]
pub struct ChannelCodec {
    api: Url,
    prefix: String,
}

impl ChannelCodec {
    /// Builds a codec for `machine_id`'s `store` on the API at `api`.
    ///
    /// Fails with [`TransportError::Config`] when `machine_id` or `store`
    /// is empty, or when `api` is not an absolute URL with a host.
    pub fn new(api: &str, machine_id: &str, store: &str) -> TransportResult<Self> {
        if machine_id.is_empty() {
            return Err(TransportError::Config("machine_id is required".to_owned()));
        }
        if store.is_empty() {
            return Err(TransportError::Config("store is required".to_owned()));
        }

        let parsed = Url::parse(api)
            .map_err(|e| TransportError::Config(format!("invalid api url {api:?}: {e}")))?;
        if !parsed.has_host() {
            return Err(TransportError::Config(format!("api url {api:?} has no host")));
        }

        let segments = [
            parsed.as_str(),
            API_ROOT[0],
            API_ROOT[1],
            API_ROOT[2],
            machine_id,
            store,
        ];
        let prefix = segments
            .iter()
            .map(|segment| segment.trim_matches('/'))
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            api: parsed,
            prefix,
        })
    }

    /// The listing root: the prefix every channel sits under.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.prefix
    }

    /// The channel URL for a thing or thing/band pair.
    #[must_use]
    pub fn channel(&self, id: &ThingId, band: Option<&Band>) -> String {
        let mut url = format!("{}/{}", self.prefix, urlencoding::encode(id.as_str()));
        if let Some(band) = band {
            url.push('/');
            url.push_str(&urlencoding::encode(band.as_str()));
        }
        url
    }

    /// Decodes a channel URL back into its thing/band pair.
    ///
    /// Returns `None` for URLs outside this codec's prefix, for the
    /// prefix itself, for the `.` self-reference the listing endpoint
    /// reports alongside real things, and for paths deeper than a band.
    #[must_use]
    pub fn unchannel(&self, url: &str) -> Option<(ThingId, Option<Band>)> {
        let rest = url.strip_prefix(&self.prefix)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let mut segments = rest.trim_matches('/').split('/').filter(|s| !s.is_empty());

        let id = decode(segments.next()?)?;
        if id == "." {
            return None;
        }
        let band = match segments.next() {
            Some(raw) => Some(decode(raw)?),
            None => None,
        };
        if segments.next().is_some() {
            return None;
        }

        Some((ThingId::from(id), band.map(Band::from)))
    }

    /// Resolves a path reference returned by the server (item paths,
    /// pagination pivots) against the configured API host.
    ///
    /// Scheme, host, and port always come from the configured `api`;
    /// path and query come from the reference, even when the reference
    /// is an absolute URL naming some other host.
    pub fn rewrite(&self, reference: &str) -> TransportResult<String> {
        let resolved = self.api.join(reference).map_err(|e| {
            TransportError::Network(format!("unusable path reference {reference:?}: {e}"))
        })?;

        let mut url = self.api.clone();
        url.set_path(resolved.path());
        url.set_query(resolved.query());
        Ok(url.as_str().to_owned())
    }
}

fn decode(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(Cow::into_owned)
}
