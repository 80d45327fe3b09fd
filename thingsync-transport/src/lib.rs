//! Thing-state transports for ThingSync.
//!
//! A *transport* moves thing state between the sync engine and a backing
//! store. This crate defines the transport capability interface and
//! ships the remote HTTP transport speaking to the Homestar cloud API.
//!
//! # Architecture
//!
//! - **transport** — the abstract operations every store must support
//!   (list, get, bands, put, updated, added, remove), plus an in-memory
//!   implementation for tests
//! - **remote** — the Homestar binding: channel/URL derivation and the
//!   HTTP client translating each operation into one request chain
//!
//! Operations are strictly request/response. `list` follows `pivot`
//! continuation tokens page by page; pages are fetched sequentially, so
//! items keep the order the server reports them in.
//!
//! # Example
//!
//! ```no_run
//! use thingsync_transport::{HomestarConfig, HomestarTransport, ThingTransport};
//!
//! # async fn demo() -> thingsync_transport::TransportResult<()> {
//! let transport = HomestarTransport::new(HomestarConfig {
//!     machine_id: "0C5B0AE2-4D29-4A9E-B29A-D6B1D0AA1E29".to_owned(),
//!     ..Default::default()
//! })?;
//!
//! for thing in transport.list().await? {
//!     println!("{}", thing.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod remote;
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use remote::{ChannelCodec, HomestarConfig, HomestarTransport};
pub use transport::{ThingTransport, Watch};
