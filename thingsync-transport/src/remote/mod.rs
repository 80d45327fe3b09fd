//! Remote HTTP transports.
//!
//! Thing state held by a cloud store, addressed through channel URLs and
//! read and written with plain HTTP requests.

pub mod channel;
pub mod homestar;

pub use channel::ChannelCodec;
pub use homestar::{HomestarConfig, HomestarTransport};
