//! Multiplexed duplex TCP request/response transport. A single connection
//! carries many concurrent requests: one task reads frames and dispatches
//! handlers, another serializes responses back onto the socket, so a slow
//! request never blocks the ones behind it. Grounded on the source's
//! `nfour`/`nfour/duplex` packages; the simplex (one-request-per-connection)
//! server mode those packages also offer is out of scope here.

pub mod config;
pub mod duplex;
pub mod error;
pub mod framing;

pub use config::{ReqTimeout, ServerConfig, TransportConfig};
pub use error::NFourError;
pub use framing::{FrameHeader, FRAME_HEADER_SIZE, LEN_HEADER_SIZE, SEQ_ID_HEADER_SIZE};
