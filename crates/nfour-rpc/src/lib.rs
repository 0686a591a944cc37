//! RPC layer (C8) over `nfour`'s duplex transport: a codec contract, a
//! method router, a typed client, and a ready-to-use JSON envelope codec.
//! Grounded on the source's `nfour/rpc` and `nfour/rpc/proto` packages.

pub mod client;
pub mod codec;
pub mod error;
pub mod json;
pub mod router;

pub use client::Client;
pub use codec::{ClientCodec, SrvCodec};
pub use error::RpcError;
pub use router::{new_rpc_working, HandleBiz, HandleErrorFunc, Router};
