//! RPC-layer error taxonomy, grounded on `rpc/server.go`'s `badReqErr` and
//! the transport errors it wraps rather than replaces.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("bad request")]
    BadRequest,

    #[error("codec error: {0}")]
    Codec(String),

    #[error(transparent)]
    Transport(#[from] nfour::NFourError),
}
