//! Codec contracts (C8): translate between wire bytes and typed
//! request/response values. Grounded on `rpc/server.go`'s `SrvCodec` and
//! `rpc/client.go`'s `ClientCodec`; kept as two separate traits since a
//! server decodes requests and encodes responses while a client does the
//! reverse.

use crate::error::RpcError;

/// Server-side: decode an incoming request, encode an outgoing response.
pub trait SrvCodec<Req, Res>: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<Req, RpcError>;
    fn encode(&self, res: &Res) -> Result<Vec<u8>, RpcError>;
}

/// Client-side: encode an outgoing request, decode an incoming response.
pub trait ClientCodec<Req, Res>: Send + Sync {
    fn encode(&self, req: &Req) -> Result<Vec<u8>, RpcError>;
    fn decode(&self, payload: &[u8]) -> Result<Res, RpcError>;
}
