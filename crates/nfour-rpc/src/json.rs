//! Concrete JSON envelope codec (C8), grounded on
//! `rpc/proto/jsonproto.go`'s `JsonProtoReq`/`JsonProtoRes` (same shape
//! reused for both directions) and its `jsonSerCodec`/`jsonClientCodec`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::{ClientCodec, SrvCodec};
use crate::error::RpcError;

/// The request/response envelope: a routing `key` plus an opaque `body`.
/// The source reuses one struct shape (`JsonProtoRes` is a type alias over
/// `JsonProtoReq`) for both directions; this does the same.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub key: String,
    pub body: Vec<u8>,
}

pub type JsonProtoReq = JsonEnvelope;
pub type JsonProtoRes = JsonEnvelope;

/// Extracts the routing key a `Router` dispatches on.
pub fn json_key_extractor(req: &JsonEnvelope) -> Option<String> {
    Some(req.key.clone())
}

/// Default error-to-response mapper: the routing key's error message goes
/// back in the body, and the key (when known) is preserved in the
/// envelope so the caller can tell which request failed.
pub fn json_error_to_res() -> crate::router::HandleErrorFunc<JsonEnvelope, String> {
    Arc::new(|err, key| JsonEnvelope {
        key: key.unwrap_or_default(),
        body: err.to_string().into_bytes(),
    })
}

pub struct JsonSrvCodec;

impl SrvCodec<JsonEnvelope, JsonEnvelope> for JsonSrvCodec {
    fn decode(&self, payload: &[u8]) -> Result<JsonEnvelope, RpcError> {
        serde_json::from_slice(payload).map_err(|e| RpcError::Codec(e.to_string()))
    }

    fn encode(&self, res: &JsonEnvelope) -> Result<Vec<u8>, RpcError> {
        serde_json::to_vec(res).map_err(|e| RpcError::Codec(e.to_string()))
    }
}

pub struct JsonClientCodec;

impl ClientCodec<JsonEnvelope, JsonEnvelope> for JsonClientCodec {
    fn encode(&self, req: &JsonEnvelope) -> Result<Vec<u8>, RpcError> {
        serde_json::to_vec(req).map_err(|e| RpcError::Codec(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<JsonEnvelope, RpcError> {
        serde_json::from_slice(payload).map_err(|e| RpcError::Codec(e.to_string()))
    }
}

/// Builds the `Working` closure plus a router pre-wired to the JSON
/// envelope codec, mirroring `NewJsonRpcSrvWorking`.
pub fn new_json_rpc_working(
    error_to_res: crate::router::HandleErrorFunc<JsonEnvelope, String>,
) -> (
    nfour::duplex::Working,
    std::sync::Arc<crate::router::Router<JsonEnvelope, JsonEnvelope, String>>,
) {
    crate::router::new_rpc_working(
        Arc::new(JsonSrvCodec),
        json_key_extractor,
        error_to_res,
    )
}

/// Builds an RPC client pre-wired to the JSON envelope codec, mirroring
/// `NewJsonRpcClient`.
pub fn new_json_rpc_client(
    trans: std::sync::Arc<nfour::duplex::Transport>,
) -> crate::client::Client<JsonEnvelope, JsonEnvelope> {
    crate::client::Client::new(Arc::new(JsonClientCodec), trans)
}
