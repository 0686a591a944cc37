//! RPC client (C8), grounded on `rpc/client.go`'s `Client[REQ, RES]`: pairs
//! a `ClientCodec` with a duplex transport so callers exchange typed values
//! instead of raw frames.

use std::sync::Arc;

use nfour::config::ReqTimeout;
use nfour::duplex::Transport;

use crate::codec::ClientCodec;
use crate::error::RpcError;

pub struct Client<Req, Res> {
    codec: Arc<dyn ClientCodec<Req, Res>>,
    trans: Arc<Transport>,
}

impl<Req, Res> Client<Req, Res> {
    pub fn new(codec: Arc<dyn ClientCodec<Req, Res>>, trans: Arc<Transport>) -> Self {
        Self { codec, trans }
    }

    /// Encodes `req`, sends it over the transport, and decodes the
    /// matching response.
    pub async fn send_request(
        &self,
        req: &Req,
        req_timeout: ReqTimeout,
    ) -> Result<Res, RpcError> {
        let payload = self.codec.encode(req)?;
        let res_buff = self.trans.send_payload(payload, req_timeout).await?;
        self.codec.decode(&res_buff)
    }

    /// Shuts the underlying transport down; every in-flight request fails
    /// with a transport-shutdown error.
    pub fn shutdown(&self) {
        self.trans.shutdown();
    }
}
