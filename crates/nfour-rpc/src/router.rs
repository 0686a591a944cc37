//! Method router (C8), grounded on `rpc/server.go`'s `SrvRouter`: a
//! concurrent key-to-handler table, a key extractor pulled out of each
//! decoded request, and an error-to-response mapper for both decode
//! failures and unregistered keys.
//!
//! The source's `Register` uses `sync.Map.LoadOrStore`, so the first
//! handler registered for a key wins and later registrations are logged
//! and dropped. This router instead lets the most recent registration win,
//! logging a warning on overwrite rather than discarding it — see
//! `DESIGN.md` for why that reading was chosen.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

use crate::codec::SrvCodec;
use crate::error::RpcError;
use nfour::duplex::{HandlerError, Working};

pub type HandleBiz<Req, Res> = Arc<dyn Fn(&Req) -> Result<Res, RpcError> + Send + Sync>;
pub type HandleErrorFunc<Res, Key> = Arc<dyn Fn(&RpcError, Option<Key>) -> Res + Send + Sync>;

pub struct Router<Req, Res, Key: Eq + Hash + Clone + Debug + Send + Sync + 'static> {
    codec: Arc<dyn SrvCodec<Req, Res>>,
    table: DashMap<Key, HandleBiz<Req, Res>>,
    key_extractor: Box<dyn Fn(&Req) -> Option<Key> + Send + Sync>,
    error_to_res: HandleErrorFunc<Res, Key>,
}

impl<Req, Res, Key> Router<Req, Res, Key>
where
    Key: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    pub fn new(
        codec: Arc<dyn SrvCodec<Req, Res>>,
        key_extractor: impl Fn(&Req) -> Option<Key> + Send + Sync + 'static,
        error_to_res: HandleErrorFunc<Res, Key>,
    ) -> Arc<Self> {
        Arc::new(Self {
            codec,
            table: DashMap::new(),
            key_extractor: Box::new(key_extractor),
            error_to_res,
        })
    }

    /// Registers `handler` under `key`. A prior registration for the same
    /// key is replaced; a warning is logged either way so an accidental
    /// double-registration is visible.
    pub fn register(&self, key: Key, handler: HandleBiz<Req, Res>) {
        if self.table.insert(key.clone(), handler).is_some() {
            tracing::warn!(?key, "handler overwritten for key");
        }
    }

    fn run(&self, req: &Req) -> Res {
        let Some(key) = (self.key_extractor)(req) else {
            return (self.error_to_res)(&RpcError::BadRequest, None);
        };
        // Clone the handler out and drop the shard guard before calling it,
        // so a slow handler never holds the table's lock.
        let handler = self.table.get(&key).map(|h| h.clone());
        match handler {
            Some(handler) => match handler(req) {
                Ok(res) => res,
                Err(e) => (self.error_to_res)(&e, Some(key)),
            },
            None => (self.error_to_res)(&RpcError::BadRequest, Some(key)),
        }
    }
}

/// Builds the `nfour::duplex::Working` closure a server hands to
/// `Server::new`, plus the router used to register handlers, mirroring
/// `NewRpcWorking`'s pairing of the two.
pub fn new_rpc_working<Req, Res, Key>(
    codec: Arc<dyn SrvCodec<Req, Res>>,
    key_extractor: impl Fn(&Req) -> Option<Key> + Send + Sync + 'static,
    error_to_res: HandleErrorFunc<Res, Key>,
) -> (Working, Arc<Router<Req, Res, Key>>)
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    Key: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    let router = Router::new(codec.clone(), key_extractor, error_to_res);
    let router_for_closure = router.clone();
    let working: Working = Arc::new(move |payload: Vec<u8>| {
        let req = match codec.decode(&payload) {
            Ok(req) => req,
            Err(e) => {
                let res = (router_for_closure.error_to_res)(&e, None);
                let bytes = codec
                    .encode(&res)
                    .map_err(|e| Box::new(e) as HandlerError)?;
                return Ok(bytes);
            }
        };
        let res = router_for_closure.run(&req);
        codec.encode(&res).map_err(|e| Box::new(e) as HandlerError)
    });
    (working, router)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCodec;

    impl SrvCodec<String, String> for EchoCodec {
        fn decode(&self, payload: &[u8]) -> Result<String, RpcError> {
            Ok(String::from_utf8_lossy(payload).into_owned())
        }
        fn encode(&self, res: &String) -> Result<Vec<u8>, RpcError> {
            Ok(res.clone().into_bytes())
        }
    }

    fn test_router() -> Arc<Router<String, String, String>> {
        let error_to_res: HandleErrorFunc<String, String> = Arc::new(|e, key| match key {
            Some(key) => format!("err:{key}:{e}"),
            None => format!("err:{e}"),
        });
        Router::new(Arc::new(EchoCodec), |req: &String| Some(req.clone()), error_to_res)
    }

    #[test]
    fn second_registration_wins_and_warns() {
        let router = test_router();
        router.register("ping".into(), Arc::new(|_req| Ok("first".to_string())));
        router.register("ping".into(), Arc::new(|_req| Ok("second".to_string())));
        assert_eq!(router.run(&"ping".to_string()), "second");
    }

    #[test]
    fn unknown_key_routes_through_error_to_res() {
        let router = test_router();
        router.register("ping".into(), Arc::new(|_req| Ok("pong".to_string())));
        assert_eq!(router.run(&"missing".to_string()), "err:missing:bad request");
    }
}
