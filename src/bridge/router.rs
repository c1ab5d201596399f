use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
};

use futures::{
    future::BoxFuture,
    FutureExt,
};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{
    debug,
    warn,
};

use super::{
    client::BridgePort,
    types::{
        Action,
        BridgeResponse,
        Envelope,
        Reply,
    },
};
use crate::core::{
    errors::UNKNOWN_ACTION_MESSAGE,
    CardpopError,
};

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, CardpopError>> + Send + Sync>;

/// Controller-side handler table. Every request runs on its own task, so a
/// slow handler never delays replies to unrelated requests.
#[derive(Default, Clone)]
pub struct Router {
    handlers: HashMap<Action, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, action: Action, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CardpopError>> + Send + 'static,
    {
        self.handlers.insert(action, Arc::new(move |payload| handler(payload).boxed()));
    }

    pub fn handles(&self, action: Action) -> bool {
        self.handlers.contains_key(&action)
    }

    fn lookup(&self, name: &str) -> Option<Handler> {
        Action::parse(name).and_then(|action| self.handlers.get(&action).cloned())
    }

    pub fn serve(self, port: BridgePort) -> JoinHandle<()> {
        let BridgePort { mut requests, replies } = port;

        tokio::spawn(async move {
            while let Some(envelope) = requests.recv().await {
                let Envelope { correlation_id, action, payload } = envelope;

                let Some(handler) = self.lookup(&action) else {
                    warn!("[Bridge] No handler for action '{}'", action);
                    let response = BridgeResponse::error(UNKNOWN_ACTION_MESSAGE);
                    let _ = replies.send(Reply { correlation_id, response });
                    continue;
                };

                let replies = replies.clone();
                tokio::spawn(async move {
                    debug!("[Bridge] Handling {}", action);
                    let response = BridgeResponse::from(handler(payload).await);
                    if replies.send(Reply { correlation_id, response }).is_err() {
                        debug!("[Bridge] Caller side closed before {} finished", action);
                    }
                });
            }
            debug!("[Bridge] Request channel closed, router stopping");
        })
    }
}
