use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
    time::Instant,
};

use serde::{
    de::DeserializeOwned,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};
use tokio::sync::{
    mpsc,
    oneshot,
};
use tracing::{
    debug,
    warn,
};
use uuid::Uuid;

use super::types::{
    Action,
    BridgeResponse,
    CardPayload,
    CardRef,
    ConfigPayload,
    Envelope,
    Reply,
    ReviewPayload,
    TimerPayload,
};
use crate::{
    api::ServiceMessage,
    core::{
        CardId,
        CardpopError,
        Config,
        Flashcard,
        Grade,
    },
};

struct PendingRequest {
    action: String,
    sent_time: Instant,
    reply: oneshot::Sender<BridgeResponse>,
}

type PendingTable = Arc<Mutex<HashMap<Uuid, PendingRequest>>>;

/// Controller-side ends of the bridge, handed to a `Router`.
pub struct BridgePort {
    pub requests: mpsc::UnboundedReceiver<Envelope>,
    pub replies: mpsc::UnboundedSender<Reply>,
}

/// UI-side handle. Each `send` parks a pending request keyed by a fresh
/// correlation id; the reply pump resolves exactly that request.
#[derive(Clone)]
pub struct BridgeClient {
    outbound: mpsc::UnboundedSender<Envelope>,
    pending: PendingTable,
}

/// Opens a bridge and starts its reply pump. Must run inside a tokio runtime.
pub fn open() -> (BridgeClient, BridgePort) {
    let (outbound, requests) = mpsc::unbounded_channel();
    let (replies, reply_receiver) = mpsc::unbounded_channel();
    let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));

    tokio::spawn(pump_replies(reply_receiver, pending.clone()));

    (BridgeClient { outbound, pending }, BridgePort { requests, replies })
}

async fn pump_replies(mut replies: mpsc::UnboundedReceiver<Reply>, pending: PendingTable) {
    while let Some(reply) = replies.recv().await {
        let request = pending.lock().ok().and_then(|mut table| table.remove(&reply.correlation_id));
        match request {
            Some(request) => {
                debug!(
                    "[Bridge] {} answered after {:?}",
                    request.action,
                    request.sent_time.elapsed()
                );
                // The caller may have given up; nothing else to do then.
                let _ = request.reply.send(reply.response);
            }
            None => warn!("[Bridge] Reply for unknown request {}", reply.correlation_id),
        }
    }

    // Channel closed: dropping the senders rejects every waiting caller.
    if let Ok(mut table) = pending.lock() {
        if !table.is_empty() {
            warn!("[Bridge] Reply channel closed with {} pending requests", table.len());
        }
        table.clear();
    }
}

impl BridgeClient {
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|table| table.len()).unwrap_or(0)
    }

    pub async fn send(
        &self,
        action: Action,
        payload: Value,
    ) -> Result<Map<String, Value>, CardpopError> {
        self.send_raw(action.name(), payload).await
    }

    /// Sends an action by name, bypassing the typed vocabulary.
    pub async fn send_raw(
        &self,
        action: &str,
        payload: Value,
    ) -> Result<Map<String, Value>, CardpopError> {
        let correlation_id = Uuid::new_v4();
        let (reply, receiver) = oneshot::channel();

        {
            let mut table = self
                .pending
                .lock()
                .map_err(|_| CardpopError::Bridge("Pending table poisoned".to_string()))?;
            table.insert(
                correlation_id,
                PendingRequest { action: action.to_string(), sent_time: Instant::now(), reply },
            );
        }

        let envelope = Envelope { correlation_id, action: action.to_string(), payload };
        if self.outbound.send(envelope).is_err() {
            if let Ok(mut table) = self.pending.lock() {
                table.remove(&correlation_id);
            }
            return Err(CardpopError::ChannelClosed);
        }

        match receiver.await {
            Ok(response) => response.into_result(),
            Err(_) => Err(CardpopError::ChannelClosed),
        }
    }

    async fn send_typed<P: Serialize>(
        &self,
        action: Action,
        payload: &P,
    ) -> Result<Map<String, Value>, CardpopError> {
        self.send(action, serde_json::to_value(payload)?).await
    }

    pub async fn fetch_next_flashcard(&self) -> Result<Flashcard, CardpopError> {
        let data = self.send(Action::FetchNextFlashcard, Value::Null).await?;
        field(data, "flashcard")
    }

    pub async fn review_flashcard(
        &self,
        card_id: CardId,
        grade: Grade,
    ) -> Result<ServiceMessage, CardpopError> {
        let data = self.send_typed(Action::ReviewFlashcard, &ReviewPayload { card_id, grade }).await?;
        message(data)
    }

    pub async fn edit_flashcard(
        &self,
        card_id: CardId,
        front: &str,
        back: &str,
    ) -> Result<ServiceMessage, CardpopError> {
        let payload = CardPayload {
            card_id: Some(card_id),
            card_front: front.to_string(),
            card_back: back.to_string(),
        };
        message(self.send_typed(Action::EditFlashcard, &payload).await?)
    }

    pub async fn add_flashcard(&self, front: &str, back: &str) -> Result<ServiceMessage, CardpopError> {
        let payload =
            CardPayload { card_id: None, card_front: front.to_string(), card_back: back.to_string() };
        message(self.send_typed(Action::AddFlashcard, &payload).await?)
    }

    pub async fn delete_flashcard(&self, card_id: CardId) -> Result<ServiceMessage, CardpopError> {
        message(self.send_typed(Action::DeleteFlashcard, &CardRef { card_id }).await?)
    }

    pub async fn list_flashcards(&self) -> Result<Vec<Flashcard>, CardpopError> {
        let data = self.send(Action::ListFlashcards, Value::Null).await?;
        field(data, "flashcards")
    }

    pub async fn login(&self) -> Result<(), CardpopError> {
        self.send(Action::Login, Value::Null).await.map(|_| ())
    }

    pub async fn logout(&self) -> Result<ServiceMessage, CardpopError> {
        message(self.send(Action::Logout, Value::Null).await?)
    }

    pub async fn validate_authentication(&self) -> Result<ServiceMessage, CardpopError> {
        message(self.send(Action::ValidateAuthentication, Value::Null).await?)
    }

    pub async fn reset_timer(&self, minutes: u32) -> Result<(), CardpopError> {
        self.send_typed(Action::ResetTimer, &TimerPayload { minutes }).await.map(|_| ())
    }

    pub async fn get_config(&self) -> Result<Config, CardpopError> {
        field(self.send(Action::GetConfig, Value::Null).await?, "config")
    }

    pub async fn set_config(&self, config: Config) -> Result<Config, CardpopError> {
        let data = self.send_typed(Action::SetConfig, &ConfigPayload { config }).await?;
        field(data, "config")
    }
}

fn field<T: DeserializeOwned>(mut data: Map<String, Value>, key: &str) -> Result<T, CardpopError> {
    let value = data
        .remove(key)
        .ok_or_else(|| CardpopError::Bridge(format!("Reply is missing '{key}'")))?;
    Ok(serde_json::from_value(value)?)
}

fn message(data: Map<String, Value>) -> Result<ServiceMessage, CardpopError> {
    Ok(serde_json::from_value(Value::Object(data))?)
}
