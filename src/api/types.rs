use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    CardId,
    Grade,
};

/// Generic acknowledgement body returned by most service endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMessage {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
}

impl ServiceMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), id: None }
    }

    /// Whether a validate-authentication reply reports a signed-in user.
    pub fn is_authenticated(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("authenticated")
            && !message.contains("not ")
            && !message.contains("unauthenticated")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewBody {
    pub grade: Grade,
}

#[derive(Debug, Serialize)]
pub(crate) struct CardBody<'a> {
    pub card_front: &'a str,
    pub card_back: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn detail_message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(detail) => Some(detail.clone()),
            other => Some(other.to_string()),
        }
    }
}
