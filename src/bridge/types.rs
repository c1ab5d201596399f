use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};
use uuid::Uuid;

use crate::core::{
    CardId,
    CardpopError,
    Config,
    Grade,
    NO_CARDS_MESSAGE,
};

/// Request vocabulary understood by the controller side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    FetchNextFlashcard,
    EditFlashcard,
    ReviewFlashcard,
    AddFlashcard,
    ListFlashcards,
    DeleteFlashcard,
    Login,
    Logout,
    ValidateAuthentication,
    ResetTimer,
    GetConfig,
    SetConfig,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::FetchNextFlashcard,
        Action::EditFlashcard,
        Action::ReviewFlashcard,
        Action::AddFlashcard,
        Action::ListFlashcards,
        Action::DeleteFlashcard,
        Action::Login,
        Action::Logout,
        Action::ValidateAuthentication,
        Action::ResetTimer,
        Action::GetConfig,
        Action::SetConfig,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::FetchNextFlashcard => "fetchNextFlashcard",
            Action::EditFlashcard => "editFlashcard",
            Action::ReviewFlashcard => "reviewFlashcard",
            Action::AddFlashcard => "addFlashcard",
            Action::ListFlashcards => "listFlashcards",
            Action::DeleteFlashcard => "deleteFlashcard",
            Action::Login => "login",
            Action::Logout => "logout",
            Action::ValidateAuthentication => "validateAuthentication",
            Action::ResetTimer => "resetTimer",
            Action::GetConfig => "getConfig",
            Action::SetConfig => "setConfig",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One request crossing the boundary. The action stays a string on the wire so
/// that unknown actions reach the router and get an explicit failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    pub response: BridgeResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BridgeResponse {
    Success(Map<String, Value>),
    Error { message: String },
}

impl BridgeResponse {
    /// Objects are flattened into the reply, any other value lands under `data`.
    pub fn success(value: Value) -> Self {
        match value {
            Value::Object(map) => BridgeResponse::Success(map),
            Value::Null => BridgeResponse::Success(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                BridgeResponse::Success(map)
            }
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        BridgeResponse::Error { message: message.into() }
    }

    pub fn into_result(self) -> Result<Map<String, Value>, CardpopError> {
        match self {
            BridgeResponse::Success(data) => Ok(data),
            BridgeResponse::Error { message } => Err(CardpopError::from_message(message)),
        }
    }
}

impl From<Result<Value, CardpopError>> for BridgeResponse {
    fn from(result: Result<Value, CardpopError>) -> Self {
        match result {
            Ok(value) => BridgeResponse::success(value),
            // The sentinel crosses as its bare text, without the HTTP status.
            Err(e) if e.is_no_cards() => BridgeResponse::error(NO_CARDS_MESSAGE),
            Err(e) => BridgeResponse::error(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRef {
    pub card_id: CardId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub card_id: CardId,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    pub card_front: String,
    pub card_back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerPayload {
    pub minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub config: Config,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_action_names_match_wire_vocabulary() {
        for action in Action::ALL {
            let wire = serde_json::to_value(action).unwrap();
            assert_eq!(wire, Value::String(action.name().to_string()));
            assert_eq!(Action::parse(action.name()), Some(action));
        }
        assert_eq!(Action::parse("dropTables"), None);
    }

    #[test]
    fn test_response_wire_shape() {
        let ok = BridgeResponse::success(json!({"flashcard": {"id": 1}}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "flashcard": {"id": 1}})
        );

        let err = BridgeResponse::error("Unknown action");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "message": "Unknown action"})
        );

        let parsed: BridgeResponse =
            serde_json::from_value(json!({"status": "error", "message": "boom"})).unwrap();
        assert_eq!(parsed, BridgeResponse::error("boom"));
    }

    #[test]
    fn test_error_status_is_raised() {
        let result = BridgeResponse::error("No cards to review right now.").into_result();
        assert!(matches!(result, Err(CardpopError::NoCardsDue)));

        let scalar = BridgeResponse::success(json!(5)).into_result().unwrap();
        assert_eq!(scalar.get("data"), Some(&json!(5)));
    }

    #[test]
    fn test_service_sentinel_drops_status_on_the_wire() {
        let service = CardpopError::Service {
            status: 404,
            status_text: "Not Found".to_string(),
            message: NO_CARDS_MESSAGE.to_string(),
        };
        let response = BridgeResponse::from(Err::<Value, _>(service));
        assert_eq!(response, BridgeResponse::error(NO_CARDS_MESSAGE));

        let other = CardpopError::Service {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(
            BridgeResponse::from(Err::<Value, _>(other)),
            BridgeResponse::error("boom (500 Internal Server Error)")
        );
    }
}
