use thiserror::Error;

/// Message the flashcard service returns when the review queue is empty.
pub const NO_CARDS_MESSAGE: &str = "No cards to review right now.";

/// Message a bridge reply carries when no handler matched the action.
pub const UNKNOWN_ACTION_MESSAGE: &str = "Unknown action";

#[derive(Error, Debug)]
pub enum CardpopError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(Box<reqwest::Error>),

    #[error("{message} ({status} {status_text})")]
    Service { status: u16, status_text: String, message: String },

    #[error("{}", NO_CARDS_MESSAGE)]
    NoCardsDue,

    #[error("{}", UNKNOWN_ACTION_MESSAGE)]
    UnknownAction(String),

    #[error("Bridge channel closed before a reply arrived")]
    ChannelClosed,

    #[error("{0}")]
    Bridge(String),

    #[error("Login window error: {0}")]
    Window(String),

    #[error("Overlay error: {0}")]
    Overlay(String),

    #[error("{0}")]
    Custom(String),
}

impl CardpopError {
    /// Rebuilds an error from the text carried by a `{status: error}` reply.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message == NO_CARDS_MESSAGE {
            CardpopError::NoCardsDue
        } else if message == UNKNOWN_ACTION_MESSAGE {
            CardpopError::UnknownAction(message)
        } else {
            CardpopError::Bridge(message)
        }
    }

    pub fn is_no_cards(&self) -> bool {
        match self {
            CardpopError::NoCardsDue => true,
            CardpopError::Service { message, .. } | CardpopError::Bridge(message) => {
                message == NO_CARDS_MESSAGE
            }
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CardpopError::Service { status, .. } => Some(*status),
            CardpopError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CardpopError {
    fn from(error: std::io::Error) -> Self {
        CardpopError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for CardpopError {
    fn from(error: reqwest::Error) -> Self {
        CardpopError::Http(Box::new(error))
    }
}
