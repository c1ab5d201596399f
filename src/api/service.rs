use async_trait::async_trait;

use super::types::ServiceMessage;
use crate::core::{
    CardId,
    CardpopError,
    Flashcard,
    Grade,
};

/// RPC surface of the remote flashcard service.
#[async_trait]
pub trait FlashcardService: Send + Sync {
    async fn fetch_next(&self) -> Result<Flashcard, CardpopError>;

    async fn review(&self, card_id: CardId, grade: Grade) -> Result<ServiceMessage, CardpopError>;

    async fn edit(&self, card_id: CardId, front: &str, back: &str)
        -> Result<ServiceMessage, CardpopError>;

    async fn add(&self, front: &str, back: &str) -> Result<ServiceMessage, CardpopError>;

    async fn delete(&self, card_id: CardId) -> Result<ServiceMessage, CardpopError>;

    async fn list(&self) -> Result<Vec<Flashcard>, CardpopError>;

    async fn validate_authentication(&self) -> Result<ServiceMessage, CardpopError>;

    async fn logout(&self) -> Result<ServiceMessage, CardpopError>;

    /// Page the login popup is pointed at. Navigated to, never fetched.
    fn login_url(&self) -> String;
}
