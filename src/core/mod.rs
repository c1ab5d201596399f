pub mod config;
pub mod errors;
pub mod models;
pub mod tasks;

pub use config::{
    Config,
    ConfigStore,
};
pub use errors::{
    CardpopError,
    NO_CARDS_MESSAGE,
};
pub use models::{
    CardId,
    Flashcard,
    Grade,
    SessionState,
};
