pub mod client;
pub mod service;
pub mod types;

pub use client::RemoteServiceClient;
pub use service::FlashcardService;
pub use types::ServiceMessage;
