pub mod client;
pub mod router;
pub mod types;

pub use client::{
    open,
    BridgeClient,
    BridgePort,
};
pub use router::Router;
pub use types::{
    Action,
    BridgeResponse,
};
