pub mod api;
pub mod auth;
pub mod background;
pub mod bridge;
pub mod console;
pub mod core;
pub mod overlay;
pub mod persistence;
pub mod review;

#[cfg(test)]
pub(crate) mod testing;

pub use background::Background;
pub use crate::core::{
    CardpopError,
    Config,
    ConfigStore,
};
pub use review::ReviewFlowController;
