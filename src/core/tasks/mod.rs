pub mod handle;
pub mod scheduler;

pub use handle::{
    CancelToken,
    TaskHandle,
};
pub use scheduler::{
    Scheduler,
    REMINDER_ALARM,
};
