pub mod host;
pub mod screen;
pub mod view;

pub use host::{
    FocusTarget,
    HostPage,
    Key,
    KeyOutcome,
    OverlayHost,
    OverlayPhase,
};
pub use screen::{
    Arbitration,
    PriorityStateMachine,
    ScreenId,
    PRIORITY_ORDER,
};
pub use view::{
    Element,
    UiAction,
    View,
};
