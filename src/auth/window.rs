use crate::core::CardpopError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// Opens and tracks externally owned popup windows.
pub trait WindowManager: Send + Sync {
    fn open(&self, url: &str) -> Result<WindowHandle, CardpopError>;

    fn is_open(&self, handle: WindowHandle) -> bool;

    fn close(&self, handle: WindowHandle) -> Result<(), CardpopError>;
}

/// Login popups opened by this process, in opening order.
#[derive(Debug, Default)]
pub struct LoginWindowSet {
    handles: Vec<WindowHandle>,
}

impl LoginWindowSet {
    pub fn insert(&mut self, handle: WindowHandle) {
        if !self.handles.contains(&handle) {
            self.handles.push(handle);
        }
    }

    pub fn remove(&mut self, handle: WindowHandle) -> bool {
        let before = self.handles.len();
        self.handles.retain(|h| *h != handle);
        self.handles.len() != before
    }

    pub fn handles(&self) -> Vec<WindowHandle> {
        self.handles.clone()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
