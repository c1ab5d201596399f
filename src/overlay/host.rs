use tracing::{
    debug,
    warn,
};

use super::view::{
    Element,
    UiAction,
    View,
};
use crate::core::CardpopError;

pub const HIDDEN_OVERFLOW: &str = "hidden";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    /// Anything in the host page outside the overlay.
    Page,
    /// The overlay root itself.
    Root,
    Element(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    BackTab,
    Enter,
    Escape,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Whether the host page may see the event.
    pub propagate: bool,
    pub action: Option<UiAction>,
}

impl KeyOutcome {
    fn pass_through() -> Self {
        Self { propagate: true, action: None }
    }

    fn consumed(action: Option<UiAction>) -> Self {
        Self { propagate: false, action }
    }
}

/// The document the overlay is injected into.
pub trait HostPage {
    /// Creates the style-isolated overlay tree and attaches it to the page.
    fn mount_overlay(&mut self) -> Result<(), CardpopError>;

    /// Whether the overlay tree is still attached. Page scripts may remove it.
    fn overlay_mounted(&self) -> bool;

    fn unmount_overlay(&mut self);

    /// Starts a visual transition to `opacity`. Completion is reported back
    /// through `OverlayHost::on_transition_end`.
    fn set_overlay_opacity(&mut self, opacity: f32);

    fn scroll_overflow(&self) -> String;

    fn set_scroll_overflow(&mut self, value: &str);

    /// Rebuilds the content container from `view`.
    fn paint(&mut self, view: &View);

    fn move_focus(&mut self, target: &FocusTarget);

    /// Pauses playing audio/video. Returns how many players were paused.
    fn pause_media(&mut self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Detached,
    Shown,
    FadingOut,
}

/// Lifecycle of the isolated overlay tree: lazy mount, focus containment,
/// deferred removal after fade-out and restoration of page scrolling.
pub struct OverlayHost<H: HostPage> {
    page: H,
    phase: OverlayPhase,
    saved_overflow: Option<String>,
    view: View,
    focus: FocusTarget,
}

impl<H: HostPage> OverlayHost<H> {
    pub fn new(page: H) -> Self {
        Self {
            page,
            phase: OverlayPhase::Detached,
            saved_overflow: None,
            view: View::default(),
            focus: FocusTarget::Page,
        }
    }

    pub fn page(&self) -> &H {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut H {
        &mut self.page
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn focus(&self) -> &FocusTarget {
        &self.focus
    }

    /// The tree exists and is still attached to the page.
    pub fn is_present(&self) -> bool {
        self.phase != OverlayPhase::Detached && self.page.overlay_mounted()
    }

    pub fn ensure_mounted(&mut self) -> Result<(), CardpopError> {
        if self.phase != OverlayPhase::Detached && !self.page.overlay_mounted() {
            warn!("[Overlay] Tree was removed by the page, rebuilding");
            self.forget_detached();
        }

        match self.phase {
            OverlayPhase::Shown => {}
            OverlayPhase::FadingOut => {
                debug!("[Overlay] Fade-out interrupted by a new screen");
                self.page.set_overlay_opacity(1.0);
                self.phase = OverlayPhase::Shown;
            }
            OverlayPhase::Detached => {
                self.page.mount_overlay()?;
                self.saved_overflow = Some(self.page.scroll_overflow());
                self.page.set_scroll_overflow(HIDDEN_OVERFLOW);
                self.page.set_overlay_opacity(1.0);
                self.phase = OverlayPhase::Shown;
                debug!("[Overlay] Mounted");
            }
        }
        Ok(())
    }

    /// Replaces the content container and focuses its first focusable element.
    pub fn show(&mut self, view: View) {
        self.view = view;
        self.page.paint(&self.view);
        let target = self.first_focus_target();
        self.set_focus(target);
    }

    fn repaint(&mut self) {
        self.page.paint(&self.view);
    }

    pub fn begin_fade_out(&mut self) {
        if self.phase == OverlayPhase::Shown {
            self.page.set_overlay_opacity(0.0);
            self.phase = OverlayPhase::FadingOut;
            debug!("[Overlay] Fading out");
        }
    }

    /// Completes a fade-out. Returns true when the tree was removed.
    pub fn on_transition_end(&mut self) -> bool {
        if self.phase != OverlayPhase::FadingOut {
            return false;
        }
        if self.page.overlay_mounted() {
            self.page.unmount_overlay();
        }
        self.release();
        debug!("[Overlay] Removed after fade-out");
        true
    }

    /// Drops all state for a tree the page removed on its own.
    pub fn forget_detached(&mut self) {
        if self.phase != OverlayPhase::Detached {
            self.release();
        }
    }

    fn release(&mut self) {
        if let Some(overflow) = self.saved_overflow.take() {
            self.page.set_scroll_overflow(&overflow);
        }
        self.phase = OverlayPhase::Detached;
        self.view = View::default();
        self.focus = FocusTarget::Page;
    }

    fn first_focus_target(&self) -> FocusTarget {
        self.view
            .focusable_ids()
            .first()
            .map(|id| FocusTarget::Element(id.to_string()))
            .unwrap_or(FocusTarget::Root)
    }

    fn set_focus(&mut self, target: FocusTarget) {
        self.page.move_focus(&target);
        self.focus = target;
    }

    /// Focus moved by a means other than our keys (mouse, page script).
    pub fn on_focus_in(&mut self, target: FocusTarget) {
        if self.is_present() && target == FocusTarget::Page {
            let redirect = self.first_focus_target();
            self.set_focus(redirect);
        } else {
            self.focus = target;
        }
    }

    fn cycle_focus(&mut self, backwards: bool) {
        let ids = self.view.focusable_ids();
        if ids.is_empty() {
            self.set_focus(FocusTarget::Root);
            return;
        }

        let count = ids.len();
        let next = match &self.focus {
            FocusTarget::Element(current) => match ids.iter().position(|id| *id == current.as_str()) {
                Some(index) if backwards => (index + count - 1) % count,
                Some(index) => (index + 1) % count,
                None => 0,
            },
            FocusTarget::Page | FocusTarget::Root => 0,
        };
        let target = FocusTarget::Element(ids[next].to_string());
        self.set_focus(target);
    }

    fn focused_element(&self) -> Option<&Element> {
        match &self.focus {
            FocusTarget::Element(id) => self.view.element(id),
            _ => None,
        }
    }

    /// Routes a key event. While the overlay is present no key reaches the page.
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        if !self.is_present() {
            return KeyOutcome::pass_through();
        }
        // The old view stays painted until removal but is no longer live.
        if self.phase == OverlayPhase::FadingOut {
            return KeyOutcome::consumed(None);
        }

        match key {
            Key::Tab => {
                self.cycle_focus(false);
                KeyOutcome::consumed(None)
            }
            Key::BackTab => {
                self.cycle_focus(true);
                KeyOutcome::consumed(None)
            }
            Key::Enter => {
                let action = match self.focused_element() {
                    Some(Element::Button { action, .. }) => Some(action.clone()),
                    Some(Element::Input { submit, .. }) => submit.clone(),
                    _ => None,
                };
                KeyOutcome::consumed(action)
            }
            Key::Char(c) => KeyOutcome::consumed(self.edit_focused(|value| value.push(c))),
            Key::Backspace => KeyOutcome::consumed(self.edit_focused(|value| {
                value.pop();
            })),
            Key::Escape => KeyOutcome::consumed(None),
        }
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) -> Option<UiAction> {
        let FocusTarget::Element(id) = self.focus.clone() else {
            return None;
        };
        let change = match self.view.element(&id) {
            Some(Element::Input { change, .. }) => change.clone(),
            _ => return None,
        };
        self.view.edit_input(&id, edit);
        self.repaint();
        change
    }
}
