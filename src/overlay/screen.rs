use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Edit,
    List,
    Confirm,
    Flashcard,
}

/// Highest priority first. Visibility is the first active screen in this order.
pub const PRIORITY_ORDER: [ScreenId; 4] =
    [ScreenId::Edit, ScreenId::List, ScreenId::Confirm, ScreenId::Flashcard];

impl ScreenId {
    /// Fixed ordinal; lower is more important.
    pub fn priority(self) -> usize {
        PRIORITY_ORDER.iter().position(|id| *id == self).unwrap_or(PRIORITY_ORDER.len())
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenId::Edit => "edit",
            ScreenId::List => "list",
            ScreenId::Confirm => "confirm",
            ScreenId::Flashcard => "flashcard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub id: ScreenId,
    pub active: bool,
}

/// What the caller has to do after an activation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// A different screen became visible and must render.
    Render(ScreenId),
    /// The visible screen did not change; the host still has to be checked.
    Unchanged(ScreenId),
    /// Nothing is active; the overlay should fade out.
    Hide,
}

/// Static screen registry plus the record of the last rendered screen.
#[derive(Debug, Clone)]
pub struct PriorityStateMachine {
    screens: [Screen; 4],
    rendered: Option<ScreenId>,
}

impl Default for PriorityStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityStateMachine {
    pub fn new() -> Self {
        Self { screens: PRIORITY_ORDER.map(|id| Screen { id, active: false }), rendered: None }
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn is_active(&self, id: ScreenId) -> bool {
        self.screens[id.priority()].active
    }

    pub fn current_visible(&self) -> Option<ScreenId> {
        self.screens.iter().find(|screen| screen.active).map(|screen| screen.id)
    }

    pub fn last_rendered(&self) -> Option<ScreenId> {
        self.rendered
    }

    pub fn activate(&mut self, id: ScreenId) -> Arbitration {
        self.screens[id.priority()].active = true;
        self.arbitrate()
    }

    pub fn deactivate(&mut self, id: ScreenId) -> Arbitration {
        self.screens[id.priority()].active = false;
        self.arbitrate()
    }

    /// Marks every screen inactive without producing a render request.
    pub fn deactivate_all(&mut self) {
        for screen in &mut self.screens {
            screen.active = false;
        }
        self.rendered = None;
    }

    fn arbitrate(&mut self) -> Arbitration {
        match self.current_visible() {
            Some(id) if self.rendered == Some(id) => Arbitration::Unchanged(id),
            Some(id) => {
                self.rendered = Some(id);
                Arbitration::Render(id)
            }
            None => {
                self.rendered = None;
                Arbitration::Hide
            }
        }
    }
}
