use crate::core::CardId;

/// User intents raised by overlay elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    SubmitAnswer,
    Another,
    Close,
    EditCurrent,
    OpenList,
    CloseList,
    Search,
    EditListed(CardId),
    DeleteListed(CardId),
    NewCard,
    SaveEdit,
    CancelEdit,
    DeleteEditing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Heading(String),
    Text(String),
    Notice(String),
    Error(String),
    Input {
        id: String,
        label: String,
        value: String,
        /// Fired by Enter while the input has focus.
        submit: Option<UiAction>,
        /// Fired after every edit of the value.
        change: Option<UiAction>,
    },
    Button {
        id: String,
        label: String,
        action: UiAction,
    },
}

impl Element {
    pub fn input(id: &str, label: &str, value: &str) -> Self {
        Element::Input {
            id: id.to_string(),
            label: label.to_string(),
            value: value.to_string(),
            submit: None,
            change: None,
        }
    }

    pub fn button(id: &str, label: &str, action: UiAction) -> Self {
        Element::Button { id: id.to_string(), label: label.to_string(), action }
    }

    pub fn on_submit(mut self, action: UiAction) -> Self {
        if let Element::Input { submit, .. } = &mut self {
            *submit = Some(action);
        }
        self
    }

    pub fn on_change(mut self, action: UiAction) -> Self {
        if let Element::Input { change, .. } = &mut self {
            *change = Some(action);
        }
        self
    }

    pub fn focus_id(&self) -> Option<&str> {
        match self {
            Element::Input { id, .. } | Element::Button { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Contents of the overlay's single content container. Each render replaces
/// the whole view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub elements: Vec<Element>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Ids of focusable elements in document order.
    pub fn focusable_ids(&self) -> Vec<&str> {
        self.elements.iter().filter_map(Element::focus_id).collect()
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.focus_id() == Some(id))
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.focus_id() == Some(id))
    }

    pub fn input_value(&self, id: &str) -> Option<&str> {
        match self.element(id) {
            Some(Element::Input { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub fn set_input_value(&mut self, id: &str, new_value: &str) -> bool {
        match self.element_mut(id) {
            Some(Element::Input { value, .. }) => {
                *value = new_value.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn edit_input(&mut self, id: &str, edit: impl FnOnce(&mut String)) -> bool {
        match self.element_mut(id) {
            Some(Element::Input { value, .. }) => {
                edit(value);
                true
            }
            _ => false,
        }
    }

    pub fn button_labels(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Button { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_button(&self, id: &str) -> bool {
        matches!(self.element(id), Some(Element::Button { .. }))
    }

    pub fn errors(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn text_lines(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Heading(text) | Element::Text(text) | Element::Notice(text) => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect()
    }
}
