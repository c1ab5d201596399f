//! Terminal stand-ins for the host page and popup windows, used by the binary.

use std::{
    collections::HashSet,
    sync::Mutex,
};

use crate::{
    auth::{
        WindowHandle,
        WindowManager,
    },
    core::CardpopError,
    overlay::{
        Element,
        FocusTarget,
        HostPage,
        Key,
        View,
    },
};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Key(Key),
    Type(String),
    Login,
    Logout,
    CloseLogin,
    Next,
    Fade,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    let command = match line.trim() {
        "" => return None,
        ":tab" => Command::Key(Key::Tab),
        ":backtab" => Command::Key(Key::BackTab),
        ":enter" => Command::Key(Key::Enter),
        ":esc" => Command::Key(Key::Escape),
        ":bs" => Command::Key(Key::Backspace),
        ":login" => Command::Login,
        ":logout" => Command::Logout,
        ":close-login" => Command::CloseLogin,
        ":next" => Command::Next,
        ":fade" => Command::Fade,
        ":quit" | ":q" => Command::Quit,
        _ => Command::Type(line.to_string()),
    };
    Some(command)
}

/// Prints the overlay to stdout instead of injecting it into a document.
pub struct ConsoleHost {
    mounted: bool,
    overflow: String,
}

impl Default for ConsoleHost {
    fn default() -> Self {
        Self { mounted: false, overflow: "auto".to_string() }
    }
}

pub fn render_view(view: &View) -> String {
    let mut lines = Vec::new();
    for element in &view.elements {
        let line = match element {
            Element::Heading(text) => format!("== {text} =="),
            Element::Text(text) => text.clone(),
            Element::Notice(text) => format!("* {text}"),
            Element::Error(text) => format!("! {text}"),
            Element::Input { id, label, value, .. } => format!("{label} [{id}]: {value}_"),
            Element::Button { id, label, .. } => format!("<{label}> [{id}]"),
        };
        lines.push(line);
    }
    lines.join("\n")
}

impl HostPage for ConsoleHost {
    fn mount_overlay(&mut self) -> Result<(), CardpopError> {
        self.mounted = true;
        println!("+------ cardpop ------+");
        Ok(())
    }

    fn overlay_mounted(&self) -> bool {
        self.mounted
    }

    fn unmount_overlay(&mut self) {
        self.mounted = false;
        println!("+------ closed -------+");
    }

    fn set_overlay_opacity(&mut self, opacity: f32) {
        if opacity == 0.0 {
            println!("(fading out)");
        }
    }

    fn scroll_overflow(&self) -> String {
        self.overflow.clone()
    }

    fn set_scroll_overflow(&mut self, value: &str) {
        self.overflow = value.to_string();
    }

    fn paint(&mut self, view: &View) {
        println!("{}", render_view(view));
    }

    fn move_focus(&mut self, target: &FocusTarget) {
        if let FocusTarget::Element(id) = target {
            println!("(focus: {id})");
        }
    }

    fn pause_media(&mut self) -> usize {
        0
    }
}

/// Login "popups" are URLs printed for the user to open; they count as open
/// until `close_all` is called on the user's behalf.
#[derive(Default)]
pub struct ConsoleWindows {
    state: Mutex<(u64, HashSet<WindowHandle>)>,
}

impl ConsoleWindows {
    pub fn close_all(&self) -> usize {
        self.state.lock().map(|mut state| state.1.drain().count()).unwrap_or(0)
    }
}

impl WindowManager for ConsoleWindows {
    fn open(&self, url: &str) -> Result<WindowHandle, CardpopError> {
        let mut state =
            self.state.lock().map_err(|_| CardpopError::Window("Window table poisoned".to_string()))?;
        state.0 += 1;
        let handle = WindowHandle(state.0);
        state.1.insert(handle);
        println!("Sign in at {url}, then come back here. (:close-login to give up)");
        Ok(handle)
    }

    fn is_open(&self, handle: WindowHandle) -> bool {
        self.state.lock().map(|state| state.1.contains(&handle)).unwrap_or(false)
    }

    fn close(&self, handle: WindowHandle) -> Result<(), CardpopError> {
        if let Ok(mut state) = self.state.lock() {
            state.1.remove(&handle);
        }
        Ok(())
    }
}
