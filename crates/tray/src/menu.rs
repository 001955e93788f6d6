//! Context menu for the tray icon.

/// Longest status text shown in the menu header.
const MAX_STATUS_CHARS: usize = 60;

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Bring the window back from the tray.
    Show,
    /// User requested to quit the application.
    Quit,
}

/// A single menu item.
#[derive(Debug, Clone)]
pub struct MenuItem {
    /// Display text.
    pub label: String,
    /// Whether the item is enabled (clickable).
    pub enabled: bool,
    /// Optional action triggered on click.
    pub action: Option<MenuAction>,
}

impl MenuItem {
    fn header(label: String) -> Self {
        Self {
            label,
            enabled: false,
            action: None,
        }
    }

    fn separator() -> Self {
        Self::header(String::new())
    }

    /// Returns `true` for the empty disabled item used as a separator.
    pub fn is_separator(&self) -> bool {
        self.label.is_empty() && self.action.is_none()
    }
}

/// Current state used to build the context menu.
#[derive(Debug, Clone)]
pub struct MenuState {
    /// Window title.
    pub title: String,
    /// Latest engine status.
    pub status: String,
    /// Whether the window is currently collapsed into the tray.
    pub minimized: bool,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            title: "Fanduino".into(),
            status: String::new(),
            minimized: false,
        }
    }
}

impl MenuState {
    /// Builds the menu items from the current state.
    pub fn build_menu(&self) -> Vec<MenuItem> {
        let header = if self.status.is_empty() {
            self.title.clone()
        } else {
            format!("{} — {}", self.title, truncate(&self.status, MAX_STATUS_CHARS))
        };

        vec![
            MenuItem::header(header),
            MenuItem::separator(),
            MenuItem {
                label: "Show window".into(),
                enabled: self.minimized,
                action: Some(MenuAction::Show),
            },
            MenuItem::separator(),
            MenuItem {
                label: "Quit".into(),
                enabled: true,
                action: Some(MenuAction::Quit),
            },
        ]
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
