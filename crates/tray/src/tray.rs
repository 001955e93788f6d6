//! Tray handle, events, and update types.
//!
//! The actual system tray implementation lives in the GUI shell and
//! depends on `tray-icon`, which needs platform-specific system libraries.
//! This module defines the channel-based interface between that shell and
//! the UI loop, independent of the GUI backend.

use std::sync::mpsc;

use crate::menu::{MenuAction, MenuState};
use crate::visibility::ShellEvent;

/// Configuration for the system tray.
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Tooltip and menu header.
    pub title: String,
    /// Icon edge length in pixels.
    pub icon_size: u32,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            title: "Fanduino".into(),
            icon_size: 32,
        }
    }
}

/// Events emitted by the tray to the UI loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// The tray icon was double-clicked.
    DoubleClicked,
    /// A context menu entry was picked.
    Menu(MenuAction),
}

impl TrayEvent {
    /// Maps the event onto the visibility state machine, if it affects it.
    pub fn shell_event(self) -> Option<ShellEvent> {
        match self {
            TrayEvent::DoubleClicked => Some(ShellEvent::TrayDoubleClicked),
            TrayEvent::Menu(MenuAction::Show) => Some(ShellEvent::RestoreRequested),
            TrayEvent::Menu(MenuAction::Quit) => None,
        }
    }
}

/// Updates sent from the UI loop to the tray.
#[derive(Debug, Clone)]
pub enum TrayUpdate {
    /// The status text changed; refresh tooltip and menu header.
    Status(String),
    /// Show or hide the tray icon.
    Visible(bool),
    /// Request tray shutdown.
    Shutdown,
}

/// Handle for communicating with the system tray from the UI loop.
///
/// The tray itself may run on another thread (GTK on Linux) and
/// communicates via channels.
pub struct TrayHandle {
    /// Send updates to the tray.
    update_tx: mpsc::Sender<TrayUpdate>,
    /// Receive events from the tray.
    event_rx: mpsc::Receiver<TrayEvent>,
    /// Current menu state (for tracking).
    state: MenuState,
}

impl TrayHandle {
    /// Creates a new tray handle with its channel pair.
    ///
    /// Returns `(handle, event_sender, update_receiver)`; the sender/receiver
    /// pair is given to the tray implementation.
    pub fn new(config: TrayConfig) -> (Self, mpsc::Sender<TrayEvent>, mpsc::Receiver<TrayUpdate>) {
        let (update_tx, update_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let handle = Self {
            update_tx,
            event_rx,
            state: MenuState {
                title: config.title,
                status: String::new(),
                minimized: false,
            },
        };

        (handle, event_tx, update_rx)
    }

    /// Mirrors the latest status into the tray. Unchanged text is not resent.
    pub fn set_status(&mut self, status: &str) {
        if self.state.status == status {
            return;
        }
        self.state.status = status.to_string();
        let _ = self.update_tx.send(TrayUpdate::Status(status.to_string()));
    }

    /// Shows or hides the tray icon.
    pub fn set_visible(&mut self, visible: bool) {
        if self.state.minimized == visible {
            return;
        }
        self.state.minimized = visible;
        let _ = self.update_tx.send(TrayUpdate::Visible(visible));
    }

    /// Requests the tray to shut down.
    pub fn shutdown(&self) {
        let _ = self.update_tx.send(TrayUpdate::Shutdown);
    }

    /// Drains every pending tray event.
    pub fn drain_events(&self) -> Vec<TrayEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Returns the current menu state.
    pub fn state(&self) -> &MenuState {
        &self.state
    }
}
