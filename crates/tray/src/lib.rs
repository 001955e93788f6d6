//! Tray visibility for the Fanduino window.
//!
//! The window is either shown normally or collapsed into a notification
//! area icon. [`TrayVisibilityController`] owns that decision and drives
//! the toolkit through the [`ShellSurface`] trait, so the state machine is
//! independent of the GUI backend.
//!
//! The toolkit side talks to the UI loop via channels:
//! - [`TrayEvent`]: raw events from the tray (double-click, menu clicks)
//! - [`TrayUpdate`]: updates from the UI loop to the tray (tooltip, menu)
//!
//! # Platform notes
//! - Linux: StatusNotifierItem via a GTK thread owned by the shell
//! - Windows: Win32 Shell_NotifyIcon

mod menu;
mod tray;
mod visibility;

pub use menu::{MenuAction, MenuItem, MenuState};
pub use tray::{TrayConfig, TrayEvent, TrayHandle, TrayUpdate};
pub use visibility::{ShellEvent, ShellSurface, Transition, TrayVisibilityController, WindowVisibility};
