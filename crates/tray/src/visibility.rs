//! Minimize-to-tray state machine.

/// Whether the application is shown as a window or as a tray icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowVisibility {
    Normal,
    MinimizedToTray,
}

/// OS-level events that may change visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    /// The user minimized the window.
    Minimized,
    /// The user double-clicked the tray icon.
    TrayDoubleClicked,
    /// The user picked "Show window" in the tray menu.
    RestoreRequested,
}

/// A state change performed by [`TrayVisibilityController::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: WindowVisibility,
    pub to: WindowVisibility,
    pub event: ShellEvent,
}

/// Window and tray operations the controller drives.
///
/// Implemented by the GUI shell; operations are treated as infallible.
pub trait ShellSurface {
    /// Hides the main window.
    fn hide_window(&mut self);
    /// Shows the main window.
    fn show_window(&mut self);
    /// Brings a minimized window back to its normal size.
    fn restore_window(&mut self);
    /// Adds or removes the window from the taskbar / task switcher.
    fn set_in_taskbar(&mut self, visible: bool);
    /// Shows or hides the notification area icon.
    fn set_tray_visible(&mut self, visible: bool);
}

/// Governs whether the window or the tray icon is active.
///
/// The tray icon is visible exactly when the window is out of the taskbar.
#[derive(Debug)]
pub struct TrayVisibilityController {
    state: WindowVisibility,
    tray_visible: bool,
    in_taskbar: bool,
    window_visible: bool,
}

impl TrayVisibilityController {
    /// Creates the controller and applies the startup state.
    ///
    /// With `start_minimized` the window goes straight to the tray and is
    /// never shown; otherwise it is shown normally.
    pub fn new(start_minimized: bool, surface: &mut impl ShellSurface) -> Self {
        let mut controller = Self {
            state: WindowVisibility::Normal,
            tray_visible: false,
            in_taskbar: true,
            window_visible: false,
        };

        if start_minimized {
            controller.collapse(surface);
            tracing::info!("starting minimized to tray");
        } else {
            surface.set_tray_visible(false);
            surface.set_in_taskbar(true);
            surface.show_window();
            controller.window_visible = true;
        }

        controller
    }

    /// Applies an event. Returns the transition taken, or `None` if the
    /// event is not meaningful in the current state.
    pub fn handle(&mut self, event: ShellEvent, surface: &mut impl ShellSurface) -> Option<Transition> {
        let from = self.state;
        match (from, event) {
            (WindowVisibility::Normal, ShellEvent::Minimized) => self.collapse(surface),
            (
                WindowVisibility::MinimizedToTray,
                ShellEvent::TrayDoubleClicked | ShellEvent::RestoreRequested,
            ) => self.expand(surface),
            _ => {
                tracing::trace!(?from, ?event, "visibility event ignored");
                return None;
            }
        }

        let transition = Transition {
            from,
            to: self.state,
            event,
        };
        tracing::debug!(?transition, "visibility changed");
        Some(transition)
    }

    pub fn state(&self) -> WindowVisibility {
        self.state
    }

    /// Returns `true` while the tray icon is shown.
    pub fn tray_visible(&self) -> bool {
        self.tray_visible
    }

    /// Returns `true` while the window is listed in the taskbar.
    pub fn in_taskbar(&self) -> bool {
        self.in_taskbar
    }

    pub fn window_visible(&self) -> bool {
        self.window_visible
    }

    fn collapse(&mut self, surface: &mut impl ShellSurface) {
        surface.set_tray_visible(true);
        surface.hide_window();
        surface.set_in_taskbar(false);

        self.state = WindowVisibility::MinimizedToTray;
        self.tray_visible = true;
        self.window_visible = false;
        self.in_taskbar = false;
    }

    fn expand(&mut self, surface: &mut impl ShellSurface) {
        surface.restore_window();
        surface.set_in_taskbar(true);
        surface.show_window();
        surface.set_tray_visible(false);

        self.state = WindowVisibility::Normal;
        self.in_taskbar = true;
        self.window_visible = true;
        self.tray_visible = false;
    }
}
