//! Main window composition: status label plus tray visibility.

use std::sync::Arc;

use fanduino_engine::StatusHook;
use fanduino_status::{StatusChannel, WakeFn};
use fanduino_tray::{ShellEvent, ShellSurface, Transition, TrayVisibilityController};

use crate::config::{StartupConfiguration, WindowSettings};

/// The status window.
///
/// Owns the label (through its [`StatusChannel`]), the tray visibility state
/// and the toolkit surface both act on. Must be created on the UI thread.
pub struct MainWindow<S: ShellSurface> {
    settings: WindowSettings,
    status: StatusChannel,
    visibility: TrayVisibilityController,
    surface: S,
}

impl<S: ShellSurface> MainWindow<S> {
    /// Builds the window and applies the startup visibility.
    pub fn new(config: &StartupConfiguration, mut surface: S, wake: WakeFn) -> Self {
        let status = StatusChannel::new(wake);
        let visibility = TrayVisibilityController::new(config.start_minimized, &mut surface);

        Self {
            settings: config.window.clone(),
            status,
            visibility,
            surface,
        }
    }

    /// Shows `text` on the label. Callable from any thread via [`status_hook`].
    ///
    /// [`status_hook`]: MainWindow::status_hook
    pub fn update_status(&self, text: impl Into<String>) {
        self.status.publish(text);
    }

    /// Returns a hook that forwards engine status to this window.
    pub fn status_hook(&self) -> StatusHook {
        let status = self.status.clone();
        Arc::new(move |text: String| status.publish(text))
    }

    /// Returns a second handle on the label's channel.
    pub fn status_channel(&self) -> StatusChannel {
        self.status.clone()
    }

    /// Reacts to a window or tray event.
    pub fn on_event(&mut self, event: ShellEvent) -> Option<Transition> {
        self.visibility.handle(event, &mut self.surface)
    }

    /// Runs one UI iteration. Returns `true` if the label changed.
    pub fn frame(&mut self) -> bool {
        self.status.pump()
    }

    /// Stops accepting status updates.
    pub fn shutdown(&self) {
        self.status.close();
    }

    pub fn status_text(&self) -> String {
        self.status.text()
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    pub fn visibility(&self) -> &TrayVisibilityController {
        &self.visibility
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fanduino_tray::WindowVisibility;

    /// Surface that only records what it was told.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub window_visible: bool,
        pub in_taskbar: bool,
        pub tray_visible: bool,
        pub times_shown: usize,
    }

    impl ShellSurface for RecordingSurface {
        fn hide_window(&mut self) {
            self.window_visible = false;
        }
        fn show_window(&mut self) {
            self.window_visible = true;
            self.times_shown += 1;
        }
        fn restore_window(&mut self) {}
        fn set_in_taskbar(&mut self, visible: bool) {
            self.in_taskbar = visible;
        }
        fn set_tray_visible(&mut self, visible: bool) {
            self.tray_visible = visible;
        }
    }

    fn window(start_minimized: bool) -> MainWindow<RecordingSurface> {
        let config = StartupConfiguration {
            start_minimized,
            ..StartupConfiguration::default()
        };
        MainWindow::new(&config, RecordingSurface::default(), Box::new(|| {}))
    }

    #[test]
    fn normal_start_shows_the_window() {
        let w = window(false);
        assert_eq!(w.visibility().state(), WindowVisibility::Normal);
        assert!(w.surface().window_visible);
        assert!(!w.surface().tray_visible);
        assert_eq!(w.settings().title, "Fanduino");
    }

    #[test]
    fn minimized_start_goes_straight_to_tray() {
        let w = window(true);
        assert_eq!(w.visibility().state(), WindowVisibility::MinimizedToTray);
        assert!(w.surface().tray_visible);
        assert!(!w.surface().in_taskbar);
        assert_eq!(w.surface().times_shown, 0);
    }

    #[test]
    fn events_drive_the_surface() {
        let mut w = window(false);

        w.on_event(ShellEvent::Minimized).unwrap();
        assert!(w.surface().tray_visible);
        assert!(!w.surface().window_visible);

        w.on_event(ShellEvent::TrayDoubleClicked).unwrap();
        assert!(!w.surface().tray_visible);
        assert!(w.surface().window_visible);
        assert!(w.surface().in_taskbar);
    }

    #[test]
    fn hook_from_engine_thread_reaches_label_on_next_frame() {
        let mut w = window(false);
        w.update_status("Connecting on port 5757");
        assert_eq!(w.status_text(), "Connecting on port 5757");

        let hook = w.status_hook();
        std::thread::spawn(move || {
            for i in 0..50 {
                hook(format!("rpm {i}"));
            }
        })
        .join()
        .unwrap();

        assert_eq!(w.status_text(), "Connecting on port 5757");
        assert!(w.frame());
        assert_eq!(w.status_text(), "rpm 49");
    }

    #[test]
    fn updates_after_shutdown_are_dropped() {
        let mut w = window(false);
        w.update_status("last");
        w.shutdown();

        let hook = w.status_hook();
        std::thread::spawn(move || hook("too late".into())).join().unwrap();

        assert!(!w.frame());
        assert_eq!(w.status_text(), "last");
    }
}
