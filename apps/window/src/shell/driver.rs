//! Per-frame glue between egui input and the main window.

use eframe::egui;
use fanduino_tray::{ShellEvent, WindowVisibility};

use super::restore::TrayRestore;
use super::surface::EguiSurface;
use crate::window::MainWindow;

/// Turns viewport input and tray events into window events, then flushes
/// the resulting surface commands. Holds no native resources.
pub struct ShellDriver {
    window: MainWindow<EguiSurface>,
    restore: TrayRestore,
    was_minimized: bool,
}

impl ShellDriver {
    pub fn new(window: MainWindow<EguiSurface>, restore: TrayRestore) -> Self {
        let driver = Self {
            window,
            restore,
            was_minimized: false,
        };
        // A window that starts in the tray may never run a frame before the
        // first click.
        driver.sync_tray_flag();
        driver
    }

    /// Handles one frame. Returns the label text to render.
    pub fn step(&mut self, ctx: &egui::Context) -> String {
        self.process_tray_events(ctx);
        self.process_window_events(ctx);
        self.window.frame();

        let text = self.window.status_text();
        let surface = self.window.surface_mut();
        surface.tray_mut().set_status(&text);
        surface.flush(ctx);
        self.sync_tray_flag();
        text
    }

    /// Closes the label and asks the tray to go away.
    pub fn shutdown(&self) {
        self.window.shutdown();
        self.window.surface().tray().shutdown();
    }

    pub fn window(&self) -> &MainWindow<EguiSurface> {
        &self.window
    }

    fn process_tray_events(&mut self, ctx: &egui::Context) {
        let events = self.window.surface().tray().drain_events();
        for event in events {
            match event.shell_event() {
                Some(shell_event) => {
                    self.window.on_event(shell_event);
                }
                None => {
                    tracing::info!("quit requested from tray menu");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    fn process_window_events(&mut self, ctx: &egui::Context) {
        let minimized = ctx.input(|i| i.viewport().minimized).unwrap_or(false);
        // Only the edge counts; the flag can lag behind a restore.
        if minimized && !self.was_minimized {
            self.window.on_event(ShellEvent::Minimized);
        }
        self.was_minimized = minimized;

        if ctx.input(|i| i.viewport().close_requested()) {
            tracing::info!("window closed");
            self.window.shutdown();
        }
    }

    fn sync_tray_flag(&self) {
        let in_tray = self.window.visibility().state() == WindowVisibility::MinimizedToTray;
        self.restore.set_in_tray(in_tray);
    }
}
