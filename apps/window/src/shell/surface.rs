use eframe::egui::{self, ViewportCommand};
use fanduino_tray::{ShellSurface, TrayHandle};

/// [`ShellSurface`] backed by egui viewport commands and the tray handle.
///
/// Commands are queued and sent on the next frame, so the surface can be
/// driven before the event loop exists.
pub struct EguiSurface {
    commands: Vec<ViewportCommand>,
    tray: TrayHandle,
}

impl EguiSurface {
    pub fn new(tray: TrayHandle) -> Self {
        Self {
            commands: Vec::new(),
            tray,
        }
    }

    pub fn tray(&self) -> &TrayHandle {
        &self.tray
    }

    pub fn tray_mut(&mut self) -> &mut TrayHandle {
        &mut self.tray
    }

    /// Sends queued commands to the root viewport.
    pub fn flush(&mut self, ctx: &egui::Context) {
        for command in self.commands.drain(..) {
            ctx.send_viewport_cmd(command);
        }
    }
}

impl ShellSurface for EguiSurface {
    fn hide_window(&mut self) {
        self.commands.push(ViewportCommand::Visible(false));
    }

    fn show_window(&mut self) {
        self.commands.push(ViewportCommand::Visible(true));
        self.commands.push(ViewportCommand::Focus);
    }

    fn restore_window(&mut self) {
        self.commands.push(ViewportCommand::Minimized(false));
    }

    fn set_in_taskbar(&mut self, visible: bool) {
        // egui has no runtime taskbar toggle; a hidden window has no entry.
        tracing::trace!(visible, "taskbar presence follows window visibility");
    }

    fn set_tray_visible(&mut self, visible: bool) {
        self.tray.set_visible(visible);
    }
}
