//! Bringing the window back from the tray while the UI loop is idle.
//!
//! A window hidden with `ViewportCommand::Visible(false)` gets no redraws on
//! Windows, so `update` never runs to see a tray click. The tray handler
//! therefore shows the native window itself; the visibility transition then
//! runs on the first frame after.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use raw_window_handle::HasWindowHandle;

/// Shared between the UI loop (which knows the state) and the tray handlers
/// (which run while the loop may be parked).
#[derive(Clone, Default)]
pub struct TrayRestore {
    in_tray: Arc<AtomicBool>,
    native: NativeWindow,
}

impl TrayRestore {
    /// Records whether the window is currently collapsed to the tray.
    pub fn set_in_tray(&self, in_tray: bool) {
        self.in_tray.store(in_tray, Ordering::SeqCst);
    }

    pub fn in_tray(&self) -> bool {
        self.in_tray.load(Ordering::SeqCst)
    }

    /// Makes the native window visible again so the UI loop resumes.
    ///
    /// Does nothing while the window is not in the tray. Returns whether the
    /// window was asked to show.
    pub fn show_if_hidden(&self) -> bool {
        if !self.in_tray() {
            return false;
        }
        tracing::debug!("showing hidden window from tray handler");
        self.native.show();
        true
    }

    /// Remembers the platform window once eframe has created it.
    pub fn capture(&self, window: &impl HasWindowHandle) {
        self.native.capture(window);
    }
}

#[cfg(windows)]
#[derive(Clone, Default)]
struct NativeWindow {
    hwnd: Arc<std::sync::atomic::AtomicIsize>,
}

#[cfg(windows)]
impl NativeWindow {
    fn capture(&self, window: &impl HasWindowHandle) {
        use raw_window_handle::RawWindowHandle;

        if self.hwnd.load(Ordering::Acquire) != 0 {
            return;
        }
        if let Ok(handle) = window.window_handle() {
            if let RawWindowHandle::Win32(handle) = handle.as_raw() {
                self.hwnd.store(handle.hwnd.get(), Ordering::Release);
            }
        }
    }

    fn show(&self) {
        use windows_sys::Win32::UI::WindowsAndMessaging::{SW_RESTORE, SW_SHOW, ShowWindowAsync};

        let hwnd = self.hwnd.load(Ordering::Acquire);
        if hwnd == 0 {
            tracing::warn!("tray restore before the window handle was captured");
            return;
        }
        // Async so the owning UI thread applies it from its own message loop.
        unsafe {
            ShowWindowAsync(hwnd as _, SW_SHOW);
            ShowWindowAsync(hwnd as _, SW_RESTORE);
        }
    }
}

// Other backends keep delivering repaints to hidden windows.
#[cfg(not(windows))]
#[derive(Clone, Default)]
struct NativeWindow;

#[cfg(not(windows))]
impl NativeWindow {
    fn capture(&self, _window: &impl HasWindowHandle) {}

    fn show(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_only_while_in_tray() {
        let restore = TrayRestore::default();
        assert!(!restore.show_if_hidden());

        restore.set_in_tray(true);
        assert!(restore.show_if_hidden());

        restore.set_in_tray(false);
        assert!(!restore.show_if_hidden());
    }

    #[test]
    fn clones_share_the_tray_flag() {
        let ui_side = TrayRestore::default();
        let handler_side = ui_side.clone();

        ui_side.set_in_tray(true);
        assert!(handler_side.in_tray());
    }
}
