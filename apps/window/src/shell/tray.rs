//! Native notification area icon.
//!
//! On Linux the icon lives on its own GTK thread (winit does not run a GTK
//! loop); elsewhere it is created on the UI thread and pumped every frame.
//! Either way it talks to the UI loop only through the tray channels.

use std::sync::{Arc, mpsc};

use anyhow::Context;
use fanduino_tray::{MenuAction, MenuState, TrayConfig, TrayEvent, TrayUpdate};
use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder, TrayIconEvent};

use super::restore::TrayRestore;

const SHOW_ID: &str = "show";
const QUIT_ID: &str = "quit";

/// Icon colour (fan blue).
const ICON_COLOR: (u8, u8, u8) = (59, 130, 246);

type Wake = Arc<dyn Fn() + Send + Sync>;

/// Handle on the running tray icon.
pub struct SystemTray {
    #[cfg(not(target_os = "linux"))]
    local: Option<(NativeTray, mpsc::Receiver<TrayUpdate>)>,
}

impl SystemTray {
    /// Creates the tray icon and starts forwarding its events.
    pub fn start(
        config: TrayConfig,
        event_tx: mpsc::Sender<TrayEvent>,
        update_rx: mpsc::Receiver<TrayUpdate>,
        wake: Wake,
        restore: TrayRestore,
    ) -> anyhow::Result<Self> {
        install_event_handlers(event_tx, wake, restore);

        #[cfg(target_os = "linux")]
        {
            spawn_gtk_tray(config, update_rx);
            Ok(Self {})
        }

        #[cfg(not(target_os = "linux"))]
        {
            let tray = NativeTray::build(&config)?;
            Ok(Self {
                local: Some((tray, update_rx)),
            })
        }
    }

    /// Applies pending tray updates. Call once per frame.
    pub fn pump(&mut self) {
        #[cfg(not(target_os = "linux"))]
        {
            let mut keep = true;
            if let Some((tray, updates)) = &mut self.local {
                keep = drain_updates(tray, updates);
            }
            if !keep {
                self.local = None;
            }
        }
    }
}

/// Forwards tray-icon callbacks (any thread) into the tray event channel.
///
/// Every action needs a frame to run, so a hidden window is shown first.
fn install_event_handlers(event_tx: mpsc::Sender<TrayEvent>, wake: Wake, restore: TrayRestore) {
    let icon_tx = event_tx.clone();
    let icon_wake = Arc::clone(&wake);
    let icon_restore = restore.clone();
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        if let TrayIconEvent::DoubleClick { .. } = event {
            icon_restore.show_if_hidden();
            let _ = icon_tx.send(TrayEvent::DoubleClicked);
            icon_wake();
        }
    }));

    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        let action = match event.id.0.as_str() {
            SHOW_ID => MenuAction::Show,
            QUIT_ID => MenuAction::Quit,
            _ => return,
        };
        restore.show_if_hidden();
        let _ = event_tx.send(TrayEvent::Menu(action));
        wake();
    }));
}

/// Applies every queued update. Returns `false` once the tray should go away.
fn drain_updates(tray: &mut NativeTray, updates: &mpsc::Receiver<TrayUpdate>) -> bool {
    loop {
        match updates.try_recv() {
            Ok(update) => {
                if !tray.apply(update) {
                    return false;
                }
            }
            Err(mpsc::TryRecvError::Empty) => return true,
            Err(mpsc::TryRecvError::Disconnected) => return false,
        }
    }
}

#[cfg(target_os = "linux")]
fn spawn_gtk_tray(config: TrayConfig, updates: mpsc::Receiver<TrayUpdate>) {
    use std::time::Duration;

    const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

    let spawned = std::thread::Builder::new()
        .name("fanduino-tray".into())
        .spawn(move || {
            if let Err(e) = gtk::init() {
                tracing::error!("failed to initialize GTK for tray icon: {e}");
                return;
            }

            let mut tray = match NativeTray::build(&config) {
                Ok(tray) => tray,
                Err(e) => {
                    tracing::error!("failed to create tray icon: {e:#}");
                    return;
                }
            };
            tracing::info!("tray icon initialized in GTK thread");

            gtk::glib::timeout_add_local(UPDATE_INTERVAL, move || {
                if drain_updates(&mut tray, &updates) {
                    gtk::glib::ControlFlow::Continue
                } else {
                    gtk::main_quit();
                    gtk::glib::ControlFlow::Break
                }
            });
            gtk::main();
        });

    if let Err(e) = spawned {
        tracing::error!("failed to spawn tray thread: {e}");
    }
}

/// The tray-icon objects plus the menu entries that change at runtime.
struct NativeTray {
    icon: TrayIcon,
    header: Option<MenuItem>,
    show: Option<MenuItem>,
    state: MenuState,
}

impl NativeTray {
    fn build(config: &TrayConfig) -> anyhow::Result<Self> {
        let state = MenuState {
            title: config.title.clone(),
            ..MenuState::default()
        };

        let menu = Menu::new();
        let mut header = None;
        let mut show = None;
        for item in state.build_menu() {
            if item.is_separator() {
                menu.append(&PredefinedMenuItem::separator())
                    .context("failed to append menu separator")?;
                continue;
            }

            let native = match item.action {
                Some(action) => MenuItem::with_id(action_id(action), &item.label, item.enabled, None),
                None => MenuItem::new(&item.label, item.enabled, None),
            };
            menu.append(&native)
                .with_context(|| format!("failed to append menu item {:?}", item.label))?;

            match item.action {
                None => header = Some(native),
                Some(MenuAction::Show) => show = Some(native),
                Some(MenuAction::Quit) => {}
            }
        }

        let size = config.icon_size;
        let rgba = fan_icon_rgba(size, ICON_COLOR);
        let icon = Icon::from_rgba(rgba, size, size).context("failed to create tray icon image")?;

        let icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(&config.title)
            .with_icon(icon)
            .build()
            .context("failed to build tray icon")?;

        // The window starts out in charge; the icon appears on minimize.
        icon.set_visible(false).context("failed to hide tray icon")?;

        Ok(Self {
            icon,
            header,
            show,
            state,
        })
    }

    /// Applies one update. Returns `false` on shutdown.
    fn apply(&mut self, update: TrayUpdate) -> bool {
        match update {
            TrayUpdate::Status(status) => {
                self.state.status = status;
                if let (Some(header), Some(item)) = (&self.header, self.state.build_menu().first()) {
                    header.set_text(&item.label);
                }
                let tooltip = format!("{}\n{}", self.state.title, self.state.status);
                if let Err(e) = self.icon.set_tooltip(Some(tooltip)) {
                    tracing::warn!("failed to update tray tooltip: {e}");
                }
            }
            TrayUpdate::Visible(visible) => {
                self.state.minimized = visible;
                if let Some(show) = &self.show {
                    show.set_enabled(visible);
                }
                if let Err(e) = self.icon.set_visible(visible) {
                    tracing::warn!(visible, "failed to toggle tray icon: {e}");
                }
            }
            TrayUpdate::Shutdown => {
                tracing::debug!("tray shutting down");
                return false;
            }
        }
        true
    }
}

fn action_id(action: MenuAction) -> &'static str {
    match action {
        MenuAction::Show => SHOW_ID,
        MenuAction::Quit => QUIT_ID,
    }
}

/// The tray icon: a filled circle.
fn fan_icon_rgba(size: u32, color: (u8, u8, u8)) -> Vec<u8> {
    let mut rgba = vec![0u8; (size * size * 4) as usize];
    let center = size as f32 / 2.0 - 0.5;
    let radius = size as f32 / 2.0 - 2.0;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if (dx * dx + dy * dy).sqrt() < radius {
                let idx = ((y * size + x) * 4) as usize;
                rgba[idx] = color.0;
                rgba[idx + 1] = color.1;
                rgba[idx + 2] = color.2;
                rgba[idx + 3] = 255;
            }
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_is_a_centered_disc() {
        let size = 32;
        let rgba = fan_icon_rgba(size, ICON_COLOR);
        assert_eq!(rgba.len(), (size * size * 4) as usize);

        let alpha = |x: u32, y: u32| rgba[((y * size + x) * 4 + 3) as usize];
        assert_eq!(alpha(16, 16), 255);
        assert_eq!(alpha(0, 0), 0);
        assert_eq!(alpha(31, 31), 0);
    }

    #[test]
    fn menu_ids_are_distinct() {
        assert_ne!(action_id(MenuAction::Show), action_id(MenuAction::Quit));
    }
}
