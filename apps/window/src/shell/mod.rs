//! eframe + tray-icon implementation of the window shell.

mod driver;
mod restore;
mod surface;
mod tray;

use std::sync::{Arc, OnceLock, mpsc};

use anyhow::anyhow;
use eframe::egui;
use fanduino_status::WakeFn;
use fanduino_tray::{TrayConfig, TrayEvent, TrayHandle, TrayUpdate};

use crate::bootstrap::UiShell;
use crate::config::{StartupConfiguration, WindowSettings};
use crate::window::MainWindow;

use driver::ShellDriver;
use restore::TrayRestore;
pub use surface::EguiSurface;
use tray::SystemTray;

/// Repaint target that becomes available once the event loop is running.
#[derive(Clone, Default)]
struct RepaintSlot(Arc<OnceLock<egui::Context>>);

impl RepaintSlot {
    fn attach(&self, ctx: &egui::Context) {
        let _ = self.0.set(ctx.clone());
    }

    fn wake(&self) {
        if let Some(ctx) = self.0.get() {
            ctx.request_repaint();
        }
    }
}

/// Channel ends handed to the system tray when the loop starts.
struct TrayWiring {
    config: TrayConfig,
    event_tx: mpsc::Sender<TrayEvent>,
    update_rx: mpsc::Receiver<TrayUpdate>,
}

/// Runs the window with eframe and a tray-icon notification icon.
pub struct EguiShell {
    settings: WindowSettings,
    repaint: RepaintSlot,
    tray: Option<TrayWiring>,
}

impl EguiShell {
    pub fn new(config: &StartupConfiguration) -> Self {
        Self {
            settings: config.window.clone(),
            repaint: RepaintSlot::default(),
            tray: None,
        }
    }
}

impl UiShell for EguiShell {
    type Surface = EguiSurface;

    fn prepare(&mut self) -> (EguiSurface, WakeFn) {
        let config = TrayConfig {
            title: self.settings.title.clone(),
            ..TrayConfig::default()
        };
        let (handle, event_tx, update_rx) = TrayHandle::new(config.clone());
        self.tray = Some(TrayWiring {
            config,
            event_tx,
            update_rx,
        });

        let repaint = self.repaint.clone();
        (EguiSurface::new(handle), Box::new(move || repaint.wake()))
    }

    fn run(mut self, window: MainWindow<EguiSurface>) -> anyhow::Result<()> {
        let wiring = self
            .tray
            .take()
            .ok_or_else(|| anyhow!("shell was not prepared"))?;

        let settings = window.settings().clone();
        let mut viewport = egui::ViewportBuilder::default()
            .with_title(settings.title.clone())
            .with_inner_size([settings.width, settings.height])
            .with_visible(window.visibility().window_visible());
        if let Some(position) = settings.position {
            viewport = viewport.with_position(position);
        }

        let options = eframe::NativeOptions {
            viewport,
            ..Default::default()
        };

        let repaint = self.repaint.clone();
        eframe::run_native(
            &settings.title,
            options,
            Box::new(move |cc| {
                repaint.attach(&cc.egui_ctx);
                let restore = TrayRestore::default();
                restore.capture(cc);
                let driver = ShellDriver::new(window, restore.clone());

                let wake: Arc<dyn Fn() + Send + Sync> = Arc::new(move || repaint.wake());
                let mut tray = SystemTray::start(
                    wiring.config,
                    wiring.event_tx,
                    wiring.update_rx,
                    wake,
                    restore.clone(),
                )?;
                // A hidden window may not run a frame; show the icon now.
                tray.pump();

                Ok(Box::new(FanduinoApp {
                    driver,
                    tray,
                    restore,
                }))
            }),
        )
        .map_err(|e| anyhow!("failed to run window: {e}"))
    }
}

/// The eframe application: renders the label and owns the native tray.
struct FanduinoApp {
    driver: ShellDriver,
    tray: SystemTray,
    restore: TrayRestore,
}

impl eframe::App for FanduinoApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.restore.capture(&*frame);
        let text = self.driver.step(ctx);
        self.tray.pump();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(&text);
            });
        });
    }
}

impl Drop for FanduinoApp {
    fn drop(&mut self) {
        self.driver.shutdown();
        self.tray.pump();
    }
}
