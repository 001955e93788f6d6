//! Process composition: window, engine and UI loop.

use fanduino_engine::Engine;
use fanduino_status::WakeFn;
use fanduino_tray::ShellSurface;

use crate::APP_NAME;
use crate::config::StartupConfiguration;
use crate::dialog::ErrorReporter;
use crate::window::MainWindow;

/// GUI toolkit that hosts the [`MainWindow`].
pub trait UiShell {
    type Surface: ShellSurface;

    /// Returns the surface the window drives and the callback that wakes
    /// the UI loop. Called on the UI thread before the loop starts.
    fn prepare(&mut self) -> (Self::Surface, WakeFn);

    /// Runs the UI event loop until the window closes.
    fn run(self, window: MainWindow<Self::Surface>) -> anyhow::Result<()>;
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The window was closed normally.
    Clean,
    /// The engine could not start; the user was shown an error.
    StartupFailed,
    /// The UI loop itself failed.
    UiFailed,
}

impl ExitStatus {
    /// Process exit code.
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::StartupFailed => 1,
            ExitStatus::UiFailed => 2,
        }
    }
}

/// Builds the window, starts the engine and runs the UI until it closes.
///
/// The engine is stopped when this returns, whichever way the UI loop
/// ends. If the engine fails to start, the failure is reported through
/// `reporter` and the UI loop is never entered.
pub fn run<E, R, U>(config: &StartupConfiguration, engine: &E, reporter: &R, mut shell: U) -> ExitStatus
where
    E: Engine + ?Sized,
    R: ErrorReporter + ?Sized,
    U: UiShell,
{
    let (surface, wake) = shell.prepare();
    let window = MainWindow::new(config, surface, wake);
    window.update_status(format!("Connecting on port {}", config.port));

    let status = window.status_channel();
    let handle = match engine.start(window.status_hook()) {
        Ok(handle) => handle,
        Err(e) => {
            let message = e.user_message();
            tracing::error!(error = %e, %message, "engine failed to start");
            status.close();
            reporter.report(APP_NAME, &message);
            return ExitStatus::StartupFailed;
        }
    };
    tracing::info!(port = config.port, "engine started");

    // `handle` is dropped on unwind too, so the engine stops on every path.
    let result = shell.run(window);

    status.close();
    handle.release();

    match result {
        Ok(()) => ExitStatus::Clean,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "UI loop failed");
            ExitStatus::UiFailed
        }
    }
}
