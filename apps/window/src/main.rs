//! Fanduino window entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod bootstrap;
mod config;
mod dialog;
mod shell;
mod window;

use std::process::ExitCode;

use fanduino_engine::{LineEngine, LineEngineConfig};
use tracing_subscriber::EnvFilter;

use crate::dialog::{DialogReporter, ErrorReporter};

/// Name used for dialogs and the window class.
pub const APP_NAME: &str = "Fanduino";

fn main() -> ExitCode {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting Fanduino window"
    );

    let reporter = DialogReporter;

    // Load configuration.
    let config = match config::StartupConfiguration::load() {
        Ok(c) => {
            tracing::info!(port = c.port, start_minimized = c.start_minimized, "configuration loaded");
            c
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to load configuration");
            reporter.report(APP_NAME, &format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let engine = LineEngine::new(LineEngineConfig {
        bind_address: config.bind_address.clone(),
        port: config.port,
    });
    let shell = shell::EguiShell::new(&config);

    let status = bootstrap::run(&config, &engine, &reporter, shell);
    tracing::info!(?status, "window shut down");
    ExitCode::from(status.code())
}
