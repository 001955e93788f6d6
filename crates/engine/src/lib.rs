//! Engine interface for the Fanduino window.
//!
//! The window does not know how devices are talked to. It hands an engine
//! a [`StatusHook`] and gets back an [`EngineHandle`]; the engine reports
//! status text through the hook from its own threads until the handle is
//! released.
//!
//! [`LineEngine`] is the engine shipped with the window: it listens on a
//! TCP port and forwards every line it receives as a status.

mod error;
mod handle;
mod line;

use std::sync::Arc;

pub use error::{EngineError, root_message};
pub use handle::EngineHandle;
pub use line::{LineEngine, LineEngineConfig, MAX_LINE_BYTES};

/// Callback invoked with each status message. May be called from any thread.
pub type StatusHook = Arc<dyn Fn(String) + Send + Sync + 'static>;

/// Something that can be started with a status hook.
///
/// Starting must fail synchronously if the engine cannot run (for example
/// when its port is taken); once it returns a handle the engine is live.
pub trait Engine {
    fn start(&self, hook: StatusHook) -> Result<EngineHandle, EngineError>;
}

impl<F> Engine for F
where
    F: Fn(StatusHook) -> Result<EngineHandle, EngineError>,
{
    fn start(&self, hook: StatusHook) -> Result<EngineHandle, EngineError> {
        self(hook)
    }
}
