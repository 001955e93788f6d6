use std::fmt;

type StopFn = Box<dyn FnOnce() + Send + 'static>;

/// Scoped lifetime of a running engine.
///
/// Releasing the handle stops the engine. This happens exactly once: either
/// through [`release`](EngineHandle::release) or when the handle is dropped.
#[must_use = "dropping the handle stops the engine"]
pub struct EngineHandle {
    stop: Option<StopFn>,
}

impl EngineHandle {
    /// Creates a handle that runs `stop` when released.
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// A handle for an engine with nothing to clean up.
    pub fn noop() -> Self {
        Self { stop: None }
    }

    /// Stops the engine now.
    pub fn release(mut self) {
        self.stop_once();
    }

    fn stop_once(&mut self) {
        if let Some(stop) = self.stop.take() {
            tracing::info!("stopping engine");
            stop();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop_once();
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("live", &self.stop.is_some())
            .finish()
    }
}
