use std::error::Error;

/// Errors produced while starting an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot listen on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine runtime error")]
    Runtime(#[source] std::io::Error),

    #[error("{message}")]
    Startup {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl EngineError {
    /// A startup failure with no underlying cause.
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
            source: None,
        }
    }

    /// A startup failure wrapping the error that caused it.
    pub fn startup_with(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::Startup {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Text suitable for an error dialog. See [`root_message`].
    pub fn user_message(&self) -> String {
        root_message(self)
    }
}

/// Returns the message of the innermost cause of `err`.
///
/// Falls back to the outermost message when the chain has no cause or the
/// innermost one renders as blank.
pub fn root_message(err: &(dyn Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }

    let message = current.to_string();
    if message.trim().is_empty() {
        err.to_string()
    } else {
        message
    }
}
