//! User-facing error reporting.

/// Shows a blocking error to the user.
pub trait ErrorReporter {
    fn report(&self, title: &str, message: &str);
}

/// Reports errors with a native modal message box.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogReporter;

impl ErrorReporter for DialogReporter {
    fn report(&self, title: &str, message: &str) {
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
