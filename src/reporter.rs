use std::sync::Mutex;

use tracing::error;

use crate::error::ExportError;

/// Sink for recoverable failures. The assembler hands every dropped unit of
/// work to a reporter instead of aborting.
pub trait Reporter: Send + Sync {
    fn report(&self, context: &str, error: &ExportError);
}

/// Default reporter: one `error` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, context: &str, error: &ExportError) {
        error!(context, "{}", error);
    }
}

/// Keeps failures in memory, formatted as `"<context>: <error>"`.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, context: &str, error: &ExportError) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(format!("{}: {}", context, error));
        }
    }
}
