//! Notification channel for imports the fixer had to leave alone.

use serde::Serialize;
use std::sync::Mutex;

use super::resolver::FailureReason;

/// One relative specifier that could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedImport {
    /// The specifier exactly as written in the source.
    pub original_statement: String,
    /// File path, relative to the report base.
    pub file: String,
    pub line: usize,
    pub reason: FailureReason,
}

impl FailedImport {
    /// One-line summary suitable for an after-run note.
    pub fn note(&self) -> String {
        format!(
            "Failed to fix import statement ({}) in file ({}).",
            self.original_statement, self.file
        )
    }
}

/// Receives a [`FailedImport`] for every unrewritable specifier.
///
/// Implementations must tolerate concurrent calls.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, failure: FailedImport);
}

/// Sink that buffers every notification in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    failures: Mutex<Vec<FailedImport>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far, in arrival order.
    pub fn failures(&self) -> Vec<FailedImport> {
        match self.failures.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn into_failures(self) -> Vec<FailedImport> {
        match self.failures.into_inner() {
            Ok(failures) => failures,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn len(&self) -> usize {
        self.failures().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, failure: FailedImport) {
        let mut guard = match self.failures.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(failure);
    }
}
