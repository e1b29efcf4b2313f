//! Per-item soft failure reporting
//!
//! A [`Warning`] records a failure that is scoped to a single item (one
//! asset download, one symlink, one stash entry). Warnings are accumulated
//! by the sync cycle and summarized at the end instead of aborting the run.

use std::fmt;

/// A non-fatal, per-item failure observed during a sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// The item the warning is about (display name, filename or path)
    context: String,
    /// What went wrong
    message: String,
}

impl Warning {
    /// Creates a new warning for the given item
    pub fn new(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Returns the item the warning is about
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Returns the failure description
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}
