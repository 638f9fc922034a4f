//! The logging capability handed to the client at construction.
//!
//! The client reports every failure (and every successful write) through a
//! [`LogSink`]. Sinks are fire-and-forget: `record` returns nothing and the
//! client never waits on it.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

/// Severity attached to a sink record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

pub trait LogSink: Send + Sync {
    fn record(&self, payload: &str, severity: Severity);
}

/// Forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, payload: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(target: "docstore", "{payload}"),
            Severity::Success => info!(target: "docstore", "{payload}"),
        }
    }
}

/// A sink that keeps every record in memory, in call order.
///
/// Clones share the same buffer, so a test can keep one handle and pass
/// another to the client.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<(String, Severity)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<(String, Severity)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of records carrying `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.records().iter().filter(|(_, s)| *s == severity).count()
    }
}

impl LogSink for RecordingSink {
    fn record(&self, payload: &str, severity: Severity) {
        if let Ok(mut records) = self.records.lock() {
            records.push((payload.to_owned(), severity));
        }
    }
}
