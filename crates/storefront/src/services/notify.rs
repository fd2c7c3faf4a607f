//! Transient user notifications.
//!
//! Every user-visible outcome of a store operation goes through the
//! [`Notifier`] trait; the UI shell decides how to render it (toast,
//! banner, console). Exact rendering is out of scope here.

use std::sync::{Mutex, PoisonError};

/// Severity of a transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// A surface for transient user-facing messages.
pub trait Notifier: Send + Sync {
    /// Show a transient message.
    fn notify(&self, severity: Severity, message: &str);
}

/// Notifier that emits messages as tracing events.
///
/// The default for headless embedders that have no toast surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Success => tracing::info!(target: "lockerbay::notify", "{message}"),
            Severity::Warning => tracing::warn!(target: "lockerbay::notify", "{message}"),
            Severity::Error => tracing::error!(target: "lockerbay::notify", "{message}"),
        }
    }
}

/// Notifier that records messages in memory.
///
/// Used by the test suites to assert on user-visible outcomes.
#[derive(Debug, Default)]
pub struct BufferNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl BufferNotifier {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether any recorded message contains `fragment`.
    #[must_use]
    pub fn contains(&self, fragment: &str) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(_, message)| message.contains(fragment))
    }

    /// Discard all recorded messages.
    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for BufferNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_owned()));
    }
}
