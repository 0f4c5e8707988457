//! Progress event types and broadcast channel for extraction telemetry.
//!
//! The page agent emits `ProgressEvent`s while collecting and downloading,
//! which flow through a `tokio::sync::broadcast` channel to all subscribers
//! (CLI progress bar, JSON reporter). When no subscriber exists, events are
//! silently dropped.

use serde::{Deserialize, Serialize};

/// A progress update emitted during an extraction run. Ephemeral,
/// fire-and-forget, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completion percentage, 0-100.
    pub percent: u8,
    /// Human-readable status line.
    pub status: String,
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
///
/// 256 events covers a typical run: a handful of milestone events plus one
/// event per attempted download.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emits progress events and guarantees the reported percentage never
/// decreases within a run, regardless of what callers hand it.
pub struct ProgressTracker {
    tx: Option<ProgressSender>,
    last_percent: u8,
}

impl ProgressTracker {
    /// Create a tracker. With `None`, every emit is a no-op.
    pub fn new(tx: Option<ProgressSender>) -> Self {
        Self {
            tx,
            last_percent: 0,
        }
    }

    /// Emit a progress event, clamping percent to be non-decreasing and
    /// capping at 100. Send errors (no receivers) are silently ignored.
    pub fn emit(&mut self, percent: u8, status: impl Into<String>) {
        let percent = percent.min(100).max(self.last_percent);
        self.last_percent = percent;
        if let Some(ref tx) = self.tx {
            let _ = tx.send(ProgressEvent {
                percent,
                status: status.into(),
            });
        }
    }

    /// The highest percentage emitted so far.
    pub fn current(&self) -> u8 {
        self.last_percent
    }
}
