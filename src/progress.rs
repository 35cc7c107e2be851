//! Progress reporting for a dispatch.
//!
//! The services give no real progress signal, so the dispatcher drives a
//! synthetic indicator while it waits: it climbs by a fixed step on a timer,
//! freezes at a cap short of 100, and snaps to 100 when the response arrives.
//! The value never decreases within one dispatch.
//!
//! Inject an [`Arc<dyn DispatchProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to receive the
//! values; the CLI forwards them to an indicatif bar.
//!
//! # Example
//!
//! ```rust
//! use docdash::{ClientConfig, DispatchProgressCallback, ToolId};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastValue(AtomicU8);
//!
//! impl DispatchProgressCallback for LastValue {
//!     fn on_progress(&self, _tool: ToolId, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .progress_callback(Arc::new(LastValue(AtomicU8::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::registry::ToolId;
use std::sync::Arc;

/// Called by the dispatcher while a request is in flight.
///
/// All methods default to no-ops so implementors only override what they
/// need. Implementations must be `Send + Sync`.
pub trait DispatchProgressCallback: Send + Sync {
    /// Called once, after pre-flight checks pass and before the request is sent.
    fn on_dispatch_start(&self, tool: ToolId) {
        let _ = tool;
    }

    /// Called with each new progress value (0–100, non-decreasing).
    fn on_progress(&self, tool: ToolId, percent: u8) {
        let _ = (tool, percent);
    }

    /// Called once when the dispatch settles.
    ///
    /// # Arguments
    /// * `success`: whether a payload or artifact was produced
    fn on_dispatch_complete(&self, tool: ToolId, success: bool) {
        let _ = (tool, success);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DispatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn DispatchProgressCallback>;

/// The synthetic progress value for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticProgress {
    value: u8,
    step: u8,
    cap: u8,
}

impl SyntheticProgress {
    /// Start at 0. `cap` is clamped below 100 so only [`complete`](Self::complete)
    /// can reach 100.
    pub fn new(step: u8, cap: u8) -> Self {
        Self {
            value: 0,
            step: step.max(1),
            cap: cap.min(99),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Advance one tick. Returns the new value, or `None` when frozen at the cap.
    pub fn tick(&mut self) -> Option<u8> {
        if self.value >= self.cap {
            return None;
        }
        self.value = self.value.saturating_add(self.step).min(self.cap);
        Some(self.value)
    }

    /// The real response arrived.
    pub fn complete(&mut self) -> u8 {
        self.value = 100;
        self.value
    }
}
