//! Progress-callback trait for batch generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the batch walks the record list. The CLI drives an indicatif
//! bar from these; a GUI or web front-end can forward them to its own status
//! banner instead.
//!
//! # Example
//!
//! ```rust
//! use contact2html::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_record_complete(&self, index: usize, total: usize, filename: &str) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} → {}", index, total, filename);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { done: AtomicUsize::new(0) });
//! let config = GenerationConfig::builder()
//!     .progress_callback(cb as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch runner as it processes each record.
///
/// Records are processed strictly one at a time, so calls never overlap,
/// but the trait is `Send + Sync` so a callback can be shared with a
/// spawned task. All methods default to no-ops.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before the first record.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a record is rendered.
    ///
    /// # Arguments
    /// * `index` — 1-indexed record position
    /// * `total` — records in the batch
    /// * `name`  — display name being generated
    fn on_record_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a record's document has been written.
    fn on_record_complete(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a record is skipped because it has no name.
    fn on_record_skipped(&self, index: usize, total: usize, reason: &str) {
        let _ = (index, total, reason);
    }

    /// Called when rendering or writing a record failed.
    fn on_record_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called after every record finished (success, skip or error).
    ///
    /// `percent` is `processed / total × 100`, clamped to 0–100.
    fn on_progress(&self, percent: f32) {
        let _ = percent;
    }

    /// Called once after the last record.
    fn on_batch_complete(&self, total: usize, successful: usize, failed: usize) {
        let _ = (total, successful, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        errors: AtomicUsize,
        last_percent: Mutex<f32>,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_record_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_complete(&self, _index: usize, _total: usize, _filename: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_skipped(&self, _index: usize, _total: usize, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_progress(&self, percent: f32) {
            *self.last_percent.lock().unwrap() = percent;
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_record_start(1, 3, "Jane Doe");
        cb.on_record_complete(1, 3, "jane_doe_profile_1.html");
        cb.on_record_skipped(2, 3, "Contact 2: No name provided");
        cb.on_record_error(3, 3, "timeout");
        cb.on_progress(100.0);
        cb.on_batch_complete(3, 1, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_record_start(1, 3, "A");
        tracker.on_record_complete(1, 3, "a.html");
        tracker.on_record_skipped(2, 3, "no name");
        tracker.on_record_start(3, 3, "C");
        tracker.on_record_error(3, 3, "boom");
        tracker.on_progress(100.0);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.last_percent.lock().unwrap(), 100.0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn GenerationProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_record_complete(1, 10, "x.html");
    }
}
