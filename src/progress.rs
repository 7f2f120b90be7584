//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to follow a
//! conversion as it moves through input, recognition and rendering. The CLI
//! uses it to drive its spinner.
//!
//! # Example
//!
//! ```rust
//! use edgequake_timetable::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::Arc;
//!
//! struct LogFallback;
//!
//! impl ConversionProgressCallback for LogFallback {
//!     fn on_fallback(&self, from: &str, to: &str, error: &str) {
//!         eprintln!("{from} failed ({error}); retrying with {to}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(LogFallback) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline at each stage boundary.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// The input was resolved and its content acquired.
    ///
    /// * `kind`  — "text" or "images"
    /// * `parts` — 1 for text, number of images otherwise
    fn on_input_ready(&self, kind: &str, parts: usize) {
        let _ = (kind, parts);
    }

    /// A recognition request is about to be sent to `model`.
    fn on_recognition_start(&self, model: &str) {
        let _ = model;
    }

    /// The primary model failed and `to` is being tried instead.
    fn on_fallback(&self, from: &str, to: &str, error: &str) {
        let _ = (from, to, error);
    }

    /// Rows were decoded and adjusted.
    fn on_rows_ready(&self, rows: usize, adjusted_cells: usize) {
        let _ = (rows, adjusted_cells);
    }

    /// The output document is complete.
    fn on_render_complete(&self, pages: usize) {
        let _ = pages;
    }
}

/// Shared handle to a progress callback.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// A no-op implementation.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_recognition_start(&self, model: &str) {
            self.events.lock().unwrap().push(format!("start:{model}"));
        }
        fn on_fallback(&self, from: &str, to: &str, _error: &str) {
            self.events.lock().unwrap().push(format!("fallback:{from}->{to}"));
        }
    }

    #[test]
    fn default_methods_are_noops() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_input_ready("text", 1);
        cb.on_recognition_start("m");
        cb.on_fallback("a", "b", "e");
        cb.on_rows_ready(3, 1);
        cb.on_render_complete(2);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_recognition_start("gpt-4o");
        cb.on_fallback("gpt-4o", "gpt-4.1-mini", "503");
        cb.on_render_complete(1);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start:gpt-4o", "fallback:gpt-4o->gpt-4.1-mini"]
        );
    }
}
