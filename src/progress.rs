//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::GeneratorConfigBuilder::progress_callback`] to follow a
//! conversion as it moves from text extraction to the model request to the
//! written output. The single model call can take minutes, so a caller that
//! drives a terminal spinner wants to know when it starts and ends.
//!
//! # Example
//!
//! ```rust
//! use srs2test::{ConversionProgressCallback, GeneratorConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SectionCounter {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for SectionCounter {
//!     fn on_section_written(&self, name: &str) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("wrote {name}");
//!     }
//! }
//!
//! let counter = Arc::new(SectionCounter { written: AtomicUsize::new(0) });
//!
//! let config = GeneratorConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline at each stage boundary.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the PDF is opened, before any page text is read.
    ///
    /// # Arguments
    /// * `total_pages` — pages in the document
    /// * `selected_pages` — pages that will be extracted
    fn on_extraction_start(&self, total_pages: usize, selected_pages: usize) {
        let _ = (total_pages, selected_pages);
    }

    /// Called after every selected page has been read.
    ///
    /// # Arguments
    /// * `extracted_pages` — pages that yielded text
    /// * `chars` — characters in the joined text
    fn on_extraction_complete(&self, extracted_pages: usize, chars: usize) {
        let _ = (extracted_pages, chars);
    }

    /// Called just before the completion request is sent.
    ///
    /// # Arguments
    /// * `model` — model identifier the request goes to
    /// * `prompt_len` — byte length of the assembled instruction
    fn on_model_request(&self, model: &str, prompt_len: usize) {
        let _ = (model, prompt_len);
    }

    /// Called when the model answers.
    ///
    /// # Arguments
    /// * `response_len` — byte length of the response text
    fn on_model_response(&self, response_len: usize) {
        let _ = response_len;
    }

    /// Called when the model call fails.
    fn on_model_error(&self, error: &str) {
        let _ = error;
    }

    /// Called after each per-section file is written.
    fn on_section_written(&self, file_name: &str) {
        let _ = file_name;
    }

    /// Called once the structured JSON has been written.
    fn on_conversion_complete(&self, output_bytes: usize) {
        let _ = output_bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GeneratorConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        selected: AtomicUsize,
        requests: AtomicUsize,
        errors: AtomicUsize,
        sections: Mutex<Vec<String>>,
        output_bytes: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_extraction_start(&self, _total_pages: usize, selected_pages: usize) {
            self.selected.store(selected_pages, Ordering::SeqCst);
        }

        fn on_model_request(&self, _model: &str, _prompt_len: usize) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn on_model_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_section_written(&self, file_name: &str) {
            self.sections.lock().unwrap().push(file_name.to_string());
        }

        fn on_conversion_complete(&self, output_bytes: usize) {
            self.output_bytes.store(output_bytes, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(5, 3);
        cb.on_extraction_complete(3, 1200);
        cb.on_model_request("gpt-5-mini", 4000);
        cb.on_model_response(900);
        cb.on_model_error("timeout");
        cb.on_section_written("1-Intro.json");
        cb.on_conversion_complete(900);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_extraction_start(12, 4);
        tracker.on_model_request("gpt-5-mini", 10);
        tracker.on_section_written("1-Intro.json");
        tracker.on_section_written("2-Core.json");
        tracker.on_conversion_complete(321);

        assert_eq!(tracker.selected.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.requests.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
        assert_eq!(
            *tracker.sections.lock().unwrap(),
            vec!["1-Intro.json".to_string(), "2-Core.json".to_string()]
        );
        assert_eq!(tracker.output_bytes.load(Ordering::SeqCst), 321);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(10, 10);
        cb.on_model_response(512);
    }
}
