//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves from text extraction to speech synthesis.
//!
//! # Example
//!
//! ```rust
//! use pdf2audio::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ChunkCounter {
//!     chunks: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for ChunkCounter {
//!     fn on_chunk_synthesized(&self, chunk: usize, total_chunks: usize) {
//!         self.chunks.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("chunk {chunk}/{total_chunks}");
//!     }
//! }
//!
//! let counter = Arc::new(ChunkCounter { chunks: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; the web app
/// shares one callback across requests.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the PDF is open and the page selection is known.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be read
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after the text of one page has been read.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages being read
    /// * `chars`       — characters of raw text found on the page
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called just before the flattened text is handed to the speech backend.
    ///
    /// # Arguments
    /// * `backend` — synthesizer name, e.g. `google-tts` or `local-engine`
    /// * `chars`   — length of the text to be spoken
    fn on_synthesis_start(&self, backend: &str, chars: usize) {
        let _ = (backend, chars);
    }

    /// Called when the backend finished one request.
    ///
    /// The cloud backend reports one event per text token; the local engine
    /// reports a single `1/1` event.
    fn on_chunk_synthesized(&self, chunk: usize, total_chunks: usize) {
        let _ = (chunk, total_chunks);
    }

    /// Called once audio is ready.
    ///
    /// # Arguments
    /// * `audio_bytes` — size of the produced audio
    fn on_conversion_complete(&self, audio_bytes: usize) {
        let _ = audio_bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        pages: AtomicUsize,
        chars: AtomicUsize,
        chunks: AtomicUsize,
        audio: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_page_extracted(&self, _page_num: usize, _total_pages: usize, chars: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
            self.chars.fetch_add(chars, Ordering::SeqCst);
        }

        fn on_chunk_synthesized(&self, _chunk: usize, _total_chunks: usize) {
            self.chunks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, audio_bytes: usize) {
            self.audio.store(audio_bytes, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_page_extracted(1, 2, 120);
        cb.on_synthesis_start("google-tts", 120);
        cb.on_chunk_synthesized(1, 2);
        cb.on_conversion_complete(4096);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_page_extracted(1, 2, 100);
        tracker.on_page_extracted(2, 2, 50);
        tracker.on_chunk_synthesized(1, 2);
        tracker.on_chunk_synthesized(2, 2);
        tracker.on_conversion_complete(2048);

        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.chars.load(Ordering::SeqCst), 150);
        assert_eq!(tracker.chunks.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.audio.load(Ordering::SeqCst), 2048);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
        cb.on_synthesis_start("local-engine", 5);
    }
}
