//! End-to-end integration tests for pdf2audio.
//!
//! These tests open real PDFs with pdfium and are gated behind the
//! `E2E_ENABLED` environment variable (and a bindable pdfium library) so they
//! do not run in CI unless explicitly requested. Speech comes from a fake
//! local engine, so no network is needed; the one live cloud test is further
//! gated behind `E2E_CLOUD`.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/lib cargo test --test e2e -- --nocapture

mod common;

use common::{build_pdf, pdfium_ready, write_file};
use pdf2audio::{
    convert, convert_from_bytes, convert_to_file, extract, inspect, AudioFormat,
    ConversionConfig, ConversionProgressCallback, PageSelection, Pdf2AudioError,
    SynthesisBackend,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

macro_rules! e2e_skip_unless_ready {
    () => {
        if !pdfium_ready() {
            return;
        }
    };
}

#[cfg(unix)]
fn local_config(dir: &std::path::Path) -> ConversionConfig {
    ConversionConfig::builder()
        .backend(SynthesisBackend::Local)
        .engine_command(common::fake_engine(dir))
        .build()
        .unwrap()
}

// ── Inspect / extract (no synthesis) ─────────────────────────────────────────

#[tokio::test]
async fn test_inspect_counts_pages() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "three.pdf", &build_pdf(&["One", "Two", "Three"]));

    let meta = inspect(path.to_str().unwrap(), &ConversionConfig::default())
        .await
        .expect("inspect() should succeed");
    assert_eq!(meta.page_count, 3);
    assert!(!meta.pdf_version.is_empty());
}

#[tokio::test]
async fn test_extract_flattens_pages() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "two.pdf",
        &build_pdf(&["Hello from page one", "and page two"]),
    );

    let text = extract(path.to_str().unwrap(), &ConversionConfig::default())
        .await
        .expect("extract() should succeed");

    assert!(text.contains("Hello from page one"), "got {text:?}");
    assert!(text.contains("and page two"), "got {text:?}");
    assert!(!text.contains('\n'));
    assert_eq!(text, text.trim());
}

#[tokio::test]
async fn test_page_selection_limits_text() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "abc.pdf", &build_pdf(&["Alpha", "Bravo", "Charlie"]));
    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(2))
        .build()
        .unwrap();

    let text = extract(path.to_str().unwrap(), &config).await.unwrap();
    assert!(text.contains("Bravo"));
    assert!(!text.contains("Alpha"));
    assert!(!text.contains("Charlie"));
}

#[tokio::test]
async fn test_page_out_of_range() {
    e2e_skip_unless_ready!();
    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(9))
        .build()
        .unwrap();
    let err = convert_from_bytes(build_pdf(&["Only page"]), "one.pdf", &config)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Pdf2AudioError::PageOutOfRange { page: 9, total: 1 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_corrupt_pdf_is_reported() {
    e2e_skip_unless_ready!();
    let err = convert_from_bytes(
        b"%PDF-1.4\nthis is not a pdf".to_vec(),
        "bad.pdf",
        &ConversionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Pdf2AudioError::CorruptPdf { .. }), "got {err:?}");
}

// ── Full conversions with the fake local engine ──────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn test_text_pdf_produces_audio() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "Lecture Notes.pdf", &build_pdf(&["Hello world"]));

    let output = convert(path.to_str().unwrap(), &local_config(dir.path()))
        .await
        .expect("conversion should succeed");

    assert!(!output.audio.is_empty());
    assert!(output.audio.starts_with(b"RIFF"));
    assert_eq!(output.format, AudioFormat::Wav);
    assert_eq!(output.file_name, "Lecture Notes.wav");
    assert_eq!(output.stats.total_pages, 1);
    assert_eq!(output.stats.backend, "local-engine");
    assert_eq!(output.stats.audio_bytes, output.audio.len());
    assert!(String::from_utf8_lossy(&output.audio).contains("Hello world"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_scanned_pdf_yields_no_text_and_no_file() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "scan.pdf", &build_pdf(&["", ""]));
    let out_path = dir.path().join("scan.wav");

    let err = convert_to_file(path.to_str().unwrap(), Some(&out_path), &local_config(dir.path()))
        .await
        .unwrap_err();

    assert!(err.is_no_text(), "got {err:?}");
    assert!(!out_path.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_convert_to_file_writes_audio() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "story.pdf", &build_pdf(&["Once upon a time"]));
    let out_path = dir.path().join("out").join("story.wav");

    let (written, stats) =
        convert_to_file(path.to_str().unwrap(), Some(&out_path), &local_config(dir.path()))
            .await
            .unwrap();

    assert_eq!(written, out_path);
    let bytes = std::fs::read(&out_path).unwrap();
    assert_eq!(bytes.len(), stats.audio_bytes);
    assert!(stats.text_chars >= "Once upon a time".len());
}

#[cfg(unix)]
#[tokio::test]
async fn test_progress_events_are_reported() {
    e2e_skip_unless_ready!();

    #[derive(Default)]
    struct Recorder {
        pages: AtomicUsize,
        chunks: AtomicUsize,
        completed: AtomicUsize,
    }
    impl ConversionProgressCallback for Recorder {
        fn on_page_extracted(&self, _p: usize, _t: usize, _c: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
        fn on_chunk_synthesized(&self, _c: usize, _t: usize) {
            self.chunks.fetch_add(1, Ordering::SeqCst);
        }
        fn on_conversion_complete(&self, _bytes: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = local_config(dir.path())
        .to_builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    convert_from_bytes(build_pdf(&["One", "Two"]), "two.pdf", &config)
        .await
        .unwrap();

    assert_eq!(recorder.pages.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.chunks.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 1);
}

// ── Live cloud speech ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cloud_voice_live() {
    e2e_skip_unless_ready!();
    if std::env::var("E2E_CLOUD").is_err() {
        println!("SKIP — set E2E_CLOUD=1 to call Google Translate TTS");
        return;
    }

    let output = convert_from_bytes(
        build_pdf(&["This is a short test of the cloud voice."]),
        "cloud.pdf",
        &ConversionConfig::default(),
    )
    .await
    .expect("cloud conversion should succeed");

    assert_eq!(output.file_name, "cloud.mp3");
    assert_eq!(output.format, AudioFormat::Mp3);
    assert!(output.audio.len() > 1000, "suspiciously small MP3: {} bytes", output.audio.len());
}
