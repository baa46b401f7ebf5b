//! Error type for the pdf2audio library.
//!
//! A conversion either yields audio or fails with one [`Pdf2AudioError`].
//! Callers usually only care about one distinction: did the document simply
//! contain no text (a scanned PDF, an image-only brochure), or did something
//! actually break? [`Pdf2AudioError::is_no_text`] answers that, so front-ends
//! can show a warning for the former and an error for everything else.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2audio library.
#[derive(Debug, Error)]
pub enum Pdf2AudioError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{source_name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{source_name}' is corrupt: {detail}")]
    CorruptPdf { source_name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{source_name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { source_name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{source_name}'")]
    WrongPassword { source_name: String },

    /// The page selection matches no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium could not read the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Every selected page was read but none of them carries any text.
    ///
    /// Typical for scanned documents. This is the "warning" outcome: nothing
    /// is broken, there is just nothing to read aloud.
    #[error("Could not find any text in '{source_name}'")]
    NoExtractableText { source_name: String },

    // ── Speech errors ─────────────────────────────────────────────────────
    /// The speech backend could not be reached (network down, DNS, TLS …).
    #[error("Speech backend '{backend}' is unavailable: {detail}")]
    BackendUnavailable { backend: String, detail: String },

    /// The speech backend answered, but not with audio.
    #[error("Speech synthesis failed ({backend}): {detail}")]
    SynthesisFailed { backend: String, detail: String },

    /// The local speech engine program could not be started.
    #[error(
        "Local speech engine '{program}' could not be started: {detail}\n\
Install espeak-ng or point PDF2AUDIO_ENGINE_COMMAND at a compatible engine."
    )]
    EngineNotFound { program: String, detail: String },

    /// The local speech engine exited unsuccessfully.
    #[error("Local speech engine exited with status {status}: {stderr}")]
    EngineFailed { status: i32, stderr: String },

    /// Synthesis finished without producing a single byte of audio.
    #[error("Speech backend '{backend}' produced no audio")]
    EmptyAudio { backend: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output audio file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs the pdfium shared library. You can:\n\
  • Install it system-wide (libpdfium.so / libpdfium.dylib / pdfium.dll).\n\
  • Place it in the working directory.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2AudioError {
    /// `true` when the document was readable but contained no text.
    pub fn is_no_text(&self) -> bool {
        matches!(self, Pdf2AudioError::NoExtractableText { .. })
    }

    /// `true` for errors caused by what the caller handed in (bad file, bad
    /// password, bad settings) rather than by a backend or the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Pdf2AudioError::FileNotFound { .. }
                | Pdf2AudioError::PermissionDenied { .. }
                | Pdf2AudioError::InvalidInput { .. }
                | Pdf2AudioError::NotAPdf { .. }
                | Pdf2AudioError::CorruptPdf { .. }
                | Pdf2AudioError::PasswordRequired { .. }
                | Pdf2AudioError::WrongPassword { .. }
                | Pdf2AudioError::PageOutOfRange { .. }
                | Pdf2AudioError::InvalidConfig(_)
        )
    }

    /// `true` for failures of the speech backend (cloud or local).
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Pdf2AudioError::BackendUnavailable { .. }
                | Pdf2AudioError::SynthesisFailed { .. }
                | Pdf2AudioError::EngineNotFound { .. }
                | Pdf2AudioError::EngineFailed { .. }
                | Pdf2AudioError::EmptyAudio { .. }
        )
    }
}
