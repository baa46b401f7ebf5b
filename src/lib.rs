//! # pdf2audio
//!
//! Turn the text of a PDF into spoken audio.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file, download URL, or take uploaded bytes
//!  ├─ 2. Extract    read the text layer via pdfium (spawn_blocking)
//!  ├─ 3. Normalize  one flat passage: no line breaks, no invisible characters
//!  ├─ 4. Synth      Google Translate TTS (MP3) or a local espeak-ng engine (WAV)
//!  └─ 5. Output     audio bytes + derived file name + stats
//! ```
//!
//! Documents without a text layer (scans) fail with
//! [`Pdf2AudioError::NoExtractableText`]; no OCR is attempted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2audio::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().language("en").build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     std::fs::write(&output.file_name, &output.audio)?; // document.mp3
//!     Ok(())
//! }
//! ```
//!
//! ## Offline Speech
//!
//! ```rust,no_run
//! use pdf2audio::{convert, ConversionConfig, SynthesisBackend};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConversionConfig::builder()
//!     .backend(SynthesisBackend::Local)
//!     .rate(170)
//!     .volume(0.8)
//!     .build()?;
//! let output = convert("document.pdf", &config).await?; // document.wav
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2audio` binary (clap + anyhow + tracing-subscriber + indicatif); implies `server` |
//! | `server` | via cli | The axum web app in [`server`] |
//!
//! Disable default features when using only the library:
//! ```toml
//! pdf2audio = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;
pub mod synth;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSelection, SynthesisBackend};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_to_file, extract, inspect,
    output_file_name,
};
pub use error::Pdf2AudioError;
pub use output::{AudioFormat, AudioOutput, ConversionStats, DocumentMetadata};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use synth::{resolve_synthesizer, SpeechSynthesizer};
