//! Conversion entry points.
//!
//! Every entry point runs the same job: PDF bytes → page text → one flattened
//! passage → speech. The whole document is synthesised as a single unit, so
//! there is no partial output; either audio comes back or an error does.

use crate::config::ConversionConfig;
use crate::error::Pdf2AudioError;
use crate::output::{AudioFormat, AudioOutput, ConversionStats, DocumentMetadata};
use crate::pipeline::{extract, input, normalize};
use crate::synth::resolve_synthesizer;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stem used when the input name has none (e.g. `".pdf"`).
const FALLBACK_STEM: &str = "audiobook";

/// Convert a PDF file or URL to speech.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// [`Pdf2AudioError::NoExtractableText`] when the selected pages carry no
/// text layer (scanned documents); any other variant for I/O, PDF or
/// synthesis failures.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<AudioOutput, Pdf2AudioError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_from_bytes(resolved.bytes, &resolved.source_name, config).await
}

/// Convert PDF bytes already in memory.
///
/// `source_name` is the name the bytes came from (an upload's file name, for
/// instance); it only feeds error messages and the output file name.
///
/// # Example
/// ```rust,no_run
/// use pdf2audio::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("lecture.pdf")?;
/// let output = convert_from_bytes(bytes, "lecture.pdf", &ConversionConfig::default()).await?;
/// std::fs::write(&output.file_name, &output.audio)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: Vec<u8>,
    source_name: &str,
    config: &ConversionConfig,
) -> Result<AudioOutput, Pdf2AudioError> {
    let total_start = Instant::now();
    input::check_pdf_magic(&bytes, source_name)?;

    // ── Step 1: Pick the voice ───────────────────────────────────────────
    // Done before extraction so a bad backend setup fails fast.
    let synthesizer = resolve_synthesizer(config)?;

    // ── Step 2: Extract page text ────────────────────────────────────────
    let extract_start = Instant::now();
    let extracted = extract::extract_text(
        bytes,
        source_name,
        config.password.as_deref(),
        &config.pages,
        config.progress_callback.clone(),
    )
    .await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 3: Flatten ──────────────────────────────────────────────────
    let text = normalize::flatten_text(&extracted.joined());
    if text.is_empty() {
        warn!(
            "No extractable text in '{}' ({} pages read); it may be a scanned document",
            source_name,
            extracted.pages.len()
        );
        return Err(Pdf2AudioError::NoExtractableText {
            source_name: source_name.to_string(),
        });
    }
    let text_chars = text.chars().count();
    debug!("Flattened text: {} chars", text_chars);

    // ── Step 4: Synthesise ───────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_synthesis_start(synthesizer.name(), text_chars);
    }
    let synth_start = Instant::now();
    let audio = synthesizer.synthesize(&text).await?;
    let synthesis_duration_ms = synth_start.elapsed().as_millis() as u64;

    if audio.is_empty() {
        return Err(Pdf2AudioError::EmptyAudio {
            backend: synthesizer.name().to_string(),
        });
    }

    let format = synthesizer.format();
    let stats = ConversionStats {
        total_pages: extracted.metadata.page_count,
        extracted_pages: extracted.pages.len(),
        text_chars,
        audio_bytes: audio.len(),
        backend: synthesizer.name().to_string(),
        extract_duration_ms,
        synthesis_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} chars → {} bytes of {} via {} in {}ms",
        text_chars, stats.audio_bytes, format, stats.backend, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(audio.len());
    }

    Ok(AudioOutput {
        audio,
        file_name: output_file_name(source_name, format),
        format,
        metadata: extracted.metadata,
        stats,
    })
}

/// Convert a PDF and write the audio to a file.
///
/// With `output_path = None` the file is written to the working directory
/// under the derived name (see [`output_file_name`]). Uses atomic write
/// (temp file + rename) to prevent partial files. Returns the path written.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<(PathBuf, ConversionStats), Pdf2AudioError> {
    let output = convert(input_str, config).await?;
    let path = match output_path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(&output.file_name),
    };

    write_atomic(&path, &output.audio).await?;
    info!("Wrote {} ({} bytes)", path.display(), output.audio.len());
    Ok((path, output.stats))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<AudioOutput, Pdf2AudioError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2AudioError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Extract PDF metadata without reading text or synthesising anything.
///
/// Only the download timeout and the password of `config` are used.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2AudioError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_metadata(resolved.bytes, &resolved.source_name, config.password.as_deref())
        .await
}

/// The flattened text a conversion would speak, without speaking it.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<String, Pdf2AudioError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let extracted = extract::extract_text(
        resolved.bytes,
        &resolved.source_name,
        config.password.as_deref(),
        &config.pages,
        config.progress_callback.clone(),
    )
    .await?;

    let text = normalize::flatten_text(&extracted.joined());
    if text.is_empty() {
        warn!("No extractable text in '{}'", resolved.source_name);
        return Err(Pdf2AudioError::NoExtractableText {
            source_name: resolved.source_name,
        });
    }
    Ok(text)
}

/// Audio file name for an input document.
///
/// Directory components are dropped, a trailing `.pdf` (any case) or else the
/// last extension is replaced by the audio extension.
///
/// ```
/// use pdf2audio::{output_file_name, AudioFormat};
///
/// assert_eq!(output_file_name("uploads/Chapter 1.PDF", AudioFormat::Mp3), "Chapter 1.mp3");
/// assert_eq!(output_file_name("notes.txt", AudioFormat::Wav), "notes.wav");
/// ```
pub fn output_file_name(input_name: &str, format: AudioFormat) -> String {
    let base = input_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input_name);

    let split = base.len().saturating_sub(4);
    let stem = if base.is_char_boundary(split) && base[split..].eq_ignore_ascii_case(".pdf") {
        &base[..split]
    } else {
        Path::new(base)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(base)
    };

    let stem = if stem.trim().is_empty() { FALLBACK_STEM } else { stem };
    format!("{}.{}", stem, format.extension())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2AudioError> {
    let write_err = |e: std::io::Error| Pdf2AudioError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}
