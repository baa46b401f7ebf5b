//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! pdfium can open a document straight from a byte buffer, so unlike a
//! rasteriser we never need a file on disk. Both local files and downloads end
//! up as an in-memory `Vec<u8>` plus a human-readable source name that later
//! becomes the stem of the audio file name. We validate the PDF magic bytes
//! (`%PDF`) up front so callers get a meaningful error rather than a pdfium
//! parse failure.

use crate::error::Pdf2AudioError;
use std::path::Path;
use tracing::{debug, info};

/// PDF bytes together with the name they came from.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub bytes: Vec<u8>,
    /// File name (not the full path) or the last URL segment.
    pub source_name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If it is a local file, read it.
pub async fn resolve_input(
    input: &str,
    timeout_secs: u64,
) -> Result<ResolvedInput, Pdf2AudioError> {
    if input.trim().is_empty() {
        return Err(Pdf2AudioError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input)).await
    }
}

/// Verify that `bytes` start with the `%PDF` signature.
pub fn check_pdf_magic(bytes: &[u8], source_name: &str) -> Result<(), Pdf2AudioError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(Pdf2AudioError::NotAPdf {
            source_name: source_name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
async fn resolve_local(path: &Path) -> Result<ResolvedInput, Pdf2AudioError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2AudioError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Pdf2AudioError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Pdf2AudioError::InvalidInput {
                input: format!("{} ({e})", path.display()),
            });
        }
    };

    let source_name = file_name_of(path);
    check_pdf_magic(&bytes, &source_name)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput { bytes, source_name })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2AudioError> {
    info!("Downloading PDF from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| Pdf2AudioError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2AudioError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let to_download_error = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2AudioError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2AudioError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(parsed.clone()).send().await.map_err(to_download_error)?;

    if !response.status().is_success() {
        return Err(Pdf2AudioError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(to_download_error)?.to_vec();
    let source_name = filename_from_url(&parsed);
    check_pdf_magic(&bytes, &source_name)?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), source_name);
    Ok(ResolvedInput { bytes, source_name })
}

/// Last path segment of a URL when it looks like a file name.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty() && last.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
