//! Text extraction: read the text layer of selected pages via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling on large documents.
//!
//! Scanned documents have no text layer at all. Extraction still succeeds for
//! them; every page simply comes back empty and the caller decides what an
//! empty document means.

use crate::config::PageSelection;
use crate::error::Pdf2AudioError;
use crate::output::DocumentMetadata;
use crate::pipeline::normalize::join_pages;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Raw text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    pub text: String,
}

/// Everything read from a document in one pass.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub pages: Vec<PageText>,
    pub metadata: DocumentMetadata,
}

impl ExtractedText {
    /// All page texts concatenated in page order.
    pub fn joined(&self) -> String {
        join_pages(self.pages.iter().map(|p| p.text.as_str()))
    }
}

/// Extract the text of the selected pages.
///
/// This runs inside `spawn_blocking` since pdfium calls block.
pub async fn extract_text(
    bytes: Vec<u8>,
    source_name: &str,
    password: Option<&str>,
    pages: &PageSelection,
    progress: Option<ProgressCallback>,
) -> Result<ExtractedText, Pdf2AudioError> {
    let name = source_name.to_string();
    let pwd = password.map(str::to_string);
    let selection = pages.clone();

    tokio::task::spawn_blocking(move || {
        extract_text_blocking(bytes, &name, pwd.as_deref(), &selection, progress.as_ref())
    })
    .await
    .map_err(|e| Pdf2AudioError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract document metadata from a PDF without reading page text.
pub async fn extract_metadata(
    bytes: Vec<u8>,
    source_name: &str,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2AudioError> {
    let name = source_name.to_string();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, bytes, &name, pwd.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| Pdf2AudioError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Bind to the pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (a library file or the directory holding
/// it), then the working directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2AudioError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(raw) => {
            let path = PathBuf::from(raw);
            let lib = if path.is_dir() {
                path.join(Pdfium::pdfium_platform_library_name())
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => {
            let local = PathBuf::from(".").join(Pdfium::pdfium_platform_library_name());
            Pdfium::bind_to_library(&local).or_else(|_| Pdfium::bind_to_system_library())
        }
    }
    .map_err(|e| Pdf2AudioError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(
    bytes: Vec<u8>,
    source_name: &str,
    password: Option<&str>,
    selection: &PageSelection,
    progress: Option<&ProgressCallback>,
) -> Result<ExtractedText, Pdf2AudioError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, bytes, source_name, password)?;
    let metadata = read_metadata(&document);
    let total_pages = metadata.page_count;
    info!("PDF loaded: {} pages", total_pages);

    let indices = selection.to_indices(total_pages);
    if indices.is_empty() && total_pages > 0 {
        return Err(Pdf2AudioError::PageOutOfRange {
            page: selection.first_requested(),
            total: total_pages,
        });
    }

    if let Some(cb) = progress {
        cb.on_conversion_start(indices.len());
    }

    let doc_pages = document.pages();
    let mut pages = Vec::with_capacity(indices.len());

    for &idx in &indices {
        let page_num = idx + 1;
        let page = doc_pages
            .get(idx as u16)
            .map_err(|e| Pdf2AudioError::TextExtractionFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let text = page
            .text()
            .map_err(|e| Pdf2AudioError::TextExtractionFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?
            .all();

        debug!("Page {} → {} chars", page_num, text.chars().count());
        if let Some(cb) = progress {
            cb.on_page_extracted(page_num, indices.len(), text.chars().count());
        }

        pages.push(PageText { page_num, text });
    }

    Ok(ExtractedText { pages, metadata })
}

/// Load a document from memory, mapping pdfium failures to library errors.
fn open_document<'a>(
    pdfium: &'a Pdfium,
    bytes: Vec<u8>,
    source_name: &str,
    password: Option<&str>,
) -> Result<PdfDocument<'a>, Pdf2AudioError> {
    pdfium.load_pdf_from_byte_vec(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2AudioError::WrongPassword {
                    source_name: source_name.to_string(),
                }
            } else {
                Pdf2AudioError::PasswordRequired {
                    source_name: source_name.to_string(),
                }
            }
        } else {
            Pdf2AudioError::CorruptPdf {
                source_name: source_name.to_string(),
                detail: err_str,
            }
        }
    })
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_keeps_page_order_and_separates_pages() {
        let extracted = ExtractedText {
            pages: vec![
                PageText {
                    page_num: 1,
                    text: "first".into(),
                },
                PageText {
                    page_num: 2,
                    text: "second".into(),
                },
            ],
            metadata: DocumentMetadata::default(),
        };
        assert_eq!(extracted.joined(), "first\nsecond");
    }

    #[test]
    fn binding_to_missing_library_fails_cleanly() {
        // Points at a directory that certainly holds no pdfium build.
        let dir = tempfile::tempdir().unwrap();
        let prev = std::env::var_os("PDFIUM_LIB_PATH");
        std::env::set_var("PDFIUM_LIB_PATH", dir.path());
        let result = bind_pdfium();
        match prev {
            Some(v) => std::env::set_var("PDFIUM_LIB_PATH", v),
            None => std::env::remove_var("PDFIUM_LIB_PATH"),
        }
        assert!(matches!(result, Err(Pdf2AudioError::PdfiumBindingFailed(_))));
    }
}
