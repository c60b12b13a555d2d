//! Text extraction: PDF bytes → plain text via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. The whole extraction
//! runs on Tokio's blocking pool so worker threads never stall.
//!
//! The pdfium shared library itself is located (or downloaded once and
//! cached) by `pdfium-auto`; set `PDFIUM_LIB_PATH` to use an existing copy.
//!
//! Extraction is all-or-nothing: a failure on any page discards the text of
//! every page.

use crate::error::AnalyzerError;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Extract the text of every page, one `'\n'` after each page, trimmed.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, AnalyzerError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
        .await
        .map_err(|e| AnalyzerError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
pub fn extract_text_blocking(bytes: &[u8]) -> Result<String, AnalyzerError> {
    let pdfium = pdfium_auto::bind_pdfium_silent().map_err(|e| AnalyzerError::Extraction {
        detail: format!("PDF engine unavailable: {e}"),
    })?;

    let document =
        pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| AnalyzerError::Extraction {
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut contents = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.text().map_err(|e| AnalyzerError::Extraction {
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        let content = page_text.all();
        debug!("Extracted page {} → {} chars", idx + 1, content.chars().count());
        contents.push(content);
    }

    let text = join_pages(contents);
    if text.is_empty() {
        warn!("PDF contains no extractable text (scanned document?)");
    }
    Ok(text)
}

/// Join page texts with one `'\n'` after each page, then trim the whole.
pub fn join_pages(pages: impl IntoIterator<Item = String>) -> String {
    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    text.trim().to_string()
}
