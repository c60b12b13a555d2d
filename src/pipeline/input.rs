//! Input resolution: read a user-supplied path into validated PDF bytes.
//!
//! The PDF magic bytes (`%PDF`) are checked before returning so callers get
//! a meaningful error rather than an opaque pdfium failure.

use crate::error::AnalyzerError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The four bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Whether `bytes` starts with the PDF magic number.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[..4] == PDF_MAGIC
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
pub async fn resolve_local(path: impl AsRef<Path>) -> Result<Vec<u8>, AnalyzerError> {
    let path: PathBuf = path.as_ref().to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnalyzerError::PermissionDenied { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AnalyzerError::FileNotFound { path });
        }
        Err(e) => {
            return Err(AnalyzerError::Internal(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            )));
        }
    };

    if !has_pdf_magic(&bytes) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(AnalyzerError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
