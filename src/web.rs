//! HTML upload surface.
//!
//! ```text
//! GET  /        → empty upload form
//! POST /        → multipart field `pdf_file` → analysis → report page
//! GET  /health  → "OK"
//! ```
//!
//! Every outcome of `POST /` is a rendered page with status 200: either the
//! indented report plus a download link, or one user-visible message from
//! [`UploadError`]. The upload is spooled to a [`NamedTempFile`] inside the
//! upload directory and removed when the request finishes, whatever the
//! outcome. The client-supplied filename is only used for the `.pdf` check
//! and never touches the filesystem.

use crate::analyze::{analyze_file, write_report, AnalysisRun, REPORT_FILE_NAME};
use crate::config::AnalysisConfig;
use crate::error::AnalyzerError;
use crate::report::CompiledReport;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use base64::Engine;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "pdf_file";

/// Default directory for spooled uploads and the written report.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads/";

/// Largest accepted request body. Enacted legislation runs to tens of MB.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Where the upload surface listens and writes.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

/// Shared state for every request.
#[derive(Debug)]
pub struct AppState {
    pub analysis: AnalysisConfig,
    pub upload_dir: PathBuf,
}

/// What a failed upload shows the user. `Display` is the exact message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file part in the request.")]
    MissingFilePart,

    #[error("No selected file.")]
    NoSelectedFile,

    #[error("Invalid file format. Please upload a PDF file.")]
    InvalidFormat,

    /// Already carries the full "ERROR: ..." text.
    #[error("{0}")]
    Extraction(String),

    #[error("AI Agent Error: {0}. Check your API key.")]
    Agent(String),

    #[error("An unexpected error occurred during processing: {0}")]
    Unexpected(String),
}

/// Report ready for display: indented text plus the download payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub pretty_json: String,
    /// Base64 of the compact serialization.
    pub download_base64: String,
}

/// Build the router. Ensure `state.upload_dir` exists before serving.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the upload directory, bind and serve until the process exits.
pub async fn serve(server: ServerConfig, analysis: AnalysisConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&server.upload_dir).await?;
    let state = Arc::new(AppState {
        analysis,
        upload_dir: server.upload_dir.clone(),
    });

    let listener = tokio::net::TcpListener::bind(server.bind_addr).await?;
    info!(
        "Upload surface on http://{} (uploads: {})",
        listener.local_addr()?,
        server.upload_dir.display()
    );
    axum::serve(listener, router(state)).await
}

async fn health() -> &'static str {
    "OK"
}

async fn index() -> Html<String> {
    Html(render_page(None))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Html<String> {
    let outcome = match multipart {
        Ok(multipart) => process_upload(&state, multipart).await,
        Err(rejection) => {
            debug!("Request is not multipart: {}", rejection);
            Err(UploadError::MissingFilePart)
        }
    };
    if let Err(ref e) = outcome {
        warn!("Upload failed: {}", e);
    }
    Html(render_page(Some(&outcome)))
}

async fn process_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<RenderedReport, UploadError> {
    let spool = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Unexpected(e.to_string()))?
            .ok_or(UploadError::MissingFilePart)?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }
        if !has_pdf_extension(&filename) {
            return Err(UploadError::InvalidFormat);
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::Unexpected(e.to_string()))?;
        info!("Received upload '{}' ({} bytes)", filename, bytes.len());
        break spool_upload(&state.upload_dir, &bytes)
            .map_err(|e| UploadError::Unexpected(e.to_string()))?;
    };

    // `spool` is dropped (and the file deleted) on every return below.
    let run = analyze_file(spool.path(), &state.analysis)
        .await
        .map_err(classify)?;

    publish_report(run, &state.upload_dir).await
}

/// Turn a finished run into the page payload and write the report file.
///
/// The file under `upload_dir` holds exactly `pretty_json`; the download
/// payload is the base64 of the compact serialization. An aborted run becomes
/// [`UploadError::Agent`] and writes nothing.
pub async fn publish_report(
    run: AnalysisRun,
    upload_dir: &Path,
) -> Result<RenderedReport, UploadError> {
    let report = match run.report {
        CompiledReport::Aborted { error } => return Err(UploadError::Agent(error)),
        report @ CompiledReport::Report(_) => report,
    };

    let pretty_json = write_report(&report, upload_dir.join(REPORT_FILE_NAME))
        .await
        .map_err(|e| UploadError::Unexpected(e.to_string()))?;
    let compact = serde_json::to_string(&report)
        .map_err(|e| UploadError::Unexpected(e.to_string()))?;

    Ok(RenderedReport {
        pretty_json,
        download_base64: base64::engine::general_purpose::STANDARD.encode(compact),
    })
}

/// Case-insensitive `.pdf` suffix check on the client-supplied name.
pub fn has_pdf_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn spool_upload(dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

// A spooled file that cannot be read as a PDF is an extraction failure from
// the user's point of view. The spool path stays out of the message.
fn classify(err: AnalyzerError) -> UploadError {
    let detail = match err {
        AnalyzerError::Extraction { .. } => return UploadError::Extraction(err.to_string()),
        AnalyzerError::NotAPdf { magic, .. } => {
            format!("file does not start with a PDF header (first bytes: {magic:?})")
        }
        AnalyzerError::FileNotFound { .. } | AnalyzerError::PermissionDenied { .. } => {
            "uploaded file could not be read back".to_string()
        }
        other => return UploadError::Unexpected(other.to_string()),
    };
    UploadError::Extraction(AnalyzerError::Extraction { detail }.to_string())
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Legislative Act Analyzer</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
.error { background: #fdecea; border: 1px solid #f5c2c0; padding: 1rem; color: #8a1c1c; }
pre { background: #f6f8fa; padding: 1rem; overflow-x: auto; white-space: pre-wrap; }
</style>
</head>
<body>
<h1>Legislative Act Analyzer</h1>
<form method="post" enctype="multipart/form-data">
<input type="file" name="pdf_file" accept=".pdf,application/pdf">
<button type="submit">Analyze</button>
</form>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

/// Render the page for no submission, a report, or an error message.
pub fn render_page(outcome: Option<&Result<RenderedReport, UploadError>>) -> String {
    let mut html = String::from(PAGE_HEAD);
    match outcome {
        None => {}
        Some(Err(e)) => {
            html.push_str(&format!(
                "<div class=\"error\">{}</div>\n",
                escape_html(&e.to_string())
            ));
        }
        Some(Ok(report)) => {
            html.push_str("<h2>Structured Report</h2>\n");
            html.push_str(&format!(
                "<a download=\"{name}\" href=\"data:application/json;base64,{data}\">Download {name}</a>\n",
                name = REPORT_FILE_NAME,
                data = escape_html(&report.download_base64),
            ));
            html.push_str(&format!("<pre>{}</pre>\n", escape_html(&report.pretty_json)));
        }
    }
    html.push_str(PAGE_TAIL);
    html
}
