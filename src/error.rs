//! Error types for the edgequake-timetable library.
//!
//! One enum, [`TimetableError`], covers every failure a conversion can hit.
//! Three variants form the recognition taxonomy the orchestrator reasons
//! about:
//!
//! * [`TimetableError::ServiceFailure`] — the model could not be reached or
//!   errored out. This is the only variant that triggers the fallback model.
//! * [`TimetableError::EmptyResponse`] — the model answered with nothing.
//! * [`TimetableError::MalformedResponse`] — the model answered, but no JSON
//!   array of rows could be recovered. Carries a short excerpt of the payload.
//!
//! An empty schedule is **not** an error: the normaliser turns it into a
//! placeholder table (see [`crate::table::normalize`]).

use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of characters kept in a diagnostic excerpt.
pub const EXCERPT_CHARS: usize = 300;

/// All errors returned by the edgequake-timetable library.
#[derive(Debug, Error)]
pub enum TimetableError {
    // ── Recognition errors ────────────────────────────────────────────────
    /// The recognition service returned empty or whitespace-only content.
    #[error("Model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    /// No JSON array of rows could be located or parsed in the response.
    #[error("Could not decode schedule rows: {reason}\nRaw snippet: {excerpt}")]
    MalformedResponse { reason: String, excerpt: String },

    /// Network, provider or timeout failure talking to the model.
    #[error("Recognition call to model '{model}' failed: {detail}")]
    ServiceFailure { model: String, detail: String },

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// Extension is neither a PDF nor one of the supported image formats.
    #[error("Unsupported file type '{extension}'. Expected .pdf, .jpg, .jpeg, .png, .bmp or .webp")]
    UnsupportedFileType { extension: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file has a `.pdf` extension but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The pdfium shared library could not be loaded.
    #[error("PDF engine unavailable: {detail}\nInstall libpdfium or point PDFIUM_LIB_PATH at it.")]
    PdfiumUnavailable { detail: String },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("No pages selected (document has {total} pages)")]
    NoPagesSelected { total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A page or uploaded image could not be encoded for the model.
    #[error("Image encoding failed: {0}")]
    ImageEncodingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
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

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TimetableError {
    /// Whether this failure may be retried against the fallback model.
    ///
    /// Only transport/provider failures qualify. An empty or malformed answer
    /// means the model did respond, and asking again is not attempted.
    pub fn is_service_failure(&self) -> bool {
        matches!(self, TimetableError::ServiceFailure { .. })
    }

    /// Build a [`TimetableError::MalformedResponse`] with a truncated excerpt.
    pub fn malformed(reason: impl Into<String>, payload: &str) -> Self {
        TimetableError::MalformedResponse {
            reason: reason.into(),
            excerpt: excerpt(payload),
        }
    }
}

/// First [`EXCERPT_CHARS`] characters of `payload`, cut on a char boundary.
pub fn excerpt(payload: &str) -> String {
    match payload.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &payload[..cut]),
        None => payload.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_service_failure_is_retryable() {
        let service = TimetableError::ServiceFailure {
            model: "gpt-4o".into(),
            detail: "503".into(),
        };
        assert!(service.is_service_failure());
        assert!(!TimetableError::EmptyResponse { model: "gpt-4o".into() }.is_service_failure());
        assert!(!TimetableError::malformed("no array", "hello").is_service_failure());
    }

    #[test]
    fn excerpt_is_truncated_on_char_boundary() {
        let long = "é".repeat(EXCERPT_CHARS + 50);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 1);
        assert!(cut.ends_with('…'));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn malformed_display_carries_excerpt() {
        let e = TimetableError::malformed("no JSON array", "Sorry, I cannot read this image");
        let msg = e.to_string();
        assert!(msg.contains("no JSON array"), "got: {msg}");
        assert!(msg.contains("Sorry, I cannot"), "got: {msg}");
    }

    #[test]
    fn service_failure_display() {
        let e = TimetableError::ServiceFailure {
            model: "gpt-4o-mini".into(),
            detail: "connection reset".into(),
        };
        assert!(e.to_string().contains("gpt-4o-mini"));
        assert!(e.to_string().contains("connection reset"));
    }
}
