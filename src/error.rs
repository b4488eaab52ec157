//! Error types for the edgequake-pdf2brief library.
//!
//! Every failure in the brief pipeline is terminal for the run: a
//! half-filled summary is never rendered with blank fields. There is a single
//! fatal error type, [`SummaryError`].
//!
//! Variants are grouped by pipeline stage. [`SummaryError::kind`] collapses
//! them into a small stable [`ErrorKind`], and [`ErrorKind::exit_code`] gives
//! the CLI's process status.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2brief library.
#[derive(Debug, Error)]
pub enum SummaryError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is encrypted; text cannot be extracted.
    #[error("PDF '{path}' is encrypted.\nDecrypt it first, e.g. qpdf --decrypt input.pdf output.pdf")]
    EncryptedPdf { path: PathBuf },

    /// PDF parsed fine but contains no text (scanned images, empty pages).
    #[error("No extractable text in '{path}' ({pages} pages)\nScanned PDFs need OCR before summarising.")]
    NoExtractableText { path: PathBuf, pages: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required setting (typically the API key) is absent.
    #[error("Missing configuration '{key}'.\n{hint}")]
    ConfigMissing { key: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Request errors ────────────────────────────────────────────────────
    /// Network, transport or service-side failure calling the model.
    #[error("LLM request to '{provider}' failed: {detail}")]
    RequestFailed { provider: String, detail: String },

    /// The service rejected the credentials (401/403).
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The model did not answer within the configured timeout.
    #[error("LLM request timed out after {secs}s\nIncrease --api-timeout.")]
    RequestTimeout { secs: u64 },

    // ── Content errors ────────────────────────────────────────────────────
    /// The model reply is not well-formed JSON.
    ///
    /// `raw` holds the offending reply verbatim for diagnosis.
    #[error("Model reply is not valid JSON: {detail}\nRaw output:\n{raw}")]
    ParseFailure { detail: String, raw: String },

    /// The reply is JSON but does not have the summary shape.
    #[error("Model reply does not match the summary schema: {0}")]
    ValidationFailure(ValidationIssue),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not build or write the output PDF.
    #[error("Failed to render summary to '{path}': {detail}")]
    RenderError { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The specific way a parsed reply failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The reply's top level is not a JSON object.
    NotAnObject,
    /// A required field is absent (or `null`).
    Missing(&'static str),
    /// A field is present but of the wrong JSON type.
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    /// A field is present with the right type but carries no content.
    Empty(&'static str),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NotAnObject => write!(f, "top-level value is not a JSON object"),
            ValidationIssue::Missing(field) => write!(f, "required field '{field}' is missing"),
            ValidationIssue::WrongType { field, expected } => {
                write!(f, "field '{field}' must be {expected}")
            }
            ValidationIssue::Empty(field) => write!(f, "field '{field}' is empty"),
        }
    }
}

/// Coarse classification of [`SummaryError`] by pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Extraction,
    Config,
    Request,
    Timeout,
    Parse,
    Validation,
    Render,
    Internal,
}

impl ErrorKind {
    /// Process exit status for a run that failed with this kind of error.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Extraction => 3,
            ErrorKind::Request | ErrorKind::Timeout => 4,
            ErrorKind::Parse | ErrorKind::Validation => 5,
            ErrorKind::Render => 6,
            ErrorKind::Internal => 1,
        }
    }
}

/// Exit status for any error, found by walking its `source()` chain.
///
/// Context wrappers (e.g. `anyhow::Context`) are looked through; an error
/// with no [`SummaryError`] in its chain maps to 1.
pub fn exit_code_for(err: &(dyn std::error::Error + 'static)) -> u8 {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(summary_err) = e.downcast_ref::<SummaryError>() {
            return summary_err.kind().exit_code();
        }
        current = e.source();
    }
    1
}

impl SummaryError {
    /// Which stage of the pipeline produced this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummaryError::FileNotFound { .. }
            | SummaryError::PermissionDenied { .. }
            | SummaryError::NotAPdf { .. }
            | SummaryError::CorruptPdf { .. }
            | SummaryError::EncryptedPdf { .. }
            | SummaryError::NoExtractableText { .. } => ErrorKind::Extraction,
            SummaryError::ConfigMissing { .. } | SummaryError::InvalidConfig(_) => {
                ErrorKind::Config
            }
            SummaryError::RequestFailed { .. } | SummaryError::AuthError { .. } => {
                ErrorKind::Request
            }
            SummaryError::RequestTimeout { .. } => ErrorKind::Timeout,
            SummaryError::ParseFailure { .. } => ErrorKind::Parse,
            SummaryError::ValidationFailure(_) => ErrorKind::Validation,
            SummaryError::RenderError { .. } => ErrorKind::Render,
            SummaryError::Internal(_) => ErrorKind::Internal,
        }
    }
}
