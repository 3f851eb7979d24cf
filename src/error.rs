//! Error types for the srs2test library.
//!
//! * [`Srs2TestError`] — **Fatal**: the current mode cannot proceed (bad
//!   input file, malformed JSON, provider not configured, empty model
//!   response). Returned as `Err(Srs2TestError)` from every entry point.
//!
//! * [`TemplateError`] — a prompt template referenced a placeholder that no
//!   value was supplied for. Wrapped into [`Srs2TestError::Template`] when it
//!   escapes a pipeline entry point.
//!
//! Missing exemplar files are deliberately *not* errors: they are logged and
//! replaced by a placeholder marker so prompt generation can still finish.
//! Merging and splitting never fail on malformed entries; those are skipped.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the srs2test library.
#[derive(Debug, Error)]
pub enum Srs2TestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
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

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A file could not be read for a reason other than absence.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium could not read the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Every selected page came back blank (scanned document, image-only PDF).
    #[error("No extractable text in '{path}'\nScanned PDFs need OCR before conversion.")]
    NoExtractableText { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── JSON errors ───────────────────────────────────────────────────────
    /// A JSON input (SRS, UI structure, model response) failed to parse.
    #[error("Malformed JSON in {context}: {source}")]
    InvalidJson {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A requirements document parsed, but its top level is not an array of sections.
    #[error("Expected a JSON array of sections in {context}, found {found}")]
    NotASectionList { context: String, found: &'static str },

    // ── Prompt errors ─────────────────────────────────────────────────────
    /// A template placeholder had no value.
    #[error(transparent)]
    Template(#[from] TemplateError),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error. Not retried.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call did not finish within `api_timeout_secs`.
    #[error("LLM call timed out after {secs}s\nIncrease --api-timeout.")]
    ModelTimeout { secs: u64 },

    /// The model answered with nothing usable.
    #[error("The model returned an empty response; no output was written")]
    EmptyModelResponse,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
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

/// Failure while filling a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template contains `{name}` but no value named `name` was supplied.
    #[error("Prompt template references '{{{name}}}' but no value was supplied for it")]
    MissingValue { name: String },
}
