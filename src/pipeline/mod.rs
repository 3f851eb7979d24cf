//! Pipeline stages for SRS conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (prompt) ──▶ llm ──▶ response file
//! (URL/path) (pdfium)   (template)   (model)   └─▶ postprocess ──▶ sections
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL to a local PDF
//! 2. [`extract`] — read the text layer of the selected pages
//! 3. [`llm`]     — the single blocking completion request; the only stage
//!    that talks to the model
//! 4. [`postprocess`] — text cleanup on the way in and fence stripping on
//!    the way out

pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
