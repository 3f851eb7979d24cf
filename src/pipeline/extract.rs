//! Text extraction: read the text layer of selected PDF pages via pdfium.
//!
//! SRS documents are born-digital (exported from Word or Confluence), so the
//! embedded text layer is good enough to hand to a text model. Scanned,
//! image-only documents come back blank and are rejected with
//! `NoExtractableText` rather than producing an empty prompt.

use crate::config::PageSelection;
use crate::error::Srs2TestError;
use crate::pipeline::postprocess::clean_extracted_text;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text pulled from a PDF, one entry per selected page that had any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// The document the text came from, named the way the user gave it.
    pub source: PathBuf,
    /// Pages in the document, selected or not.
    pub total_pages: usize,
    /// Pages that were selected for extraction.
    pub selected_pages: usize,
    /// `(page_num_1based, cleaned_text)` for each non-blank selected page.
    pub pages: Vec<(usize, String)>,
}

impl ExtractedText {
    /// All page texts joined by a single newline.
    pub fn joined(&self) -> String {
        self.pages
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Bind to a pdfium library.
///
/// Lookup order:
/// 1. `PDFIUM_LIB_PATH` (a file, or a directory holding the platform library)
/// 2. the platform library name in the working directory
/// 3. the system loader path
pub fn bind_pdfium() -> Result<Pdfium, Srs2TestError> {
    if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(env_path);
        let lib = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        debug!("Binding pdfium from PDFIUM_LIB_PATH: {}", lib.display());
        return Pdfium::bind_to_library(&lib)
            .map(Pdfium::new)
            .map_err(|e| Srs2TestError::PdfiumBindingFailed(format!("{}: {}", lib.display(), e)));
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| Srs2TestError::PdfiumBindingFailed(e.to_string()))
}

/// Extract the text of the selected pages of `pdf_path`.
///
/// A selection that names no page inside the document fails with
/// `PageOutOfRange`; pages with only whitespace are skipped.
pub fn extract_text(
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
) -> Result<ExtractedText, Srs2TestError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password, &e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let indices = selection.to_indices(total_pages);
    if indices.is_empty() {
        return Err(Srs2TestError::PageOutOfRange {
            page: first_requested_page(selection),
            total: total_pages,
        });
    }

    let mut out = Vec::with_capacity(indices.len());
    for &idx in &indices {
        let page = pages
            .get(idx as u16)
            .map_err(|e| Srs2TestError::ExtractionFailed {
                page: idx + 1,
                detail: e.to_string(),
            })?;

        let raw = page
            .text()
            .map_err(|e| Srs2TestError::ExtractionFailed {
                page: idx + 1,
                detail: e.to_string(),
            })?
            .all();

        let text = clean_extracted_text(&raw);
        if text.trim().is_empty() {
            warn!("Page {} has no text layer; skipping", idx + 1);
            continue;
        }
        debug!("Page {}: {} chars", idx + 1, text.chars().count());
        out.push((idx + 1, text));
    }

    if out.is_empty() {
        return Err(Srs2TestError::NoExtractableText {
            path: pdf_path.to_path_buf(),
        });
    }

    Ok(ExtractedText {
        source: pdf_path.to_path_buf(),
        total_pages,
        selected_pages: indices.len(),
        pages: out,
    })
}

fn classify_load_error(path: &Path, password: Option<&str>, e: &PdfiumError) -> Srs2TestError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if password.is_some() {
            Srs2TestError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Srs2TestError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Srs2TestError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

fn first_requested_page(selection: &PageSelection) -> usize {
    match selection {
        PageSelection::All => 1,
        PageSelection::Single(p) => *p,
        PageSelection::Range(start, _) => *start,
        PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_uses_single_newline() {
        let text = ExtractedText {
            source: PathBuf::from("srs.pdf"),
            total_pages: 3,
            selected_pages: 3,
            pages: vec![(1, "2 Provisioning".into()), (3, "2.1 Register SP".into())],
        };
        assert_eq!(text.joined(), "2 Provisioning\n2.1 Register SP");
    }

    #[test]
    fn first_requested_page_per_selection() {
        assert_eq!(first_requested_page(&PageSelection::All), 1);
        assert_eq!(first_requested_page(&PageSelection::Single(9)), 9);
        assert_eq!(first_requested_page(&PageSelection::Range(4, 8)), 4);
        assert_eq!(first_requested_page(&PageSelection::Set(vec![12, 10])), 10);
    }
}
