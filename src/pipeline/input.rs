//! Input resolution: normalise a user-supplied path or URL to a local PDF.
//!
//! pdfium opens documents by path, so a URL input is downloaded into a
//! `TempDir` first. The directory is removed when `ResolvedInput` is
//! dropped. The `%PDF` magic bytes are checked before returning so a stray
//! HTML error page surfaces as `NotAPdf` instead of a pdfium parse failure.

use crate::error::Srs2TestError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
///
/// HTTP(S) URLs are downloaded with `timeout_secs` as the whole-request
/// timeout; anything else is treated as a local path.
pub fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Srs2TestError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Srs2TestError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs)
    } else if input.contains("://") {
        Err(Srs2TestError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Srs2TestError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Srs2TestError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
                return Err(Srs2TestError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Srs2TestError::PermissionDenied { path });
        }
        Err(e) => {
            return Err(Srs2TestError::ReadFailed { path, source: e });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Srs2TestError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| Srs2TestError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            Srs2TestError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().map_err(classify)?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let bytes = response.bytes().map_err(classify)?;

    let temp_dir = TempDir::new().map_err(|e| Srs2TestError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(Srs2TestError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    std::fs::write(&file_path, &bytes)
        .map_err(|e| Srs2TestError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// File stem used to name outputs derived from `input`.
///
/// For URLs this is the stem of the last path segment.
pub fn input_stem(input: &str) -> String {
    let name = if is_url(input) {
        filename_from_url(input)
    } else {
        input.to_string()
    };
    Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "srs".to_string())
}
