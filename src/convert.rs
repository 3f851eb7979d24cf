//! PDF conversion entry points.
//!
//! A conversion is a single round trip: the text of the selected pages goes
//! into the parser prompt, the prompt goes to the model once, and the answer
//! is written to disk exactly as it came back. Nothing is written when
//! extraction or the model call fails.

use crate::config::GeneratorConfig;
use crate::error::Srs2TestError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::extract::{self, ExtractedText};
use crate::pipeline::{input, llm};
use crate::prompts::SRS_PARSER_PROMPT;
use crate::sections;
use crate::template;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert an SRS PDF (file path or HTTP/HTTPS URL) to structured JSON.
///
/// The JSON lands at `config.output`, or `<input stem>.json` beside a local
/// input (in the working directory for URLs). With `config.split_sections`
/// the response is also split into `<output stem>_sections/`.
///
/// # Errors
/// - File not found, download failure, not a PDF
/// - pdfium binding, password and corrupt-file errors
/// - `NoExtractableText` when every selected page is blank
/// - provider configuration, API and timeout errors
/// - `EmptyModelResponse`
/// - `InvalidJson` / `NotASectionList` when splitting an unparseable response
///   (the JSON file itself has already been written at that point)
pub fn convert(
    input_str: impl AsRef<str>,
    config: &GeneratorConfig,
) -> Result<ConversionOutput, Srs2TestError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs)?;
    let output_path = config
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input_str));

    // ── Step 2: Extract text ─────────────────────────────────────────────
    let extraction_start = Instant::now();
    let mut extracted =
        extract::extract_text(resolved.path(), config.password.as_deref(), &config.pages)?;
    extracted.source = PathBuf::from(input_str);
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
    info!(
        "Extracted text from {}/{} pages in {}ms",
        extracted.pages.len(),
        extracted.total_pages,
        extraction_duration_ms
    );

    let mut output = convert_extracted(&extracted, &output_path, config)?;
    output.stats.extraction_duration_ms = extraction_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Run the model half of a conversion on text that was already extracted.
///
/// Writes the response to `output_path` and, when requested, the section
/// files. Extraction timings in the returned stats are left at zero.
pub fn convert_extracted(
    extracted: &ExtractedText,
    output_path: &Path,
    config: &GeneratorConfig,
) -> Result<ConversionOutput, Srs2TestError> {
    let total_start = Instant::now();
    let cb = config.progress_callback.as_ref();

    let context = extracted.joined();
    if context.trim().is_empty() {
        return Err(Srs2TestError::NoExtractableText {
            path: extracted.source.clone(),
        });
    }
    if let Some(cb) = cb {
        cb.on_extraction_start(extracted.total_pages, extracted.selected_pages);
        cb.on_extraction_complete(extracted.pages.len(), context.chars().count());
    }

    // ── Step 3: Fill the parser prompt ───────────────────────────────────
    let instruction = parser_instruction(config, context.clone())?;
    debug!("Parser prompt: {} bytes", instruction.len());

    // ── Step 4: One completion request ───────────────────────────────────
    let backend = llm::resolve_backend(config)?;
    if let Some(cb) = cb {
        cb.on_model_request(backend.model(), instruction.len());
    }

    let llm_start = Instant::now();
    let completion = backend.complete(&instruction).inspect_err(|e| {
        if let Some(cb) = cb {
            cb.on_model_error(&e.to_string());
        }
    })?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    if let Some(cb) = cb {
        cb.on_model_response(completion.content.len());
    }
    if completion.content.trim().is_empty() {
        return Err(Srs2TestError::EmptyModelResponse);
    }
    info!(
        "Model answered in {}ms ({} in / {} out tokens)",
        llm_duration_ms, completion.input_tokens, completion.output_tokens
    );

    // ── Step 5: Write the response verbatim ──────────────────────────────
    write_atomic(output_path, &completion.content)?;
    info!("SRS JSON saved to {}", output_path.display());

    // ── Step 6: Optional split ───────────────────────────────────────────
    let mut section_paths = Vec::new();
    if config.split_sections {
        let parsed = sections::parse_sections(&completion.content, "model response")?;
        let dir = sections::default_sections_dir(output_path);
        section_paths = sections::write_sections(&sections::split_sections(&parsed), &dir)?;
        if let Some(cb) = cb {
            for path in &section_paths {
                if let Some(name) = path.file_name() {
                    cb.on_section_written(&name.to_string_lossy());
                }
            }
        }
    }

    if let Some(cb) = cb {
        cb.on_conversion_complete(completion.content.len());
    }

    Ok(ConversionOutput {
        json_path: output_path.to_path_buf(),
        sections: section_paths,
        stats: ConversionStats {
            total_pages: extracted.total_pages,
            extracted_pages: extracted.pages.len(),
            extracted_chars: context.chars().count(),
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
            extraction_duration_ms: 0,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    })
}

/// The parser prompt with `{context}` filled in.
///
/// Uses `config.parser_prompt` when set.
pub fn parser_instruction(config: &GeneratorConfig, context: String) -> Result<String, Srs2TestError> {
    let template = config.parser_prompt.as_deref().unwrap_or(SRS_PARSER_PROMPT);
    let values = HashMap::from([("context", context)]);
    Ok(template::assemble(template, &values)?)
}

/// `<input stem>.json`, beside a local input or in the working directory for URLs.
pub fn default_output_path(input_str: &str) -> PathBuf {
    let file_name = format!("{}.json", input::input_stem(input_str));
    if input::is_url(input_str) {
        PathBuf::from(file_name)
    } else {
        Path::new(input_str).with_file_name(file_name)
    }
}

/// Write `content` to `path` through a temp file in the same directory and a rename.
///
/// A crash mid-write leaves the previous file (or nothing) in place, never a
/// truncated one. Parent directories are created.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), Srs2TestError> {
    let write_err = |e: std::io::Error| Srs2TestError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
