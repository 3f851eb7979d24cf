//! Post-processing: deterministic cleanup of text moving in and out of the model.
//!
//! Two directions are handled here:
//!
//! - **Extracted PDF text** going into the parser prompt. pdfium returns
//!   text with CRLF line endings, zero-width characters from copy-protected
//!   documents, trailing spaces from justified layouts and long runs of
//!   blank lines where tables or images were. None of it carries meaning and
//!   all of it costs tokens.
//! - **Model responses** coming back. Even when told to produce "STRICT,
//!   VALID JSON only", models regularly wrap the array in a ```` ```json ````
//!   fence. The response file is written verbatim; the fence is stripped
//!   only when the response is parsed for splitting.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean text extracted from a PDF before it goes into a prompt.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Trim leading and trailing blank lines
pub fn clean_extracted_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim_matches('\n').to_string()
}

// ── Model responses ──────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n[ \t]*```$").unwrap());

/// Return the content inside one outer markdown code fence, or the trimmed
/// input when there is none.
///
/// Only a fence that encloses the whole response is removed; fences in the
/// middle of prose are left alone.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ──────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}' // zero-width space
                    | '\u{200C}' // zero-width non-joiner
                    | '\u{200D}' // zero-width joiner
                    | '\u{2060}' // word joiner
                    | '\u{FEFF}' // BOM
                    | '\u{00AD}' // soft hyphen
            )
        })
        .collect()
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────

static RE_MANY_BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_MANY_BLANKS.replace_all(input, "\n\n\n").to_string()
}
