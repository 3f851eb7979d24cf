//! Prompt assembly: literal substitution of named placeholders.
//!
//! Templates use `{name}` placeholders and `{{` / `}}` for literal braces,
//! so example JSON inside a prompt is written with doubled braces. Values
//! are inserted as-is and never re-scanned; a Java exemplar full of braces
//! cannot inject a placeholder.

use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static RE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Fill `template` with `values`.
///
/// Fails on the first placeholder that has no value. Extra values are ignored.
pub fn assemble(template: &str, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + values.values().map(String::len).sum::<usize>());
    let mut last = 0;

    for caps in RE_TOKEN.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&replacement(&caps, values)?);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn replacement<'a>(
    caps: &Captures<'_>,
    values: &'a HashMap<&str, String>,
) -> Result<std::borrow::Cow<'a, str>, TemplateError> {
    match caps.get(1) {
        Some(name) => values
            .get(name.as_str())
            .map(|v| std::borrow::Cow::Borrowed(v.as_str()))
            .ok_or_else(|| TemplateError::MissingValue {
                name: name.as_str().to_string(),
            }),
        None if &caps[0] == "{{" => Ok("{".into()),
        None => Ok("}".into()),
    }
}

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in RE_TOKEN.captures_iter(template) {
        if let Some(name) = caps.get(1) {
            if !names.iter().any(|n| n == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}
