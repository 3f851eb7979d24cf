//! Section splitting: one output file per top-level requirements section.
//!
//! Large SRS documents produce JSON that is too big to send to a model in a
//! single prompt. Splitting the top-level array lets each section be paired
//! with its own UI captures. The projection is pure: sections are written
//! exactly as they were parsed, nested content included.

use crate::error::Srs2TestError;
use crate::merge::to_pretty_json;
use crate::pipeline::postprocess::strip_code_fences;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Placeholder used when a section has no `Section_ID`.
pub const MISSING_SECTION_ID: &str = "N/A";
/// Placeholder used when a section has no `Section_Name`.
pub const MISSING_SECTION_NAME: &str = "Unnamed";

/// Characters that cannot appear in a file name on at least one platform.
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Project sections onto output file names.
///
/// Two sections that normalise to the same name collide; the later one wins
/// and a warning is logged. No disambiguation is attempted.
pub fn split_sections(sections: &[Map<String, Value>]) -> BTreeMap<String, Map<String, Value>> {
    let mut out = BTreeMap::new();
    for section in sections {
        let name = section_file_name(section);
        if out.insert(name.clone(), section.clone()).is_some() {
            warn!("Two sections map to '{}'; keeping the later one", name);
        }
    }
    out
}

/// `{Section_ID}-{Section_Name}.json`, normalised to a safe file name.
pub fn section_file_name(section: &Map<String, Value>) -> String {
    let id = scalar_text(section.get("Section_ID")).unwrap_or_else(|| MISSING_SECTION_ID.to_string());
    let name =
        scalar_text(section.get("Section_Name")).unwrap_or_else(|| MISSING_SECTION_NAME.to_string());
    format!("{}-{}.json", normalise_component(&id), normalise_component(&name))
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalise_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || UNSAFE_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Parse a requirements document: a JSON array of section objects.
///
/// Markdown code fences around the array are tolerated, since that is how
/// model responses usually arrive. Array entries that are not objects are
/// skipped with a warning.
pub fn parse_sections(json: &str, context: &str) -> Result<Vec<Map<String, Value>>, Srs2TestError> {
    let value: Value =
        serde_json::from_str(strip_code_fences(json)).map_err(|e| Srs2TestError::InvalidJson {
            context: context.to_string(),
            source: e,
        })?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(Srs2TestError::NotASectionList {
                context: context.to_string(),
                found: json_kind(&other),
            })
        }
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match entry {
            Value::Object(map) => Some(map),
            other => {
                warn!(
                    "Skipping section #{} in {}: expected an object, found {}",
                    idx,
                    context,
                    json_kind(&other)
                );
                None
            }
        })
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Default output directory for a requirements file: `<stem>_sections` beside it.
pub fn default_sections_dir(json_path: &Path) -> PathBuf {
    let stem = json_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "srs".to_string());
    json_path.with_file_name(format!("{stem}_sections"))
}

/// Write split sections into `out_dir`, creating it if needed.
///
/// Returns the written paths in file-name order.
pub fn write_sections(
    sections: &BTreeMap<String, Map<String, Value>>,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, Srs2TestError> {
    std::fs::create_dir_all(out_dir).map_err(|e| Srs2TestError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::with_capacity(sections.len());
    for (name, section) in sections {
        let path = out_dir.join(name);
        let body = to_pretty_json(section)?;
        std::fs::write(&path, body).map_err(|e| Srs2TestError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
        info!("Created {}", path.display());
        written.push(path);
    }

    info!("Split {} sections into {}", written.len(), out_dir.display());
    Ok(written)
}

/// Split a requirements JSON file on disk.
///
/// `out_dir` defaults to [`default_sections_dir`].
pub fn split_file(json_path: &Path, out_dir: Option<&Path>) -> Result<Vec<PathBuf>, Srs2TestError> {
    let content = std::fs::read_to_string(json_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Srs2TestError::FileNotFound {
                path: json_path.to_path_buf(),
            }
        } else {
            Srs2TestError::ReadFailed {
                path: json_path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let sections = parse_sections(&content, &json_path.display().to_string())?;
    let dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_sections_dir(json_path));
    write_sections(&split_sections(&sections), &dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sections(value: Value) -> Vec<Map<String, Value>> {
        parse_sections(&value.to_string(), "test").unwrap()
    }

    #[test]
    fn two_sections_two_outputs() {
        let input = sections(json!([
            {"Section_ID": "1", "Section_Name": "Intro", "Sub_Sections": []},
            {"Section_ID": "2", "Section_Name": "Core Flows", "Sub_Sections": [
                {"Sub_Section_ID": "2.1", "Requirements": [{"REQ_ID": "R-1", "Description": "x"}]}
            ]}
        ]));

        let out = split_sections(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out["1-Intro.json"], input[0]);
        assert_eq!(out["2-Core_Flows.json"], input[1]);
    }

    #[test]
    fn placeholders_for_missing_keys() {
        let input = sections(json!([{"Sub_Sections": []}]));
        let out = split_sections(&input);
        assert!(out.contains_key("N_A-Unnamed.json"), "{:?}", out.keys());
    }

    #[test]
    fn numeric_id_and_unsafe_characters() {
        let section = json!({"Section_ID": 3, "Section_Name": "Search / Edit: SPs?"});
        let name = section_file_name(section.as_object().unwrap());
        assert_eq!(name, "3-Search___Edit__SPs_.json");
    }

    #[test]
    fn later_section_wins_on_collision() {
        let input = sections(json!([
            {"Section_ID": "1", "Section_Name": "A B", "v": 1},
            {"Section_ID": "1", "Section_Name": "A_B", "v": 2}
        ]));
        let out = split_sections(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out["1-A_B.json"]["v"], 2);
    }

    #[test]
    fn parse_tolerates_fences_and_skips_non_objects() {
        let text = "```json\n[{\"Section_ID\": \"1\"}, 7, \"x\"]\n```";
        let parsed = parse_sections(text, "response").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = parse_sections(r#"{"Section_ID": "1"}"#, "srs.json").unwrap_err();
        assert!(
            matches!(err, Srs2TestError::NotASectionList { found: "object", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_sections("[{", "srs.json").unwrap_err();
        assert!(matches!(err, Srs2TestError::InvalidJson { .. }), "got: {err:?}");
    }

    #[test]
    fn default_dir_sits_beside_input() {
        assert_eq!(
            default_sections_dir(Path::new("/data/srs_v2.json")),
            PathBuf::from("/data/srs_v2_sections")
        );
    }

    #[test]
    fn split_file_writes_sections_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let srs = dir.path().join("srs.json");
        let doc = json!([
            {"Section_ID": "1", "Section_Name": "Intro", "Sub_Sections": []},
            {"Section_ID": "2", "Section_Name": "Core Flows", "Sub_Sections": [{"Sub_Section_ID": "2.1"}]}
        ]);
        std::fs::write(&srs, doc.to_string()).unwrap();

        let written = split_file(&srs, None).unwrap();
        assert_eq!(written.len(), 2);

        let core = dir.path().join("srs_sections").join("2-Core_Flows.json");
        let back: Value = serde_json::from_str(&std::fs::read_to_string(core).unwrap()).unwrap();
        assert_eq!(back, doc[1]);
    }

    #[test]
    fn split_file_reports_missing_input() {
        let err = split_file(Path::new("/definitely/not/here.json"), None).unwrap_err();
        assert!(matches!(err, Srs2TestError::FileNotFound { .. }), "got: {err:?}");
    }
}
