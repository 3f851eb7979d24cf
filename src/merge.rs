//! Component merging: reconcile several page-state snapshots into one document.
//!
//! A page is usually captured more than once — the empty form, the form after
//! a failed submit, and so on. Elements such as validation messages exist in
//! only some of those captures. Merging keys every component by its selector
//! and folds the snapshots together so the downstream prompt sees a single
//! description that still records which elements are conditional.
//!
//! ## Rules
//!
//! | Part | Rule |
//! |------|------|
//! | `pageUrl` | first non-empty value in input order |
//! | component order | first sighting of each distinct selector |
//! | `actions`, `fields` | exact-match set union, first-seen order |
//! | `error_messages` | trimmed text of `error`-class sightings, no duplicates |
//! | `conditional` | set once an `error`-class sighting has text; never cleared |
//! | everything else | kept from the first sighting |
//!
//! Components with no selector are ignored completely.

use crate::error::Srs2TestError;
use crate::ui::{Component, Descriptor, UiDocument};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Merge UI documents into a single document keyed by selector.
///
/// Total over its input: malformed or selector-less components are skipped,
/// never reported. The result depends only on the documents and their order.
pub fn merge_ui_documents<'a, I>(documents: I) -> UiDocument
where
    I: IntoIterator<Item = &'a UiDocument>,
{
    let mut page_url = String::new();
    let mut merged: Vec<Component> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for document in documents {
        if page_url.is_empty() && !document.page_url.is_empty() {
            page_url = document.page_url.clone();
        }

        for component in &document.components {
            let Some(selector) = component.key() else {
                debug!("Skipping component without selector");
                continue;
            };

            match index.get(selector) {
                Some(&pos) => absorb(&mut merged[pos], component),
                None => {
                    index.insert(selector.to_string(), merged.len());
                    merged.push(first_sighting(component));
                }
            }
        }
    }

    debug!("Merged into {} distinct components", merged.len());
    UiDocument {
        page_url,
        components: merged,
    }
}

/// Copy a component on its first sighting, normalised so that merging the
/// same snapshot again changes nothing.
fn first_sighting(component: &Component) -> Component {
    let mut entry = Component {
        actions: Vec::new(),
        fields: Vec::new(),
        error_messages: Vec::new(),
        ..component.clone()
    };
    union_into(&mut entry.actions, &component.actions);
    union_into(&mut entry.fields, &component.fields);
    for message in &component.error_messages {
        push_unique(&mut entry.error_messages, message);
    }
    absorb(&mut entry, component);
    entry
}

/// Fold a later sighting of the same selector into the accumulated entry.
fn absorb(existing: &mut Component, incoming: &Component) {
    union_into(&mut existing.actions, &incoming.actions);
    union_into(&mut existing.fields, &incoming.fields);

    if let Some(text) = incoming.error_text() {
        push_unique(&mut existing.error_messages, text);
        existing.conditional = true;
    }
}

fn union_into(target: &mut Vec<Descriptor>, incoming: &[Descriptor]) {
    for descriptor in incoming {
        if !target.contains(descriptor) {
            target.push(descriptor.clone());
        }
    }
}

fn push_unique(target: &mut Vec<String>, message: &str) {
    if !target.iter().any(|m| m == message) {
        target.push(message.to_string());
    }
}

/// Read UI documents from disk in the given order.
///
/// A missing file is logged and contributes an empty document, so one absent
/// snapshot does not block prompt generation. Malformed JSON is fatal.
pub fn load_ui_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<UiDocument>, Srs2TestError> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("UI structure file not found at {}; skipping it", path.display());
                documents.push(UiDocument::default());
                continue;
            }
            Err(e) => {
                return Err(Srs2TestError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let document = UiDocument::from_json(&content).map_err(|e| Srs2TestError::InvalidJson {
            context: path.display().to_string(),
            source: e,
        })?;
        debug!(
            "Loaded {} components from {}",
            document.components.len(),
            path.display()
        );
        documents.push(document);
    }
    Ok(documents)
}

/// Load and merge UI structure files in one step.
pub fn merge_ui_files<P: AsRef<Path>>(paths: &[P]) -> Result<UiDocument, Srs2TestError> {
    let documents = load_ui_documents(paths)?;
    Ok(merge_ui_documents(&documents))
}

/// Serialise with four-space indentation, the layout embedded in prompts.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, Srs2TestError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Srs2TestError::Internal(format!("JSON serialisation failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| Srs2TestError::Internal(e.to_string()))
}
