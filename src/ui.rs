//! UI-structure documents: the per-page description of interactive elements.
//!
//! These documents are produced by an external page-extraction step, one per
//! page state (empty form, validation errors shown, ...). They are read
//! leniently: `null` reads as a missing key, a component whose known keys
//! have the wrong shape is skipped with a warning instead of failing the
//! whole document, and keys this crate
//! does not know about (`id`, `name`, `label`, `tag`, ...) are carried through
//! untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// The class token that marks a component as a validation-error element.
pub const ERROR_CLASS: &str = "error";

/// One page's UI structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiDocument {
    /// URL of the captured page. `null` and missing both read as empty.
    #[serde(rename = "pageUrl", default, deserialize_with = "null_as_empty")]
    pub page_url: String,

    /// Components in capture order.
    #[serde(default, deserialize_with = "lenient_components")]
    pub components: Vec<Component>,
}

impl UiDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A single interactive element, identified by its selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Identity key. Components without one cannot be merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub classes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub actions: Vec<Descriptor>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub fields: Vec<Descriptor>,

    /// Always written, even when empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_messages: Vec<String>,

    /// Only present under some application states (typically validation errors).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub conditional: bool,

    /// Every other key, in source order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component {
    /// The selector, if present and non-empty.
    pub fn key(&self) -> Option<&str> {
        self.selector.as_deref().filter(|s| !s.is_empty())
    }

    /// Trimmed text when this component is an error element with something to say.
    pub fn error_text(&self) -> Option<&str> {
        if !self.classes.iter().any(|c| c == ERROR_CLASS) {
            return None;
        }
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// An action or field descriptor: a flat key/value mapping.
///
/// Keys are held sorted, so two descriptors compare equal exactly when every
/// key/value pair matches, regardless of the order they were written in.
/// Values compare by JSON type as well as content (`1` and `"1"` differ).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(pub BTreeMap<String, Value>);

impl Descriptor {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Descriptor {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Descriptor(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    null_as_default(deserializer)
}

/// `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn lenient_components<'de, D>(deserializer: D) -> Result<Vec<Component>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<Component>(value) {
            Ok(component) => Some(component),
            Err(e) => {
                warn!("Skipping malformed component #{}: {}", idx, e);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_minimal_document() {
        let doc = UiDocument::from_json(r##"{"pageUrl":"/sp","components":[{"selector":"#name"}]}"##)
            .unwrap();
        assert_eq!(doc.page_url, "/sp");
        assert_eq!(doc.components.len(), 1);
        assert_eq!(doc.components[0].key(), Some("#name"));
        assert!(doc.components[0].actions.is_empty());
        assert!(!doc.components[0].conditional);
    }

    #[test]
    fn null_page_url_is_empty() {
        let doc = UiDocument::from_json(r#"{"pageUrl":null,"components":null}"#).unwrap();
        assert_eq!(doc.page_url, "");
        assert!(doc.components.is_empty());
    }

    #[test]
    fn malformed_component_is_skipped() {
        let doc = UiDocument::from_json(
            r##"{"components":[{"selector":"#a"}, 42, {"selector":"#b","actions":"click"}, {"selector":"#c"}]}"##,
        )
        .unwrap();
        let keys: Vec<_> = doc.components.iter().filter_map(Component::key).collect();
        assert_eq!(keys, vec!["#a", "#c"]);
    }

    #[test]
    fn null_lists_and_flags_read_as_empty() {
        let doc = UiDocument::from_json(
            r##"{"components":[
                {"selector":"#name","classes":null,"fields":null,"error_messages":null},
                {"selector":"#btn","actions":null},
                {"selector":"#x","conditional":null}
            ]}"##,
        )
        .unwrap();
        let keys: Vec<_> = doc.components.iter().filter_map(Component::key).collect();
        assert_eq!(keys, vec!["#name", "#btn", "#x"]);
        assert!(doc.components[0].classes.is_empty());
        assert!(doc.components[1].actions.is_empty());
        assert!(!doc.components[2].conditional);
    }

    #[test]
    fn serialised_component_keeps_source_shape() {
        let doc = UiDocument::from_json(r##"{"pageUrl":"/x","components":[{"selector":"#a","tag":"a"}]}"##)
            .unwrap();
        let value = serde_json::to_value(&doc.components[0]).unwrap();
        assert_eq!(value, json!({"selector": "#a", "error_messages": [], "tag": "a"}));
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let doc = UiDocument::from_json(
            r##"{"pageUrl":"/x","components":[{"selector":"#a","tag":"input","label":"Name"}]}"##,
        )
        .unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["components"][0]["tag"], "input");
        assert_eq!(value["components"][0]["label"], "Name");
    }

    #[test]
    fn empty_selector_has_no_key() {
        let c = Component {
            selector: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(c.key(), None);
    }

    #[test]
    fn descriptor_equality_ignores_key_order() {
        let a: Descriptor = serde_json::from_value(json!({"type": "fill", "value": "x"})).unwrap();
        let b: Descriptor = serde_json::from_value(json!({"value": "x", "type": "fill"})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn descriptor_equality_is_type_sensitive() {
        let a: Descriptor = [("max", json!(50))].into_iter().collect();
        let b: Descriptor = [("max", json!("50"))].into_iter().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn error_text_requires_error_class_and_text() {
        let mut c = Component {
            selector: Some("#err".into()),
            classes: vec!["field".into(), "error".into()],
            text: Some("  Name required  ".into()),
            ..Default::default()
        };
        assert_eq!(c.error_text(), Some("Name required"));

        c.text = Some("   ".into());
        assert_eq!(c.error_text(), None);

        c.text = Some("Name required".into());
        c.classes = vec!["error-message".into()];
        assert_eq!(c.error_text(), None, "only the literal token counts");
    }
}
