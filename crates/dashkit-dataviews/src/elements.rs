//! Enumerated option lists
//!
//! A field may restrict its values to an explicit list of `{ value, label }`
//! elements. Elements then act both as an allow-list for validation and as
//! the display labels for rendering.

use crate::coerce::{same_value_zero, to_display_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One allowed value of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// The stored value
    pub value: Value,
    /// Human-readable label
    pub label: String,
    /// Optional longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Element {
    /// Create an element
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Whether `value` is one of the element values
pub fn contains(elements: &[Element], value: Option<&Value>) -> bool {
    elements
        .iter()
        .any(|element| same_value_zero(Some(&element.value), value))
}

/// Whether the number `n` is one of the element values
///
/// Only numeric element values can match.
pub fn contains_number(elements: &[Element], n: f64) -> bool {
    elements.iter().any(|element| {
        element
            .value
            .as_f64()
            .is_some_and(|candidate| candidate == n || (candidate.is_nan() && n.is_nan()))
    })
}

/// The element whose value equals `value`
pub fn find<'a>(elements: &'a [Element], value: Option<&Value>) -> Option<&'a Element> {
    elements
        .iter()
        .find(|element| same_value_zero(Some(&element.value), value))
}

/// Render a value through its element label, falling back to the value itself
pub fn render_from_elements(elements: &[Element], value: Option<&Value>) -> Option<String> {
    match find(elements, value) {
        Some(element) if !element.label.is_empty() => Some(element.label.clone()),
        _ => render_value(value),
    }
}

/// Display text of a bare value; absent, null and boolean values show nothing
pub(crate) fn render_value(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(_)) => None,
        other => Some(to_display_string(other)),
    }
}
