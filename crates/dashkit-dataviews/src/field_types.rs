//! Field type definitions
//!
//! Every field type maps to a static [`FieldTypeDefinition`]: how values of
//! that type sort, which values are valid, which edit control they use and
//! how they render. Fields without a type, or with a type tag this crate does
//! not know, use the generic definition.

use crate::coerce::{
    compare_numbers, is_integer, is_truthy, locale_compare, to_display_string, to_number,
    to_timestamp_ms,
};
use crate::elements::{self, Element};
use crate::operators::Operator;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Field type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Text,
    Datetime,
    Boolean,
    Email,
}

impl FieldType {
    /// Parse a type tag; unknown tags yield `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "integer" => Some(FieldType::Integer),
            "text" => Some(FieldType::Text),
            "datetime" => Some(FieldType::Datetime),
            "boolean" => Some(FieldType::Boolean),
            "email" => Some(FieldType::Email),
            _ => None,
        }
    }

    /// The type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Text => "text",
            FieldType::Datetime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Email => "email",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Which input control edits a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditControl {
    Text,
    Integer,
    Datetime,
    Checkbox,
    Email,
    Select,
    Radio,
}

/// Extra information available while validating a value
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// Allow-list of values, when the field is enumerated
    pub elements: Option<&'a [Element]>,
}

impl<'a> ValidationContext<'a> {
    /// Context restricting values to the given elements
    pub fn with_elements(elements: &'a [Element]) -> Self {
        Self {
            elements: Some(elements),
        }
    }
}

/// Compare two values
pub type SortValues = fn(Option<&Value>, Option<&Value>, SortDirection) -> Ordering;
/// Decide whether a value is acceptable
pub type ValidateValue = fn(Option<&Value>, &ValidationContext<'_>) -> bool;
/// Produce display text for a value
pub type RenderValue = fn(Option<&Value>, Option<&[Element]>) -> Option<String>;

/// Behavior bundle of a field type
pub struct FieldTypeDefinition {
    /// The type this definition belongs to; `None` for the generic definition
    pub field_type: Option<FieldType>,
    pub sort: SortValues,
    pub is_valid: ValidateValue,
    /// Preferred edit control, if the type has one
    pub edit: Option<EditControl>,
    pub render: RenderValue,
    /// Whether fields of this type sort by default (`None` leaves it to the field)
    pub enable_sorting: Option<bool>,
    /// Operators offered when a field declares none (`None` for the global default)
    pub filter_operators: Option<&'static [Operator]>,
}

impl fmt::Debug for FieldTypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTypeDefinition")
            .field("field_type", &self.field_type)
            .field("edit", &self.edit)
            .field("enable_sorting", &self.enable_sorting)
            .field("filter_operators", &self.filter_operators)
            .finish_non_exhaustive()
    }
}

/// Look up the behavior bundle for a field type
///
/// Total: `None` selects the generic definition.
pub fn get_field_type_definition(field_type: Option<FieldType>) -> &'static FieldTypeDefinition {
    match field_type {
        Some(FieldType::Integer) => &INTEGER,
        Some(FieldType::Text) => &TEXT,
        Some(FieldType::Datetime) => &DATETIME,
        Some(FieldType::Boolean) => &BOOLEAN,
        Some(FieldType::Email) => &EMAIL,
        None => &GENERIC,
    }
}

const SINGLE_VALUE_OPERATORS: &[Operator] = &[Operator::Is, Operator::IsNot];
const MULTI_VALUE_OPERATORS: &[Operator] = &[Operator::IsAny, Operator::IsNone];

static INTEGER: FieldTypeDefinition = FieldTypeDefinition {
    field_type: Some(FieldType::Integer),
    sort: sort_integer,
    is_valid: is_valid_integer,
    edit: Some(EditControl::Integer),
    render: render_default,
    enable_sorting: Some(true),
    filter_operators: None,
};

static TEXT: FieldTypeDefinition = FieldTypeDefinition {
    field_type: Some(FieldType::Text),
    sort: sort_text,
    is_valid: is_valid_in_elements,
    edit: Some(EditControl::Text),
    render: render_default,
    enable_sorting: Some(true),
    filter_operators: None,
};

static DATETIME: FieldTypeDefinition = FieldTypeDefinition {
    field_type: Some(FieldType::Datetime),
    sort: sort_datetime,
    is_valid: is_valid_in_elements,
    edit: Some(EditControl::Datetime),
    render: render_default,
    enable_sorting: Some(true),
    filter_operators: Some(SINGLE_VALUE_OPERATORS),
};

static BOOLEAN: FieldTypeDefinition = FieldTypeDefinition {
    field_type: Some(FieldType::Boolean),
    sort: sort_boolean,
    is_valid: is_valid_boolean,
    edit: Some(EditControl::Checkbox),
    render: render_boolean,
    enable_sorting: Some(true),
    filter_operators: None,
};

static EMAIL: FieldTypeDefinition = FieldTypeDefinition {
    field_type: Some(FieldType::Email),
    sort: sort_text,
    is_valid: is_valid_email,
    edit: Some(EditControl::Email),
    render: render_default,
    enable_sorting: Some(true),
    filter_operators: Some(MULTI_VALUE_OPERATORS),
};

static GENERIC: FieldTypeDefinition = FieldTypeDefinition {
    field_type: None,
    sort: sort_generic,
    is_valid: is_valid_in_elements,
    edit: None,
    render: render_default,
    enable_sorting: Some(true),
    filter_operators: None,
};

// WHATWG "valid e-mail address"
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("e-mail pattern is a valid regex")
});

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn sort_integer(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    compare_numbers(to_number(a), to_number(b), direction == SortDirection::Desc)
}

fn sort_text(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let (a, b) = (to_display_string(a), to_display_string(b));
    directed(locale_compare(&a, &b), direction)
}

// Unparseable dates sort last
fn sort_datetime(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    compare_numbers(
        to_timestamp_ms(a),
        to_timestamp_ms(b),
        direction == SortDirection::Desc,
    )
}

fn sort_boolean(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let (a, b) = (is_truthy(a), is_truthy(b));
    if a == b {
        return Ordering::Equal;
    }

    match (direction, a) {
        // false first
        (SortDirection::Asc, true) => Ordering::Greater,
        (SortDirection::Asc, false) => Ordering::Less,
        // true first
        (SortDirection::Desc, true) => Ordering::Less,
        (SortDirection::Desc, false) => Ordering::Greater,
    }
}

/// JSON numbers come before every other value and compare numerically; the
/// rest compare as text. Direction reverses the whole order.
fn sort_generic(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(
            x.as_f64().unwrap_or(f64::NAN),
            y.as_f64().unwrap_or(f64::NAN),
            false,
        ),
        (Some(Value::Number(_)), _) => Ordering::Less,
        (_, Some(Value::Number(_))) => Ordering::Greater,
        _ => locale_compare(&to_display_string(a), &to_display_string(b)),
    };
    directed(ordering, direction)
}

fn is_valid_integer(value: Option<&Value>, context: &ValidationContext<'_>) -> bool {
    // Integer fields are implicitly required
    if matches!(value, Some(Value::String(s)) if s.is_empty()) {
        return false;
    }

    let number = to_number(value);
    if !is_integer(number) {
        return false;
    }

    context
        .elements
        .is_none_or(|allowed| elements::contains_number(allowed, number))
}

fn is_valid_in_elements(value: Option<&Value>, context: &ValidationContext<'_>) -> bool {
    context
        .elements
        .is_none_or(|allowed| elements::contains(allowed, value))
}

fn is_valid_boolean(value: Option<&Value>, _context: &ValidationContext<'_>) -> bool {
    matches!(value, None | Some(Value::Bool(_)))
}

fn is_valid_email(value: Option<&Value>, context: &ValidationContext<'_>) -> bool {
    if matches!(value, Some(Value::String(s)) if s.is_empty()) {
        return false;
    }

    let text = match value {
        None => "undefined".to_string(),
        other => to_display_string(other),
    };
    if !EMAIL_PATTERN.is_match(&text) {
        return false;
    }

    is_valid_in_elements(value, context)
}

fn render_default(value: Option<&Value>, elements: Option<&[Element]>) -> Option<String> {
    match elements {
        Some(elements) => elements::render_from_elements(elements, value),
        None => elements::render_value(value),
    }
}

fn render_boolean(value: Option<&Value>, elements: Option<&[Element]>) -> Option<String> {
    if let Some(elements) = elements {
        return elements::render_from_elements(elements, value);
    }

    match value {
        Some(Value::Bool(true)) => Some("True".to_string()),
        Some(Value::Bool(false)) => Some("False".to_string()),
        _ => None,
    }
}
