//! Fields and field normalization
//!
//! A [`Field`] is what a caller configures for one column: an id, maybe a
//! type, and any behavior it wants to override. [`normalize_fields`] turns
//! each one into a [`NormalizedField`] whose behavior slots are all
//! populated, so grid code never has to check for a missing sort, validator,
//! renderer or accessor.
//!
//! Defaults come from the field's [`FieldTypeDefinition`] and never replace
//! an explicit override. Normalizing a normalized field again (through
//! `Field::from`) yields the same behavior.

use crate::elements::Element;
use crate::field_types::{
    get_field_type_definition, EditControl, FieldType, FieldTypeDefinition, SortDirection,
    ValidationContext,
};
use crate::operators::{sanitize_operator_names, Operator, DEFAULT_OPERATORS};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Read a field value out of an item
pub type GetValueFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;
/// Compare two items by a field
pub type SortFn = Arc<dyn Fn(&Value, &Value, SortDirection) -> Ordering + Send + Sync>;
/// Validate an item's field value
pub type IsValidFn = Arc<dyn Fn(&Value, &ValidationContext<'_>) -> bool + Send + Sync>;
/// Render an item's field value
pub type RenderFn = Arc<dyn Fn(&Value, &NormalizedField) -> Option<String> + Send + Sync>;

/// Filtering configuration of a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBy {
    /// Operator names the field offers; unknown names are dropped later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<String>>,
    /// Show the filter even when it has no value
    #[serde(default)]
    pub is_primary: bool,
}

/// Caller-supplied configuration of one field
#[derive(Clone, Default)]
pub struct Field {
    pub id: String,
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    pub header: Option<String>,
    pub description: Option<String>,
    pub get_value: Option<GetValueFn>,
    pub sort: Option<SortFn>,
    pub is_valid: Option<IsValidFn>,
    pub render: Option<RenderFn>,
    pub edit: Option<EditControl>,
    pub elements: Option<Vec<Element>>,
    pub filter_by: Option<FilterBy>,
    pub enable_hiding: Option<bool>,
    pub enable_sorting: Option<bool>,
    pub enable_global_search: Option<bool>,
}

impl Field {
    /// Create a field reading the attribute at `id` (a dot path)
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_edit(mut self, edit: EditControl) -> Self {
        self.edit = Some(edit);
        self
    }

    /// Declare the filter operators this field offers
    pub fn with_operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_by.get_or_insert_with(FilterBy::default).operators =
            Some(operators.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_get_value<F>(mut self, get_value: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.get_value = Some(Arc::new(get_value));
        self
    }

    pub fn with_sort<F>(mut self, sort: F) -> Self
    where
        F: Fn(&Value, &Value, SortDirection) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Some(Arc::new(sort));
        self
    }

    pub fn with_is_valid<F>(mut self, is_valid: F) -> Self
    where
        F: Fn(&Value, &ValidationContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.is_valid = Some(Arc::new(is_valid));
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value, &NormalizedField) -> Option<String> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn with_enable_hiding(mut self, enable: bool) -> Self {
        self.enable_hiding = Some(enable);
        self
    }

    pub fn with_enable_sorting(mut self, enable: bool) -> Self {
        self.enable_sorting = Some(enable);
        self
    }

    pub fn with_enable_global_search(mut self, enable: bool) -> Self {
        self.enable_global_search = Some(enable);
        self
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("field_type", &self.field_type)
            .field("label", &self.label)
            .field("custom_get_value", &self.get_value.is_some())
            .field("custom_sort", &self.sort.is_some())
            .field("custom_is_valid", &self.is_valid.is_some())
            .field("custom_render", &self.render.is_some())
            .field("elements", &self.elements)
            .field("filter_by", &self.filter_by)
            .finish_non_exhaustive()
    }
}

/// A field with every behavior slot populated
#[derive(Clone)]
pub struct NormalizedField {
    pub id: String,
    pub field_type: Option<FieldType>,
    pub label: String,
    pub header: String,
    pub description: Option<String>,
    pub edit: Option<EditControl>,
    pub elements: Option<Vec<Element>>,
    pub filter_by: Option<FilterBy>,
    pub enable_hiding: bool,
    pub enable_sorting: bool,
    pub enable_global_search: bool,
    get_value: GetValueFn,
    sort: SortFn,
    is_valid: IsValidFn,
    render: RenderFn,
}

impl NormalizedField {
    /// The field's value on `item`; `None` when absent
    pub fn get_value(&self, item: &Value) -> Option<Value> {
        (self.get_value)(item)
    }

    /// Compare two items by this field
    pub fn sort(&self, a: &Value, b: &Value, direction: SortDirection) -> Ordering {
        (self.sort)(a, b, direction)
    }

    /// Validate the field's value on `item`
    pub fn is_valid(&self, item: &Value, context: &ValidationContext<'_>) -> bool {
        (self.is_valid)(item, context)
    }

    /// Validate against this field's own elements
    pub fn is_valid_item(&self, item: &Value) -> bool {
        let context = ValidationContext {
            elements: self.elements.as_deref(),
        };
        self.is_valid(item, &context)
    }

    /// Display text for the field's value on `item`
    pub fn render(&self, item: &Value) -> Option<String> {
        (self.render)(item, self)
    }

    /// The type definition backing this field's defaults
    pub fn definition(&self) -> &'static FieldTypeDefinition {
        get_field_type_definition(self.field_type)
    }

    /// Operators the filter builder may offer for this field
    pub fn operators(&self) -> Vec<Operator> {
        sanitize_operators(self)
    }
}

impl fmt::Debug for NormalizedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedField")
            .field("id", &self.id)
            .field("field_type", &self.field_type)
            .field("label", &self.label)
            .field("header", &self.header)
            .field("edit", &self.edit)
            .field("elements", &self.elements)
            .field("filter_by", &self.filter_by)
            .field("enable_hiding", &self.enable_hiding)
            .field("enable_sorting", &self.enable_sorting)
            .field("enable_global_search", &self.enable_global_search)
            .finish_non_exhaustive()
    }
}

impl From<NormalizedField> for Field {
    fn from(field: NormalizedField) -> Self {
        Self {
            id: field.id,
            field_type: field.field_type,
            label: Some(field.label),
            header: Some(field.header),
            description: field.description,
            get_value: Some(field.get_value),
            sort: Some(field.sort),
            is_valid: Some(field.is_valid),
            render: Some(field.render),
            edit: field.edit,
            elements: field.elements,
            filter_by: field.filter_by,
            enable_hiding: Some(field.enable_hiding),
            enable_sorting: Some(field.enable_sorting),
            enable_global_search: Some(field.enable_global_search),
        }
    }
}

/// Read the attribute at a dot path such as `author.name`
///
/// Objects are indexed by key and arrays by position. Any missing segment
/// yields `None`.
pub fn get_value_from_id(id: &str, item: &Value) -> Option<Value> {
    id.split('.')
        .try_fold(item, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .cloned()
}

/// The edit control for a field
///
/// An explicit control wins; enumerated fields get a select; otherwise the
/// type's preferred control, if any.
pub fn get_control(field: &Field, definition: &FieldTypeDefinition) -> Option<EditControl> {
    field.edit.or_else(|| {
        if field.elements.is_some() {
            Some(EditControl::Select)
        } else {
            definition.edit
        }
    })
}

/// Fill in every behavior slot of each field
pub fn normalize_fields<I>(fields: I) -> Vec<NormalizedField>
where
    I: IntoIterator<Item = Field>,
{
    let normalized: Vec<NormalizedField> = fields.into_iter().map(normalize_field).collect();
    debug!("Normalized {} field(s)", normalized.len());
    normalized
}

/// Fill in every behavior slot of one field
pub fn normalize_field(field: Field) -> NormalizedField {
    let definition = get_field_type_definition(field.field_type);
    let edit = get_control(&field, definition);

    let get_value: GetValueFn = match field.get_value {
        Some(get_value) => get_value,
        None => {
            let id = field.id.clone();
            Arc::new(move |item: &Value| get_value_from_id(&id, item))
        }
    };

    let sort: SortFn = match field.sort {
        Some(sort) => sort,
        None => {
            let get_value = Arc::clone(&get_value);
            Arc::new(move |a: &Value, b: &Value, direction: SortDirection| {
                (definition.sort)(get_value(a).as_ref(), get_value(b).as_ref(), direction)
            })
        }
    };

    let is_valid: IsValidFn = match field.is_valid {
        Some(is_valid) => is_valid,
        None => {
            let get_value = Arc::clone(&get_value);
            Arc::new(move |item: &Value, context: &ValidationContext<'_>| {
                (definition.is_valid)(get_value(item).as_ref(), context)
            })
        }
    };

    let render: RenderFn = match field.render {
        Some(render) => render,
        None => Arc::new(move |item: &Value, field: &NormalizedField| {
            (definition.render)(field.get_value(item).as_ref(), field.elements.as_deref())
        }),
    };

    let label = field.label.unwrap_or_else(|| field.id.clone());
    let header = field.header.unwrap_or_else(|| label.clone());

    NormalizedField {
        id: field.id,
        field_type: field.field_type,
        label,
        header,
        description: field.description,
        edit,
        elements: field.elements,
        filter_by: field.filter_by,
        enable_hiding: field.enable_hiding.unwrap_or(true),
        enable_sorting: field
            .enable_sorting
            .or(definition.enable_sorting)
            .unwrap_or(true),
        enable_global_search: field.enable_global_search.unwrap_or(false),
        get_value,
        sort,
        is_valid,
        render,
    }
}

/// Operators the filter builder may offer for a field
///
/// Starts from the field's declared operators, else its type's default set,
/// else `isAny`/`isNone`; unknown operators are dropped and single-selection
/// operators exclude multi-selection ones.
pub fn sanitize_operators(field: &NormalizedField) -> Vec<Operator> {
    let declared = field
        .filter_by
        .as_ref()
        .and_then(|filter_by| filter_by.operators.as_deref());
    let fallback = field
        .definition()
        .filter_operators
        .unwrap_or(&DEFAULT_OPERATORS);

    sanitize_operator_names(declared, fallback)
}

/// Serializable field configuration
///
/// The data-only subset of [`Field`], for fields described in JSON. An
/// unknown `type` tag falls back to the generic definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub id: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Element>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<FilterBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_hiding: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_sorting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_global_search: Option<bool>,
}

fn lenient_field_type<'de, D>(deserializer: D) -> Result<Option<FieldType>, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = Option::<String>::deserialize(deserializer)?;
    Ok(tag.as_deref().and_then(|tag| {
        let parsed = FieldType::from_tag(tag);
        if parsed.is_none() {
            debug!("Unknown field type '{}', using the generic definition", tag);
        }
        parsed
    }))
}

impl From<FieldConfig> for Field {
    fn from(config: FieldConfig) -> Self {
        Self {
            id: config.id,
            field_type: config.field_type,
            label: config.label,
            header: config.header,
            description: config.description,
            edit: config.edit,
            elements: config.elements,
            filter_by: config.filter_by,
            enable_hiding: config.enable_hiding,
            enable_sorting: config.enable_sorting,
            enable_global_search: config.enable_global_search,
            ..Self::default()
        }
    }
}
