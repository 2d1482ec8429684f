// # dashkit-dataviews
//
// Field typing and view shaping for dashkit data grids.
//
// ## Architecture Overview
//
// - **get_field_type_definition**: Sort, validation, edit and render behavior per field type
// - **normalize_fields**: Fills every behavior slot of a field from its type
// - **sanitize_operators**: Reduces a field's filter operators to an offerable set
// - **filter_sort_and_paginate**: Applies a view to a slice of items
//
// Items and field values are untyped JSON; the type definitions coerce them
// the way a browser-side grid would.

mod coerce;
pub mod elements;
pub mod field;
pub mod field_types;
pub mod operators;
pub mod view;

pub use elements::Element;
pub use field::{
    get_control, get_value_from_id, normalize_field, normalize_fields, sanitize_operators, Field,
    FieldConfig, FilterBy, NormalizedField,
};
pub use field_types::{
    get_field_type_definition, EditControl, FieldType, FieldTypeDefinition, SortDirection,
    ValidationContext,
};
pub use operators::{sanitize_operator_names, Operator, ALL_OPERATORS, DEFAULT_OPERATORS};
pub use view::{filter_sort_and_paginate, is_item_valid, Filter, PaginationInfo, SortSpec, View};
