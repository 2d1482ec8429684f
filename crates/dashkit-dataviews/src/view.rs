//! View state and the in-memory grid pipeline
//!
//! A [`View`] describes what the user is looking at: a search string, active
//! filters, a sort, and a page. [`filter_sort_and_paginate`] applies it to a
//! slice of items using each field's normalized behavior.

use crate::coerce::{same_value_zero, to_display_string};
use crate::field::NormalizedField;
use crate::field_types::SortDirection;
use crate::operators::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One active filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field id the filter applies to
    pub field: String,
    pub operator: Operator,
    /// A single value for `is`/`isNot`, a list for the other operators
    #[serde(default)]
    pub value: Option<Value>,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// The filter values as a list; a bare scalar counts as a one-item list
    fn values(&self) -> Vec<&Value> {
        match &self.value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values.iter().collect(),
            Some(value) => vec![value],
        }
    }
}

/// Sort column and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// What the grid shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct View {
    pub search: Option<String>,
    pub filters: Vec<Filter>,
    pub sort: Option<SortSpec>,
    /// 1-based page number
    pub page: usize,
    /// Items per page; `None` or 0 shows everything
    pub per_page: Option<usize>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            search: None,
            filters: Vec::new(),
            sort: None,
            page: 1,
            per_page: None,
        }
    }
}

impl View {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = Some(per_page);
        self
    }
}

/// Size of the filtered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total_items: usize,
    pub total_pages: usize,
}

/// Apply search, filters, sort and pagination to `items`
pub fn filter_sort_and_paginate(
    items: &[Value],
    view: &View,
    fields: &[NormalizedField],
) -> (Vec<Value>, PaginationInfo) {
    let find_field = |id: &str| fields.iter().find(|field| field.id == id);

    let mut data: Vec<&Value> = items.iter().collect();

    if let Some(search) = view.search.as_deref().map(normalize_search).filter(|s| !s.is_empty()) {
        let searchable: Vec<&NormalizedField> =
            fields.iter().filter(|field| field.enable_global_search).collect();
        data.retain(|item| {
            searchable.iter().any(|field| {
                normalize_search(&to_display_string(field.get_value(item).as_ref())).contains(&search)
            })
        });
    }

    for filter in &view.filters {
        let Some(field) = find_field(&filter.field) else {
            debug!("Ignoring filter on unknown field '{}'", filter.field);
            continue;
        };
        let values = filter.values();
        if values.is_empty() {
            continue;
        }
        data.retain(|item| matches_filter(field.get_value(item).as_ref(), filter.operator, &values));
    }

    if let Some(sort) = &view.sort {
        match find_field(&sort.field) {
            Some(field) if field.enable_sorting => {
                data.sort_by(|a, b| field.sort(a, b, sort.direction));
            }
            Some(_) => debug!("Field '{}' does not allow sorting", sort.field),
            None => debug!("Ignoring sort on unknown field '{}'", sort.field),
        }
    }

    let total_items = data.len();
    let per_page = view.per_page.filter(|per_page| *per_page > 0);
    let (page_items, total_pages): (Vec<Value>, usize) = match per_page {
        Some(per_page) => {
            let start = view.page.saturating_sub(1).saturating_mul(per_page);
            let page = data.into_iter().skip(start).take(per_page).cloned().collect();
            (page, total_items.div_ceil(per_page))
        }
        None => (
            data.into_iter().cloned().collect(),
            usize::from(total_items > 0),
        ),
    };

    debug!(
        "View yields {} item(s) on page {} of {}",
        page_items.len(),
        view.page,
        total_pages
    );

    (
        page_items,
        PaginationInfo {
            total_items,
            total_pages,
        },
    )
}

fn normalize_search(text: &str) -> String {
    text.trim().to_lowercase()
}

fn matches_filter(field_value: Option<&Value>, operator: Operator, values: &[&Value]) -> bool {
    let includes = |candidate: Option<&Value>| values.iter().any(|value| same_value_zero(Some(*value), candidate));

    match operator {
        Operator::Is => same_value_zero(Some(values[0]), field_value),
        Operator::IsNot => !same_value_zero(Some(values[0]), field_value),
        Operator::IsAny => match field_value {
            Some(Value::Array(items)) => items.iter().any(|item| includes(Some(item))),
            None | Some(Value::Null) => false,
            scalar => includes(scalar),
        },
        Operator::IsNone => match field_value {
            Some(Value::Array(items)) => !items.iter().any(|item| includes(Some(item))),
            None | Some(Value::Null) => false,
            scalar => !includes(scalar),
        },
        Operator::IsAll => values
            .iter()
            .all(|value| value_includes(field_value, value)),
        Operator::IsNotAll => values
            .iter()
            .all(|value| !value_includes(field_value, value)),
    }
}

/// `haystack.includes(needle)` for list and text values
fn value_includes(haystack: Option<&Value>, needle: &Value) -> bool {
    match (haystack, needle) {
        (Some(Value::Array(items)), needle) => items.iter().any(|item| same_value_zero(Some(item), Some(needle))),
        (Some(Value::String(text)), Value::String(needle)) => text.contains(needle.as_str()),
        _ => false,
    }
}

/// Whether every listed form field accepts the item
///
/// Ids with no matching field are skipped.
pub fn is_item_valid<S: AsRef<str>>(item: &Value, fields: &[NormalizedField], form_field_ids: &[S]) -> bool {
    form_field_ids
        .iter()
        .filter_map(|id| fields.iter().find(|field| field.id == id.as_ref()))
        .all(|field| field.is_valid_item(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Element;
    use crate::field::{normalize_fields, Field};
    use crate::field_types::FieldType;
    use serde_json::json;

    fn fields() -> Vec<NormalizedField> {
        normalize_fields([
            Field::new("title").with_type(FieldType::Text).with_enable_global_search(true),
            Field::new("author").with_enable_global_search(true),
            Field::new("count").with_type(FieldType::Integer),
            Field::new("status").with_elements(vec![
                Element::new("draft", "Draft"),
                Element::new("publish", "Published"),
            ]),
            Field::new("tags"),
            Field::new("locked").with_type(FieldType::Boolean).with_enable_sorting(false),
        ])
    }

    fn posts() -> Vec<Value> {
        vec![
            json!({ "title": "Hello World", "author": "ada", "count": 3, "status": "publish", "tags": ["rust", "web"], "locked": true }),
            json!({ "title": "Another post", "author": "Grace", "count": 10, "status": "draft", "tags": ["web"], "locked": false }),
            json!({ "title": "zebra", "author": "linus", "count": 1, "status": "publish", "tags": [], "locked": true }),
        ]
    }

    fn titles(items: &[Value]) -> Vec<&str> {
        items.iter().filter_map(|item| item["title"].as_str()).collect()
    }

    #[test]
    fn empty_view_returns_everything() {
        let (items, info) = filter_sort_and_paginate(&posts(), &View::default(), &fields());
        assert_eq!(items.len(), 3);
        assert_eq!(info, PaginationInfo { total_items: 3, total_pages: 1 });
    }

    #[test]
    fn search_is_case_insensitive_over_searchable_fields() {
        let view = View::default().with_search("  GRACE ");
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post"]);

        // status is not searchable
        let view = View::default().with_search("publish");
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert!(items.is_empty());
    }

    #[test]
    fn single_value_filters() {
        let view = View::default().with_filter(Filter::new("status", Operator::Is, "publish"));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Hello World", "zebra"]);

        let view = View::default().with_filter(Filter::new("count", Operator::IsNot, 3));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post", "zebra"]);
    }

    #[test]
    fn multi_value_filters() {
        let view = View::default().with_filter(Filter::new("status", Operator::IsAny, json!(["draft"])));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post"]);

        let view = View::default().with_filter(Filter::new("tags", Operator::IsNone, json!(["rust"])));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post", "zebra"]);

        let view = View::default().with_filter(Filter::new("tags", Operator::IsAll, json!(["rust", "web"])));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Hello World"]);

        let view = View::default().with_filter(Filter::new("tags", Operator::IsNotAll, json!(["rust", "web"])));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["zebra"]);
    }

    #[test]
    fn empty_and_unknown_filters_are_ignored() {
        let view = View::default()
            .with_filter(Filter::new("status", Operator::IsAny, json!([])))
            .with_filter(Filter {
                field: "status".to_string(),
                operator: Operator::Is,
                value: None,
            })
            .with_filter(Filter::new("missing", Operator::Is, "x"));
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn sorts_with_field_sort() {
        let view = View::default().with_sort("count", SortDirection::Desc);
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post", "Hello World", "zebra"]);

        let view = View::default().with_sort("title", SortDirection::Asc);
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post", "Hello World", "zebra"]);
    }

    #[test]
    fn sort_is_skipped_when_disabled() {
        let view = View::default().with_sort("locked", SortDirection::Asc);
        let (items, _) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Hello World", "Another post", "zebra"]);
    }

    #[test]
    fn sorting_tolerates_values_that_are_not_numbers() {
        let fields = normalize_fields([
            Field::new("n").with_type(FieldType::Integer),
            Field::new("when").with_type(FieldType::Datetime),
            Field::new("any"),
        ]);

        for round in 0..200 {
            let items: Vec<Value> = (0..40)
                .map(|i| {
                    if i % 5 == 0 {
                        json!({ "n": "abc", "when": "not a date", "any": "abc" })
                    } else {
                        let n = (i * 37 + round * 11) % 97;
                        json!({ "n": n, "when": format!("2024-01-{:02}", n % 28 + 1), "any": if n % 2 == 0 { json!(n) } else { json!(n.to_string()) } })
                    }
                })
                .collect();

            for field in ["n", "when", "any"] {
                for direction in [SortDirection::Asc, SortDirection::Desc] {
                    let view = View::default().with_sort(field, direction);
                    let (sorted, _) = filter_sort_and_paginate(&items, &view, &fields);
                    assert_eq!(sorted.len(), items.len());
                }
            }

            let view = View::default().with_sort("n", SortDirection::Asc);
            let (sorted, _) = filter_sort_and_paginate(&items, &view, &fields);
            assert!(sorted[32..].iter().all(|item| item["n"] == json!("abc")));
        }
    }

    #[test]
    fn paginates() {
        let view = View::default().with_sort("count", SortDirection::Asc).with_page(2, 2);
        let (items, info) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert_eq!(titles(&items), vec!["Another post"]);
        assert_eq!(info, PaginationInfo { total_items: 3, total_pages: 2 });

        let view = View::default().with_page(5, 2);
        let (items, info) = filter_sort_and_paginate(&posts(), &view, &fields());
        assert!(items.is_empty());
        assert_eq!(info.total_pages, 2);
    }

    #[test]
    fn view_deserializes_from_camel_case() {
        let view: View = serde_json::from_value(json!({
            "search": "hello",
            "filters": [{ "field": "status", "operator": "isAny", "value": ["draft"] }],
            "sort": { "field": "count", "direction": "desc" },
            "perPage": 20
        }))
        .unwrap();

        assert_eq!(view.page, 1);
        assert_eq!(view.per_page, Some(20));
        assert_eq!(view.filters[0].operator, Operator::IsAny);
        assert_eq!(view.sort.unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn item_validity_over_form_fields() {
        let fields = fields();
        let item = json!({ "title": "x", "count": "4", "status": "publish" });
        assert!(is_item_valid(&item, &fields, &["title", "count", "status"]));

        let item = json!({ "title": "x", "count": "", "status": "publish" });
        assert!(!is_item_valid(&item, &fields, &["count"]));
        assert!(is_item_valid(&item, &fields, &["title"]));

        let item = json!({ "status": "trash" });
        assert!(!is_item_valid(&item, &fields, &["status"]));
        assert!(is_item_valid(&item, &fields, &["nonexistent"]));
    }
}
