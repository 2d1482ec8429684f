//! Filter operators
//!
//! Each field exposes a set of operators to the filter builder. Single
//! selection operators (`is`, `isNot`) and multi-selection operators
//! (`isAny`, `isNone`, `isAll`, `isNotAll`) need different widgets, so a
//! field never offers both kinds at once.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A filter comparison mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    /// Equal to a single value
    Is,
    /// Not equal to a single value
    IsNot,
    /// Equal to any of several values
    IsAny,
    /// Equal to none of several values
    IsNone,
    /// Contains all of several values
    IsAll,
    /// Contains none of several values
    IsNotAll,
}

/// Every operator the filter builder understands
pub const ALL_OPERATORS: [Operator; 6] = [
    Operator::Is,
    Operator::IsNot,
    Operator::IsAny,
    Operator::IsNone,
    Operator::IsAll,
    Operator::IsNotAll,
];

/// Operators offered when a field declares none
pub const DEFAULT_OPERATORS: [Operator; 2] = [Operator::IsAny, Operator::IsNone];

impl Operator {
    /// Parse the wire name of an operator
    pub fn parse(name: &str) -> Option<Self> {
        ALL_OPERATORS.into_iter().find(|op| op.as_str() == name)
    }

    /// The wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "isNot",
            Operator::IsAny => "isAny",
            Operator::IsNone => "isNone",
            Operator::IsAll => "isAll",
            Operator::IsNotAll => "isNotAll",
        }
    }

    /// Operates on one selected value
    pub fn is_single_selection(&self) -> bool {
        matches!(self, Operator::Is | Operator::IsNot)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce declared operator names to the set a filter widget can offer
///
/// `declared` falls back to `fallback` when absent. Unknown names are
/// dropped; if any single-selection operator remains, multi-selection
/// operators are dropped too. Declaration order is kept.
pub fn sanitize_operator_names(declared: Option<&[String]>, fallback: &[Operator]) -> Vec<Operator> {
    let mut operators: Vec<Operator> = match declared {
        Some(names) => names
            .iter()
            .filter_map(|name| {
                let parsed = Operator::parse(name);
                if parsed.is_none() {
                    debug!("Dropping unknown filter operator '{}'", name);
                }
                parsed
            })
            .collect(),
        None => fallback.to_vec(),
    };

    if operators.iter().any(Operator::is_single_selection) {
        operators.retain(Operator::is_single_selection);
    }

    operators
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_round_trips_wire_names() {
        for op in ALL_OPERATORS {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
        assert_eq!(Operator::parse("contains"), None);
    }

    #[test]
    fn absent_declaration_uses_fallback() {
        assert_eq!(
            sanitize_operator_names(None, &DEFAULT_OPERATORS),
            vec![Operator::IsAny, Operator::IsNone]
        );
    }

    #[test]
    fn unknown_operators_are_dropped() {
        let declared = names(&["isAny", "between", "isAll"]);
        assert_eq!(
            sanitize_operator_names(Some(declared.as_slice()), &DEFAULT_OPERATORS),
            vec![Operator::IsAny, Operator::IsAll]
        );
    }

    #[test]
    fn single_selection_wins_over_multi_selection() {
        let declared = names(&["isAny", "is", "isNone", "isNot"]);
        assert_eq!(
            sanitize_operator_names(Some(declared.as_slice()), &DEFAULT_OPERATORS),
            vec![Operator::Is, Operator::IsNot]
        );
    }

    #[test]
    fn empty_declaration_stays_empty() {
        assert!(sanitize_operator_names(Some(&[][..]), &DEFAULT_OPERATORS).is_empty());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(Operator::IsNotAll).unwrap();
        assert_eq!(json, serde_json::json!("isNotAll"));
    }
}
