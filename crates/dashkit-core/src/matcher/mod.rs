//! Record value matching
//!
//! Pairs the values currently configured on a record with the values it
//! should have. Each output row says what happens to one value:
//!
//! ```text
//! current            update to
//! ───────────────────────────────────
//! ns2.wordpress.com  ns2.wordpress.com   (already correct)
//! ns1.other.com      ns1.wordpress.com   (replace)
//! -                  ns4.wordpress.com   (add)
//! ns9.other.com      -                   (remove)
//! ```
//!
//! ## Ordering
//!
//! Rows follow target order. For every target value an exact match among the
//! current values is tried first, then the next unmatched current value in
//! its original order, then the [`SENTINEL`]. Unmatched current values left
//! over once the targets are exhausted are appended as removals.
//!
//! Matching is a total, pure function: any pair of slices (empty, repeated
//! values, different lengths) produces a deterministic result.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Placeholder for "no value on this side"
pub const SENTINEL: &str = "-";

/// One row of a record match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    /// The value presently configured, or [`SENTINEL`] if it must be added
    pub current_value: String,
    /// The value it should become, or [`SENTINEL`] if it must be removed
    pub update_to: String,
}

impl Pairing {
    /// Create a pairing
    pub fn new(current_value: impl Into<String>, update_to: impl Into<String>) -> Self {
        Self {
            current_value: current_value.into(),
            update_to: update_to.into(),
        }
    }

    /// The current value already equals its target
    pub fn is_unchanged(&self) -> bool {
        self.current_value == self.update_to
    }

    /// The target value has no current counterpart
    pub fn is_addition(&self) -> bool {
        self.current_value == SENTINEL && self.update_to != SENTINEL
    }

    /// The current value has no target counterpart
    pub fn is_removal(&self) -> bool {
        self.update_to == SENTINEL && self.current_value != SENTINEL
    }

    /// A current value must be swapped for a different target value
    pub fn is_replacement(&self) -> bool {
        !self.is_unchanged() && !self.is_addition() && !self.is_removal()
    }

    /// The two display cells of this row
    pub fn as_row(&self) -> [&str; 2] {
        [&self.current_value, &self.update_to]
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.current_value, self.update_to)
    }
}

/// Match current record values against target values
///
/// # Example
///
/// ```
/// use dashkit_core::matcher::{match_records, Pairing};
///
/// let rows = match_records(
///     &["192.0.78.24", "185.230.63.186"],
///     &["192.0.78.24", "192.0.78.25"],
/// );
/// assert_eq!(rows, vec![
///     Pairing::new("192.0.78.24", "192.0.78.24"),
///     Pairing::new("185.230.63.186", "192.0.78.25"),
/// ]);
/// ```
pub fn match_records<C, T>(current: &[C], target: &[T]) -> Vec<Pairing>
where
    C: AsRef<str>,
    T: AsRef<str>,
{
    let wanted: HashSet<&str> = target.iter().map(AsRef::as_ref).collect();

    // Matched current values only need a remaining count per value; unmatched
    // ones are consumed strictly in order through a cursor.
    let mut matched: HashMap<&str, usize> = HashMap::new();
    let mut unmatched: Vec<&str> = Vec::new();
    for value in current.iter().map(AsRef::as_ref) {
        if wanted.contains(value) {
            *matched.entry(value).or_insert(0) += 1;
        } else {
            unmatched.push(value);
        }
    }

    let mut rows = Vec::with_capacity(target.len().max(current.len()));
    let mut cursor = 0;

    for value in target.iter().map(AsRef::as_ref) {
        match matched.get_mut(value) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                rows.push(Pairing::new(value, value));
            }
            _ => match unmatched.get(cursor) {
                Some(previous) => {
                    cursor += 1;
                    rows.push(Pairing::new(*previous, value));
                }
                None => rows.push(Pairing::new(SENTINEL, value)),
            },
        }
    }

    rows.extend(
        unmatched[cursor..]
            .iter()
            .map(|leftover| Pairing::new(*leftover, SENTINEL)),
    );

    rows
}
