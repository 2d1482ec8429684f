//! Change plans
//!
//! A [`ChangePlan`] is the list of record matches for one record set,
//! translated into the edits a provider has to perform.

use crate::config::RecordKey;
use crate::matcher::{match_records, Pairing, SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One edit to a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordChange {
    /// Value is already correct
    Keep(String),
    /// Value must be swapped for another
    Replace {
        /// Value presently configured
        from: String,
        /// Value it becomes
        to: String,
    },
    /// Value must be added
    Add(String),
    /// Value must be removed
    Remove(String),
}

impl RecordChange {
    /// Whether applying this change touches the provider
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RecordChange::Keep(_))
    }

    /// The existing value this change consumes, if any
    pub fn current_value(&self) -> Option<&str> {
        match self {
            RecordChange::Keep(value) | RecordChange::Remove(value) => Some(value),
            RecordChange::Replace { from, .. } => Some(from),
            RecordChange::Add(_) => None,
        }
    }
}

impl From<&Pairing> for RecordChange {
    fn from(pairing: &Pairing) -> Self {
        if pairing.is_unchanged() {
            RecordChange::Keep(pairing.update_to.clone())
        } else if pairing.is_addition() {
            RecordChange::Add(pairing.update_to.clone())
        } else if pairing.is_removal() {
            RecordChange::Remove(pairing.current_value.clone())
        } else {
            RecordChange::Replace {
                from: pairing.current_value.clone(),
                to: pairing.update_to.clone(),
            }
        }
    }
}

impl From<&RecordChange> for Pairing {
    fn from(change: &RecordChange) -> Self {
        match change {
            RecordChange::Keep(value) => Pairing::new(value.clone(), value.clone()),
            RecordChange::Replace { from, to } => Pairing::new(from.clone(), to.clone()),
            RecordChange::Add(value) => Pairing::new(SENTINEL, value.clone()),
            RecordChange::Remove(value) => Pairing::new(value.clone(), SENTINEL),
        }
    }
}

impl fmt::Display for RecordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordChange::Keep(value) => write!(f, "keep {}", value),
            RecordChange::Replace { from, to } => write!(f, "replace {} with {}", from, to),
            RecordChange::Add(value) => write!(f, "add {}", value),
            RecordChange::Remove(value) => write!(f, "remove {}", value),
        }
    }
}

/// Counts of each change kind in a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub keep: usize,
    pub replace: usize,
    pub add: usize,
    pub remove: usize,
}

impl PlanSummary {
    /// Number of changes that touch the provider
    pub fn mutations(&self) -> usize {
        self.replace + self.add + self.remove
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unchanged, {} replaced, {} added, {} removed",
            self.keep, self.replace, self.add, self.remove
        )
    }
}

/// Edits needed to bring one record set to its target values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    /// The record set
    pub record: RecordKey,
    /// Changes in display order (target order, then removals)
    pub changes: Vec<RecordChange>,
}

impl ChangePlan {
    /// Match current values against target values and build the plan
    ///
    /// The matcher leaves out copies of a value that `current` holds more
    /// often than `target` does. Those copies are appended as removals, so
    /// applying the plan leaves exactly the target values.
    pub fn build<C, T>(record: RecordKey, current: &[C], target: &[T]) -> Self
    where
        C: AsRef<str>,
        T: AsRef<str>,
    {
        let mut changes: Vec<RecordChange> = match_records(current, target)
            .iter()
            .map(RecordChange::from)
            .collect();

        let mut unaccounted: HashMap<&str, usize> = HashMap::new();
        for value in current.iter().map(AsRef::as_ref) {
            *unaccounted.entry(value).or_insert(0) += 1;
        }
        for change in &changes {
            if let Some(value) = change.current_value()
                && let Some(count) = unaccounted.get_mut(value)
            {
                *count = count.saturating_sub(1);
            }
        }
        for value in current.iter().map(AsRef::as_ref) {
            if let Some(count) = unaccounted.get_mut(value)
                && *count > 0
            {
                *count -= 1;
                changes.push(RecordChange::Remove(value.to_string()));
            }
        }

        Self { record, changes }
    }

    /// True when every change is a keep
    pub fn is_noop(&self) -> bool {
        !self.changes.iter().any(RecordChange::is_mutation)
    }

    /// Count changes per kind
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change {
                RecordChange::Keep(_) => summary.keep += 1,
                RecordChange::Replace { .. } => summary.replace += 1,
                RecordChange::Add(_) => summary.add += 1,
                RecordChange::Remove(_) => summary.remove += 1,
            }
        }
        summary
    }

    /// The plan as display rows
    ///
    /// These are the matcher's rows followed by any surplus removals.
    pub fn pairings(&self) -> Vec<Pairing> {
        self.changes.iter().map(Pairing::from).collect()
    }
}
