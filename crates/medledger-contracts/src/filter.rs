//! ListLogs filter predicates.
//!
//! Each predicate is toggled independently: `None` disables it.  Enabled
//! predicates are combined with AND.  An enabled set predicate with an
//! empty value list is treated as disabled, so enabling a predicate without
//! values never narrows results.

use serde::{Deserialize, Serialize};

use crate::{actor::ActorKind, log::Log, transaction::Operation};

/// Inclusive commit-time window in Unix seconds.  Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl DateRange {
    pub fn contains(&self, timestamp: i64) -> bool {
        self.from.map_or(true, |from| timestamp >= from)
            && self.to.map_or(true, |to| timestamp <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub creator_kinds: Option<Vec<ActorKind>>,
    #[serde(default)]
    pub operations: Option<Vec<Operation>>,
    #[serde(default)]
    pub creator_ids: Option<Vec<String>>,
    #[serde(default)]
    pub organization_ids: Option<Vec<String>>,
    #[serde(default)]
    pub patient_ids: Option<Vec<String>>,
}

impl Filter {
    /// True when no predicate would narrow the result set.
    pub fn is_disabled(&self) -> bool {
        self.date_range.is_none()
            && !enabled(&self.creator_kinds)
            && !enabled(&self.operations)
            && !enabled(&self.creator_ids)
            && !enabled(&self.organization_ids)
            && !enabled(&self.patient_ids)
    }

    /// Evaluate every enabled predicate against `log`.
    pub fn matches(&self, log: &Log) -> bool {
        let tx = &log.payload;
        let creator_kind = tx.creator.as_ref().map(|c| c.kind).unwrap_or_default();

        self.date_range.map_or(true, |r| r.contains(log.timestamp))
            && member(&self.creator_kinds, &creator_kind)
            && member(&self.operations, &tx.operation)
            && member_str(&self.creator_ids, tx.creator_id())
            && member_str(&self.organization_ids, tx.organization_id())
            && member_str(&self.patient_ids, tx.patient_id())
    }
}

fn enabled<T>(set: &Option<Vec<T>>) -> bool {
    set.as_ref().is_some_and(|values| !values.is_empty())
}

fn member<T: PartialEq>(set: &Option<Vec<T>>, value: &T) -> bool {
    match set {
        Some(values) if !values.is_empty() => values.contains(value),
        _ => true,
    }
}

fn member_str(set: &Option<Vec<String>>, value: &str) -> bool {
    match set {
        Some(values) if !values.is_empty() => values.iter().any(|v| v == value),
        _ => true,
    }
}
