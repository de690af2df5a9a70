//! Aggregate statistics over a to-do collection.
//!
//! # Invariants
//! - `active + completed == total`.
//! - `by_priority.high + by_priority.medium + by_priority.low == total`.
//! - `high_priority == by_priority.high`.

use crate::model::todo::{Priority, TodoItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item counts per priority bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl PriorityBreakdown {
    pub fn get(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }

    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

/// Derived snapshot; recomputed from the item collection, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub high_priority: u64,
    /// Open items whose due date lies strictly before the snapshot instant.
    pub overdue: u64,
    pub by_priority: PriorityBreakdown,
}

impl Stats {
    /// Aggregates `items` as seen at `now`.
    pub fn compute<'a, I>(items: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a TodoItem>,
    {
        let mut stats = Self::default();
        for item in items {
            stats.total += 1;
            if item.completed {
                stats.completed += 1;
            } else {
                stats.active += 1;
            }
            if item.priority == Priority::High {
                stats.high_priority += 1;
            }
            stats.by_priority.record(item.priority);
            if item.is_overdue(now) {
                stats.overdue += 1;
            }
        }
        stats
    }

    /// Returns whether the documented count invariants hold.
    pub fn is_consistent(&self) -> bool {
        self.active + self.completed == self.total
            && self.by_priority.total() == self.total
            && self.high_priority == self.by_priority.high
            && self.overdue <= self.active
    }
}
