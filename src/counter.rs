//! Completed Counter
//!
//! Cached count of completed items, adjusted by the transitions that
//! touch them. `recount` is the oracle it must always agree with.

use serde::{Deserialize, Serialize};

use crate::models::Item;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedCounter(usize);

impl CompletedCounter {
    pub fn value(self) -> usize {
        self.0
    }

    /// Full scan of `items`
    pub fn recount(items: &[Item]) -> Self {
        Self(items.iter().filter(|item| item.completed).count())
    }

    /// Adjust for an item whose flag just flipped to `completed`
    pub fn toggled(self, completed: bool) -> Self {
        if completed {
            Self(self.0 + 1)
        } else {
            Self(self.0.saturating_sub(1))
        }
    }

    pub fn added(self, item: &Item) -> Self {
        if item.completed {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    pub fn removed(self, item: &Item) -> Self {
        if item.completed {
            Self(self.0.saturating_sub(1))
        } else {
            self
        }
    }

    pub fn agrees_with(self, items: &[Item]) -> bool {
        self == Self::recount(items)
    }
}
