//! Due-set selection
//!
//! An item is due once `next_review_at <= now`. When nothing is due but items
//! exist, the whole collection is presented instead so a study session never
//! dead-ends on "nothing to study".

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use super::item::ReviewItem;

/// Items selected for a study session
#[derive(Debug, Clone, PartialEq)]
pub struct StudySet<T> {
    /// Items to present, in presentation order
    pub items: Vec<T>,
    /// True when nothing was due and the full collection was substituted
    pub fallback: bool,
}

impl<T> StudySet<T> {
    /// Number of items in the set
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty (only when the input collection was)
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Every item with `next_review_at <= now`, soonest first
pub fn due_items<T>(items: &[T], now: DateTime<Utc>) -> Vec<T>
where
    T: AsRef<ReviewItem> + Clone,
{
    let mut due: Vec<T> = items
        .iter()
        .filter(|item| item.as_ref().is_due(now))
        .cloned()
        .collect();
    due.sort_by_key(|item| item.as_ref().next_review_at);
    due
}

/// Due items, or the full collection when none are due
pub fn study_set<T>(items: &[T], now: DateTime<Utc>) -> StudySet<T>
where
    T: AsRef<ReviewItem> + Clone,
{
    let due = due_items(items, now);
    if due.is_empty() && !items.is_empty() {
        tracing::debug!(total = items.len(), "no items due, presenting full collection");
        return StudySet {
            items: items.to_vec(),
            fallback: true,
        };
    }
    StudySet {
        items: due,
        fallback: false,
    }
}

/// Uniform in-place permutation (Fisher-Yates)
pub fn shuffle_items<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}
