//! Review session
//!
//! Couples a review action to both the item's schedule and the learner's
//! weak points: failed answers mark the card's topic weak, confident answers
//! work it off, and hard passes leave it alone.

use chrono::{DateTime, Utc};

use super::item::{Flashcard, Quality};
use super::scheduler::ReviewScheduler;
use crate::weak_points::{WeakPointChange, WeakPointTracker};

/// Result of recording one review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The card with its new schedule
    pub card: Flashcard,
    /// What happened to the card's weak point
    pub weak_point: WeakPointChange,
}

/// Applies reviews to cards and the learner's weak points
#[derive(Debug)]
pub struct ReviewSession<'a> {
    scheduler: ReviewScheduler,
    weak_points: &'a mut WeakPointTracker,
}

impl<'a> ReviewSession<'a> {
    /// Start a session over the learner's tracker
    pub fn new(weak_points: &'a mut WeakPointTracker) -> Self {
        Self {
            scheduler: ReviewScheduler::new(),
            weak_points,
        }
    }

    /// Grade `card` and update weak points for its topic
    pub fn record(&mut self, card: &Flashcard, quality: Quality, now: DateTime<Utc>) -> ReviewOutcome {
        let item = self.scheduler.schedule(&card.item, quality, now);
        let topic = card.topic();

        let weak_point = if quality.is_failure() {
            WeakPointChange::Failed(self.weak_points.record_failure(topic, now))
        } else if quality.is_confident() {
            match self.weak_points.record_mastery(topic) {
                Some(remaining) => WeakPointChange::Mastered(remaining),
                None => WeakPointChange::Unchanged,
            }
        } else {
            WeakPointChange::Unchanged
        };

        ReviewOutcome {
            card: Flashcard {
                item,
                ..card.clone()
            },
            weak_point,
        }
    }

    /// Whether the card's topic is currently weak (for highlighting)
    pub fn is_weak(&self, card: &Flashcard) -> bool {
        self.weak_points.is_weak(card.topic())
    }
}
