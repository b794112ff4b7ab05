//! Review scheduler
//!
//! Maps (prior state, quality) to the next state. Time is an explicit input
//! so transitions stay deterministic and testable without a clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::item::{Quality, ReviewItem};
use super::sm2::{next_ease_factor, next_interval, next_repetitions};
use crate::error::Result;

/// Intervals each answer button would produce, for display before grading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityPreview {
    /// Interval after a failed answer
    pub fail_days: u32,
    /// Interval after a hard answer
    pub hard_days: u32,
    /// Interval after a good answer
    pub good_days: u32,
    /// Interval after an easy answer
    pub easy_days: u32,
}

/// SM-2 review scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewScheduler;

impl ReviewScheduler {
    /// Create a scheduler
    pub fn new() -> Self {
        Self
    }

    /// Apply a review to `prior`, returning the new state.
    ///
    /// The ease factor and interval growth both read the prior ease factor.
    pub fn schedule(&self, prior: &ReviewItem, quality: Quality, now: DateTime<Utc>) -> ReviewItem {
        let q = quality.value();
        let interval_days = next_interval(q, prior.repetitions, prior.interval_days, prior.ease_factor);
        let repetitions = next_repetitions(q, prior.repetitions);
        let ease_factor = next_ease_factor(prior.ease_factor, q);

        tracing::debug!(
            item = %prior.id,
            quality = q,
            interval_days,
            repetitions,
            ease_factor,
            "review scheduled"
        );

        ReviewItem {
            id: prior.id.clone(),
            ease_factor,
            interval_days,
            repetitions,
            last_reviewed_at: Some(now),
            next_review_at: add_days(now, interval_days),
        }
    }

    /// Validate a raw grade, then [`schedule`](Self::schedule)
    pub fn schedule_raw(&self, prior: &ReviewItem, quality: i64, now: DateTime<Utc>) -> Result<ReviewItem> {
        let quality = Quality::new(quality)?;
        Ok(self.schedule(prior, quality, now))
    }

    /// Intervals for each answer button without touching state
    pub fn preview(&self, item: &ReviewItem) -> QualityPreview {
        let interval = |q: Quality| {
            next_interval(q.value(), item.repetitions, item.interval_days, item.ease_factor)
        };
        QualityPreview {
            fail_days: interval(Quality::FAIL),
            hard_days: interval(Quality::HARD),
            good_days: interval(Quality::GOOD),
            easy_days: interval(Quality::EASY),
        }
    }
}

/// Apply a review with the default scheduler
pub fn schedule(prior: &ReviewItem, quality: Quality, now: DateTime<Utc>) -> ReviewItem {
    ReviewScheduler.schedule(prior, quality, now)
}

/// 9999-12-31T23:59:59Z; later instants no longer format as RFC 3339
const LATEST_REVIEW_TIMESTAMP: i64 = 253_402_300_799;

/// Latest `next_review_at` the scheduler will hand out
pub fn latest_review_at() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_REVIEW_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn add_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let latest = latest_review_at();
    now.checked_add_signed(Duration::days(i64::from(days)))
        .map_or(latest, |at| at.min(latest))
}

// ============================================================================
// TESTS
// ============================================================================
