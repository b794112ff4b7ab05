//! Review items and quality grades

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sm2::{INITIAL_EASE_FACTOR, PASS_THRESHOLD};
use crate::error::{EngineError, Result};

// ============================================================================
// QUALITY
// ============================================================================

/// A review grade in `0..=5`.
///
/// | Grade | Meaning |
/// |-------|---------|
/// | 0-2   | Failed recall |
/// | 3     | Hard        |
/// | 4     | Good        |
/// | 5     | Easy        |
///
/// Construction validates the range; the scheduler never sees an invalid
/// grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Complete blackout
    pub const BLACKOUT: Quality = Quality(0);
    /// Failed answer button
    pub const FAIL: Quality = Quality(1);
    /// Hard answer button
    pub const HARD: Quality = Quality(3);
    /// Good answer button
    pub const GOOD: Quality = Quality(4);
    /// Easy answer button
    pub const EASY: Quality = Quality(5);

    /// Validate a raw grade
    pub fn new(value: i64) -> Result<Self> {
        if (0..=5).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(EngineError::InvalidQualityInput(value))
        }
    }

    /// The raw grade
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Grade 3 or better
    #[inline]
    pub fn is_pass(self) -> bool {
        self.0 >= PASS_THRESHOLD
    }

    /// Grade 2 or worse
    #[inline]
    pub fn is_failure(self) -> bool {
        !self.is_pass()
    }

    /// Grade 4 or better; counts as mastery for weak-point tracking
    #[inline]
    pub fn is_confident(self) -> bool {
        self.0 >= 4
    }
}

impl TryFrom<i64> for Quality {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// REVIEW ITEM
// ============================================================================

/// Scheduling state of one fact being learned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Opaque identifier
    pub id: String,
    /// Interval growth multiplier, never below 1.3
    pub ease_factor: f64,
    /// Days until the next scheduled review
    pub interval_days: u32,
    /// Consecutive successful reviews since the last failure
    pub repetitions: u32,
    /// When the item was last reviewed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Due once `now >= next_review_at`
    pub next_review_at: DateTime<Utc>,
}

impl ReviewItem {
    /// A freshly authored item, due immediately
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), now)
    }

    /// A freshly authored item with a caller-supplied id
    pub fn with_id(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            last_reviewed_at: None,
            next_review_at: now,
        }
    }

    /// Whether the item is presentable at `now`
    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Whether the item has never been reviewed
    pub fn is_new(&self) -> bool {
        self.last_reviewed_at.is_none()
    }
}

/// A flashcard: authored content plus its review state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    /// Scheduling state (shares the card id)
    #[serde(flatten)]
    pub item: ReviewItem,
    /// Prompt side
    pub front: String,
    /// Answer side
    pub back: String,
    /// Topic used for weak-point tracking; defaults to the front text
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topic: Option<String>,
    /// When the card was authored
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    /// Author a new card, due immediately
    pub fn new(front: impl Into<String>, back: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            item: ReviewItem::new(now),
            front: front.into(),
            back: back.into(),
            topic: None,
            created_at: now,
        }
    }

    /// Card id
    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Topic key fed to the weak-point tracker
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(&self.front)
    }
}

impl AsRef<ReviewItem> for Flashcard {
    fn as_ref(&self) -> &ReviewItem {
        &self.item
    }
}

impl AsRef<ReviewItem> for ReviewItem {
    fn as_ref(&self) -> &ReviewItem {
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
