//! Review Scheduling Module
//!
//! SM-2 spaced repetition for flashcards:
//! - Pure (state, quality) -> state transitions
//! - Due-set selection with a full-collection fallback
//! - Review sessions that feed the weak-point tracker
//!
//! ## Core Formulas:
//! - Ease: EF' = max(1.3, EF + 0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
//! - Interval: 1, 6, then round(I * EF) while recall keeps succeeding

mod due;
mod item;
mod scheduler;
mod session;
pub mod sm2;

pub use due::{due_items, shuffle_items, study_set, StudySet};
pub use item::{Flashcard, Quality, ReviewItem};
pub use scheduler::{latest_review_at, schedule, QualityPreview, ReviewScheduler};
pub use session::{ReviewOutcome, ReviewSession};
pub use sm2::{INITIAL_EASE_FACTOR, MIN_EASE_FACTOR};
