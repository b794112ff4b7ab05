//! Engine error types
//!
//! Input-shape violations (bad quality, bad day numbers) are caller contract
//! violations and are rejected rather than clamped. Content-source failures
//! are wrapped so the host can prompt a retry.

use crate::plan::ContentError;

/// Errors raised by the scheduling engine
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Review quality outside `0..=5`
    #[error("Invalid review quality: {0} (expected 0-5)")]
    InvalidQualityInput(i64),
    /// The content source produced no tasks for a plan
    #[error("Study plan for '{goal}' has no tasks")]
    EmptyPlan {
        /// Goal the plan was requested for
        goal: String,
    },
    /// A task day falls outside the plan horizon
    #[error("Day {day} is outside the plan horizon of {duration_days} days")]
    InvalidDayNumber {
        /// Offending day number
        day: u32,
        /// Plan horizon
        duration_days: u32,
    },
    /// A plan horizon of zero days
    #[error("Invalid plan duration: {0} days (must be at least 1)")]
    InvalidDuration(u32),
    /// Engine configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The content source failed
    #[error("Content source error: {0}")]
    Content(#[from] ContentError),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;
