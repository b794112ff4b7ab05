//! Workload Aggregation
//!
//! Scheduled study load per calendar day, classified into bands that drive
//! prioritization and visual cues. Overlapping blocks are summed as-is: the
//! figure is scheduled load, so double-booked time inflates the band.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days at or above this many scheduled hours are `high`
pub const HIGH_WORKLOAD_HOURS: f64 = 6.0;

/// Days at or above this many scheduled hours are `medium`
pub const MEDIUM_WORKLOAD_HOURS: f64 = 3.0;

/// Subject used for blocks without one
pub const DEFAULT_SUBJECT: &str = "General";

// ============================================================================
// STUDY BLOCK
// ============================================================================

/// A placed calendar occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyBlock {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// What is being studied
    pub title: String,
    /// Subject, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<String>,
    /// Start of the block
    pub start_time: DateTime<Utc>,
    /// End of the block
    pub end_time: DateTime<Utc>,
    /// Whether the learner finished it
    #[serde(default)]
    pub completed: bool,
    /// Plan task this block was placed for (lookup only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub task_id: Option<String>,
}

impl StudyBlock {
    /// Create an unfinished block
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            subject: None,
            start_time,
            end_time,
            completed: false,
            task_id: None,
        }
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Link to a plan task
    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Scheduled hours, counted in whole minutes. Inverted blocks count as 0.
    pub fn duration_hours(&self) -> f64 {
        let minutes = (self.end_time - self.start_time).num_minutes().max(0);
        minutes as f64 / 60.0
    }

    /// Calendar day the block starts on
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Subject, or [`DEFAULT_SUBJECT`]
    pub fn subject_or_default(&self) -> &str {
        match self.subject.as_deref() {
            Some(subject) if !subject.trim().is_empty() => subject,
            _ => DEFAULT_SUBJECT,
        }
    }
}

// ============================================================================
// BANDS
// ============================================================================

/// Discrete classification of a day's scheduled hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadBand {
    /// Nothing scheduled
    #[default]
    None,
    /// Under 3 hours
    Low,
    /// 3 hours up to 6
    Medium,
    /// 6 hours or more
    High,
}

impl WorkloadBand {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadBand::None => "none",
            WorkloadBand::Low => "low",
            WorkloadBand::Medium => "medium",
            WorkloadBand::High => "high",
        }
    }
}

impl std::fmt::Display for WorkloadBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify total scheduled hours
pub fn classify_workload(total_hours: f64) -> WorkloadBand {
    if total_hours >= HIGH_WORKLOAD_HOURS {
        WorkloadBand::High
    } else if total_hours >= MEDIUM_WORKLOAD_HOURS {
        WorkloadBand::Medium
    } else if total_hours > 0.0 {
        WorkloadBand::Low
    } else {
        WorkloadBand::None
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Load of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWorkload {
    /// The day
    pub date: NaiveDate,
    /// Blocks starting that day
    pub blocks: usize,
    /// Sum of their hours
    pub total_hours: f64,
    /// Band of `total_hours`
    pub band: WorkloadBand,
}

/// Total scheduled hours of blocks starting on `date`
pub fn day_hours(blocks: &[StudyBlock], date: NaiveDate) -> f64 {
    blocks
        .iter()
        .filter(|block| block.date() == date)
        .map(StudyBlock::duration_hours)
        .sum()
}

/// Hours and band for `date`
pub fn day_workload(blocks: &[StudyBlock], date: NaiveDate) -> DayWorkload {
    let count = blocks.iter().filter(|block| block.date() == date).count();
    let total_hours = day_hours(blocks, date);
    DayWorkload {
        date,
        blocks: count,
        total_hours,
        band: classify_workload(total_hours),
    }
}

/// Seven consecutive days starting at `start`
pub fn week_workload(blocks: &[StudyBlock], start: NaiveDate) -> Vec<DayWorkload> {
    (0..7)
        .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
        .map(|date| day_workload(blocks, date))
        .collect()
}

/// Scheduled and completed hours of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    /// Subject name
    pub subject: String,
    /// Number of blocks
    pub blocks: usize,
    /// Number of completed blocks
    pub completed_blocks: usize,
    /// Hours of all blocks
    pub scheduled_hours: f64,
    /// Hours of completed blocks
    pub completed_hours: f64,
}

/// Per-subject totals, most studied first, ties by name
pub fn subject_progress(blocks: &[StudyBlock]) -> Vec<SubjectProgress> {
    let mut by_subject: BTreeMap<&str, SubjectProgress> = BTreeMap::new();
    for block in blocks {
        let subject = block.subject_or_default();
        let entry = by_subject.entry(subject).or_insert_with(|| SubjectProgress {
            subject: subject.to_string(),
            blocks: 0,
            completed_blocks: 0,
            scheduled_hours: 0.0,
            completed_hours: 0.0,
        });
        let hours = block.duration_hours();
        entry.blocks += 1;
        entry.scheduled_hours += hours;
        if block.completed {
            entry.completed_blocks += 1;
            entry.completed_hours += hours;
        }
    }

    let mut progress: Vec<SubjectProgress> = by_subject.into_values().collect();
    // BTreeMap already yields name order; a stable sort keeps it for ties
    progress.sort_by(|a, b| b.completed_hours.total_cmp(&a.completed_hours));
    progress
}

// ============================================================================
// TESTS
// ============================================================================
