//! Study plans and their tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Longest plan horizon accepted
pub const MAX_PLAN_DAYS: u32 = 366;

// ============================================================================
// TASK TYPE
// ============================================================================

/// Cognitive type of a plan task (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Retrieve from memory without looking
    ActiveRecall,
    /// Practice problems
    Practice,
    /// Re-read or summarize material
    Review,
    /// Revisit earlier material at a spacing interval
    SpacedReview,
    /// Long focused session on new material
    DeepStudy,
    /// Generic fallback
    #[default]
    Study,
}

impl TaskType {
    /// Every task type
    pub const ALL: [TaskType; 6] = [
        TaskType::ActiveRecall,
        TaskType::Practice,
        TaskType::Review,
        TaskType::SpacedReview,
        TaskType::DeepStudy,
        TaskType::Study,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::ActiveRecall => "active_recall",
            TaskType::Practice => "practice",
            TaskType::Review => "review",
            TaskType::SpacedReview => "spaced_review",
            TaskType::DeepStudy => "deep_study",
            TaskType::Study => "study",
        }
    }

    /// Parse from string name; unknown names fall back to `Study`
    pub fn parse_name(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "active_recall" => TaskType::ActiveRecall,
            "practice" | "practice_problems" => TaskType::Practice,
            "review" => TaskType::Review,
            "spaced_review" => TaskType::SpacedReview,
            "deep_study" => TaskType::DeepStudy,
            _ => TaskType::Study,
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TASK STATUS
// ============================================================================

/// Task lifecycle; `Completed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not done yet
    #[default]
    Pending,
    /// Done; never rewritten afterwards
    Completed,
}

impl TaskStatus {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }
}

// ============================================================================
// STUDY PLAN
// ============================================================================

/// A bounded scheduling horizon.
///
/// The current day is always derived from `created_at`, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// What the learner is working toward
    pub goal: String,
    /// Horizon length, fixed at creation
    pub duration_days: u32,
    /// When the plan started (day 1)
    pub created_at: DateTime<Utc>,
}

impl StudyPlan {
    /// Create a plan starting at `now`
    pub fn new(goal: impl Into<String>, duration_days: u32, now: DateTime<Utc>) -> Result<Self> {
        if duration_days == 0 || duration_days > MAX_PLAN_DAYS {
            return Err(EngineError::InvalidDuration(duration_days));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            goal: goal.into(),
            duration_days,
            created_at: now,
        })
    }

    /// Whole days since creation (0 before the first 24 hours pass)
    pub fn days_elapsed(&self, now: DateTime<Utc>) -> u32 {
        let seconds = (now - self.created_at).num_seconds();
        if seconds <= 0 {
            return 0;
        }
        u32::try_from(seconds / SECONDS_PER_DAY).unwrap_or(u32::MAX)
    }

    /// `min(days_elapsed + 1, duration_days)`
    pub fn current_day(&self, now: DateTime<Utc>) -> u32 {
        self.days_elapsed(now)
            .saturating_add(1)
            .min(self.duration_days)
    }

    /// Days left including today, never below 1
    pub fn remaining_days(&self, now: DateTime<Utc>) -> u32 {
        self.duration_days
            .saturating_sub(self.days_elapsed(now))
            .max(1)
    }

    /// Whether the horizon has fully passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.days_elapsed(now) >= self.duration_days
    }

    /// Whether `day` lies in `1..=duration_days`
    pub fn contains_day(&self, day: u32) -> bool {
        (1..=self.duration_days).contains(&day)
    }

    /// Reject days outside the horizon
    pub fn validate_day(&self, day: u32) -> Result<()> {
        if self.contains_day(day) {
            Ok(())
        } else {
            Err(EngineError::InvalidDayNumber {
                day,
                duration_days: self.duration_days,
            })
        }
    }
}

// ============================================================================
// PLAN TASK
// ============================================================================

/// A unit of work inside a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTask {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning plan
    pub plan_id: String,
    /// Short title
    pub title: String,
    /// What to do
    #[serde(default)]
    pub description: String,
    /// Cognitive type
    pub task_type: TaskType,
    /// Day bucket, `1..=duration_days`
    pub day_number: u32,
    /// Estimated minutes, positive
    pub time_estimate_minutes: u32,
    /// Lifecycle state
    pub status: TaskStatus,
    /// When it was completed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether a tutor check confirmed mastery
    #[serde(default)]
    pub mastery_verified: bool,
}

impl PlanTask {
    /// Whether the task is done
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Mark done. Completed tasks are terminal: returns `false` and leaves
    /// the task untouched if it was already completed.
    pub fn complete(&mut self, now: DateTime<Utc>, mastery_verified: bool) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        self.mastery_verified = mastery_verified;
        true
    }
}

/// A task produced by allocation, not yet owned by a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTaskDraft {
    /// Short title
    pub title: String,
    /// What to do
    pub description: String,
    /// Cognitive type
    pub task_type: TaskType,
    /// Day bucket
    pub day_number: u32,
    /// Estimated minutes
    pub time_estimate_minutes: u32,
    /// Topic the task covers, if known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topic: Option<String>,
}

impl PlanTaskDraft {
    /// Turn into a pending task of `plan_id`
    pub fn into_task(self, plan_id: &str) -> PlanTask {
        PlanTask {
            id: Uuid::new_v4().to_string(),
            plan_id: plan_id.to_string(),
            title: self.title,
            description: self.description,
            task_type: self.task_type,
            day_number: self.day_number,
            time_estimate_minutes: self.time_estimate_minutes,
            status: TaskStatus::Pending,
            completed_at: None,
            mastery_verified: false,
        }
    }
}

/// Materialize drafts into tasks of `plan`, rejecting out-of-horizon days
pub fn materialize(plan: &StudyPlan, drafts: Vec<PlanTaskDraft>) -> Result<Vec<PlanTask>> {
    drafts
        .into_iter()
        .map(|draft| {
            plan.validate_day(draft.day_number)?;
            Ok(draft.into_task(&plan.id))
        })
        .collect()
}

// ============================================================================
// QUERIES
// ============================================================================

/// Completion summary of a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    /// Completed tasks
    pub completed: usize,
    /// All tasks
    pub total: usize,
    /// `completed / total * 100`, 0 for an empty plan
    pub percent: f64,
}

impl PlanProgress {
    /// Summarize `tasks`
    pub fn of(tasks: &[PlanTask]) -> Self {
        let total = tasks.len();
        let completed = completed_count(tasks);
        let percent = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Number of completed tasks
pub fn completed_count(tasks: &[PlanTask]) -> usize {
    tasks.iter().filter(|task| task.is_completed()).count()
}

/// Tasks of `plan_id` on `day`
pub fn tasks_for_day<'a>(tasks: &'a [PlanTask], plan_id: &str, day: u32) -> Vec<&'a PlanTask> {
    tasks
        .iter()
        .filter(|task| task.plan_id == plan_id && task.day_number == day)
        .collect()
}

/// Tasks of `plan` on its current day
pub fn todays_tasks<'a>(plan: &StudyPlan, tasks: &'a [PlanTask], now: DateTime<Utc>) -> Vec<&'a PlanTask> {
    tasks_for_day(tasks, &plan.id, plan.current_day(now))
}

// ============================================================================
// TESTS
// ============================================================================
