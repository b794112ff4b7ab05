//! Engine configuration
//!
//! Tunables for plan allocation and replanning. Workload band thresholds are
//! fixed constants in [`crate::workload`].

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default lower bound of tasks placed on one day
pub const DEFAULT_MIN_TASKS_PER_DAY: usize = 3;

/// Default upper bound of tasks placed on one day
pub const DEFAULT_MAX_TASKS_PER_DAY: usize = 5;

/// Largest accepted `max_tasks_per_day`
pub const MAX_TASKS_PER_DAY_LIMIT: usize = 100;

/// Time estimate used when a proposal carries none
pub const DEFAULT_TASK_MINUTES: u32 = 30;

/// Default plan horizon in days
pub const DEFAULT_DURATION_DAYS: u32 = 7;

/// Configuration for the plan allocator and replan engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Days should receive at least this many tasks when content allows
    pub min_tasks_per_day: usize,
    /// Hard cap on tasks per day; overflow is dropped lowest-priority first
    pub max_tasks_per_day: usize,
    /// Minutes assumed for proposals without an estimate
    pub default_task_minutes: u32,
    /// Number of top weak points consulted when allocating
    pub weak_topic_limit: usize,
    /// Day offsets at which weak-topic tasks get a spaced-review follow-up
    pub weak_follow_up_gaps: Vec<u32>,
    /// Length of a follow-up session
    pub follow_up_minutes: u32,
    /// Replanned sessions are capped at this length
    pub replan_session_cap_minutes: u32,
    /// Horizon used when the caller does not specify one
    pub default_duration_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_tasks_per_day: DEFAULT_MIN_TASKS_PER_DAY,
            max_tasks_per_day: DEFAULT_MAX_TASKS_PER_DAY,
            default_task_minutes: DEFAULT_TASK_MINUTES,
            weak_topic_limit: 5,
            weak_follow_up_gaps: vec![1, 3],
            follow_up_minutes: 15,
            replan_session_cap_minutes: 45,
            default_duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

impl EngineConfig {
    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.min_tasks_per_day == 0 {
            return Err(EngineError::InvalidConfig(
                "minTasksPerDay must be at least 1".to_string(),
            ));
        }
        if self.max_tasks_per_day < self.min_tasks_per_day {
            return Err(EngineError::InvalidConfig(format!(
                "maxTasksPerDay ({}) is below minTasksPerDay ({})",
                self.max_tasks_per_day, self.min_tasks_per_day
            )));
        }
        if self.max_tasks_per_day > MAX_TASKS_PER_DAY_LIMIT {
            return Err(EngineError::InvalidConfig(format!(
                "maxTasksPerDay ({}) is above {}",
                self.max_tasks_per_day, MAX_TASKS_PER_DAY_LIMIT
            )));
        }
        if self.default_task_minutes == 0
            || self.follow_up_minutes == 0
            || self.replan_session_cap_minutes == 0
        {
            return Err(EngineError::InvalidConfig(
                "time estimates must be positive".to_string(),
            ));
        }
        if self.default_duration_days == 0 {
            return Err(EngineError::InvalidDuration(0));
        }
        if self.weak_follow_up_gaps.contains(&0) {
            return Err(EngineError::InvalidConfig(
                "follow-up gaps must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}
