//! Replan Engine
//!
//! Regenerates the unfinished part of a plan. Per task:
//!
//! ```text
//! pending --complete--> completed   (terminal, never touched again)
//! pending --replan----> discarded
//! ```
//!
//! Completed history is carried over verbatim, so the completed count of a
//! plan never decreases across replans. Every pending task is dropped,
//! including leftovers from days that already passed; the new drafts only
//! cover the current day onward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::allocator::PlanAllocator;
use super::content::{ContentSource, PlanMode};
use super::model::{materialize, PlanTask, PlanTaskDraft, StudyPlan};
use crate::config::EngineConfig;
use crate::error::Result;

/// Days a replan covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplanWindow {
    /// First regenerated day (the plan's current day)
    pub first_day: u32,
    /// Last regenerated day (the plan's final day)
    pub last_day: u32,
    /// The horizon had already passed; this is a one-day catch-up
    pub catch_up: bool,
}

impl ReplanWindow {
    /// Number of days covered
    pub fn days(&self) -> u32 {
        self.last_day - self.first_day + 1
    }

    /// Whether `day` is regenerated by this window
    pub fn contains(&self, day: u32) -> bool {
        (self.first_day..=self.last_day).contains(&day)
    }

    /// Window for `plan` at `now`; never fails, degrading to a one-day
    /// catch-up on the last day when the horizon has passed
    pub fn for_plan(plan: &StudyPlan, now: DateTime<Utc>) -> Self {
        let elapsed = plan.days_elapsed(now);
        if elapsed >= plan.duration_days {
            return Self {
                first_day: plan.duration_days,
                last_day: plan.duration_days,
                catch_up: true,
            };
        }
        Self {
            first_day: elapsed + 1,
            last_day: plan.duration_days,
            catch_up: false,
        }
    }
}

/// Result of a replan, ready to be applied to the stored task set
#[derive(Debug, Clone, PartialEq)]
pub struct Replan {
    /// Plan being replanned
    pub plan: StudyPlan,
    /// Regenerated days
    pub window: ReplanWindow,
    /// Completed tasks, unchanged
    pub completed: Vec<PlanTask>,
    /// Pending tasks that are dropped, past days included
    pub discarded: Vec<PlanTask>,
    /// New tasks for the window, with absolute day numbers
    pub drafts: Vec<PlanTaskDraft>,
}

impl Replan {
    /// Ids of tasks the caller should delete
    pub fn discarded_ids(&self) -> Vec<&str> {
        self.discarded.iter().map(|task| task.id.as_str()).collect()
    }

    /// Final task set: completed tasks as they were, followed by the new
    /// drafts as pending tasks
    pub fn apply(self) -> Result<Vec<PlanTask>> {
        let fresh = materialize(&self.plan, self.drafts)?;
        let mut tasks = self.completed;
        tasks.extend(fresh);
        tasks.sort_by_key(|task| task.day_number);
        Ok(tasks)
    }
}

/// Regenerates the remaining days of a plan
#[derive(Debug, Clone, Default)]
pub struct ReplanEngine {
    allocator: PlanAllocator,
}

impl ReplanEngine {
    /// Create an engine with a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            allocator: PlanAllocator::new(config)?,
        })
    }

    /// Reuse an existing allocator
    pub fn with_allocator(allocator: PlanAllocator) -> Self {
        Self { allocator }
    }

    /// Whether a periodic re-evaluation should replan: some pending task is
    /// on a day that already passed
    pub fn needs_replan(&self, plan: &StudyPlan, tasks: &[PlanTask], now: DateTime<Utc>) -> bool {
        let today = plan.current_day(now);
        tasks
            .iter()
            .filter(|task| task.plan_id == plan.id)
            .any(|task| !task.is_completed() && task.day_number < today)
    }

    /// Replan `plan` at `now`.
    ///
    /// `tasks` is the plan's current task set; tasks of other plans are
    /// ignored. Weak topics are passed to the content source and weighted by
    /// the allocator so struggling topics get denser coverage.
    pub fn replan(
        &self,
        plan: &StudyPlan,
        tasks: &[PlanTask],
        weak_topics: &[String],
        now: DateTime<Utc>,
        source: &dyn ContentSource,
    ) -> Result<Replan> {
        let window = ReplanWindow::for_plan(plan, now);
        if window.catch_up {
            tracing::warn!(
                plan = %plan.id,
                day = window.first_day,
                "plan horizon has passed, replanning a one-day catch-up"
            );
        }

        let mut completed = Vec::new();
        let mut discarded = Vec::new();
        for task in tasks.iter().filter(|task| task.plan_id == plan.id) {
            plan.validate_day(task.day_number)?;
            if task.is_completed() {
                completed.push(task.clone());
            } else {
                discarded.push(task.clone());
            }
        }
        let backlog = discarded
            .iter()
            .filter(|task| task.day_number < window.first_day)
            .count();

        let offset = window.first_day - 1;
        let drafts = self
            .allocator
            .request_and_distribute(
                &plan.goal,
                window.days(),
                weak_topics,
                source,
                PlanMode::Replan,
                Some(self.allocator.config().replan_session_cap_minutes),
            )?
            .into_iter()
            .map(|mut draft| {
                draft.day_number += offset;
                draft
            })
            .collect::<Vec<_>>();

        tracing::info!(
            plan = %plan.id,
            first_day = window.first_day,
            last_day = window.last_day,
            kept = completed.len(),
            backlog,
            discarded = discarded.len(),
            added = drafts.len(),
            "plan replanned"
        );

        Ok(Replan {
            plan: plan.clone(),
            window,
            completed,
            discarded,
            drafts,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
