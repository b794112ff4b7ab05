//! Study Plan Module
//!
//! Multi-day plans built from externally generated task proposals:
//! - Allocation over the plan horizon, weak topics first
//! - Replanning of the remaining days without touching completed history
//! - Day and progress queries

mod allocator;
mod content;
mod model;
mod replan;

pub use allocator::PlanAllocator;
pub use content::{
    parse_content_response, ContentError, ContentRequest, ContentSource, PlanMode,
    StaticContentSource, TaskProposal,
};
pub use model::{
    completed_count, materialize, tasks_for_day, todays_tasks, PlanProgress, PlanTask,
    PlanTaskDraft, StudyPlan, TaskStatus, TaskType, MAX_PLAN_DAYS,
};
pub use replan::{Replan, ReplanEngine, ReplanWindow};
