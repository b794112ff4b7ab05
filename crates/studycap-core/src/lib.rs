//! # StudyCap Core
//!
//! Adaptive study-scheduling engine:
//!
//! - **SM-2 Review Scheduling**: per-item ease, interval and repetition state
//! - **Weak-Point Tracking**: case-insensitive failure counts per topic
//! - **Due-Set Selection**: what to review now, with a full-collection fallback
//! - **Plan Allocation**: day-bucketed multi-day plans weighted toward weak topics
//! - **Replanning**: regenerate the remaining days without touching history
//! - **Workload Aggregation**: scheduled hours per day classified into bands
//!
//! All engine operations are synchronous transformations over in-memory
//! snapshots. Persistence ([`Storage`]) and task content ([`ContentSource`])
//! are collaborators injected by the host.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use studycap_core::prelude::*;
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let card = Flashcard::new("Mitosis", "Cell division into two nuclei", now);
//!
//! let mut weak_points = WeakPointTracker::new();
//! let mut session = ReviewSession::new(&mut weak_points);
//! let outcome = session.record(&card, Quality::FAIL, now);
//! assert_eq!(outcome.card.item.interval_days, 1);
//!
//! let source = StaticContentSource::from_response(r#"{"tasks": [{"title": "Draw the phases"}]}"#)?;
//! let (plan, tasks) = PlanAllocator::default()
//!     .create_plan("Cell biology", 7, &weak_points.weak_topics(5), &source, now)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `encryption`: SQLCipher, keyed by `STUDYCAP_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod error;
pub mod plan;
pub mod review;
pub mod storage;
pub mod weak_points;

/// Scheduled load per day and per subject
pub mod workload;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::EngineConfig;
pub use error::{EngineError, Result};

// Review scheduling
pub use review::{
    due_items, schedule, shuffle_items, study_set, Flashcard, Quality, QualityPreview, ReviewItem,
    ReviewOutcome, ReviewScheduler, ReviewSession, StudySet,
};

// Weak points
pub use weak_points::{MasteryLevel, TopicKey, TutorVerdict, WeakPoint, WeakPointChange, WeakPointTracker};

// Plans
pub use plan::{
    parse_content_response, ContentError, ContentRequest, ContentSource, PlanAllocator, PlanMode,
    PlanProgress, PlanTask, PlanTaskDraft, Replan, ReplanEngine, ReplanWindow, StaticContentSource,
    StudyPlan, TaskProposal, TaskStatus, TaskType,
};

// Workload
pub use workload::{
    classify_workload, day_hours, day_workload, subject_progress, week_workload, DayWorkload,
    StudyBlock, SubjectProgress, WorkloadBand,
};

// Storage layer
pub use storage::{Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        ContentSource, EngineConfig, EngineError, Flashcard, PlanAllocator, PlanTask, Quality,
        ReplanEngine, Result, ReviewItem, ReviewScheduler, ReviewSession, StaticContentSource,
        Storage, StorageError, StudyBlock, StudyPlan, TaskType, WeakPointTracker, WorkloadBand,
    };
}
