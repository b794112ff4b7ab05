//! Plan Allocator
//!
//! Spreads content proposals across the days of a plan:
//!
//! 1. Proposals touching a weak topic are ordered first (most pressing topic
//!    first), the rest keep the collaborator's day order.
//! 2. The ordered list is cut into contiguous day buckets of near-equal size,
//!    never more than `max_tasks_per_day`.
//! 3. Weak-topic tasks get spaced-review follow-ups a few days later, and
//!    thin days are topped up with reviews of earlier material.
//! 4. Untyped tasks are tagged with whichever type their day lacks, and
//!    single-type days get one task retagged so every day mixes work.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::content::{ContentRequest, ContentSource, PlanMode, TaskProposal};
use super::model::{materialize, PlanTask, PlanTaskDraft, StudyPlan, TaskType, MAX_PLAN_DAYS};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::weak_points::TopicKey;

/// Order in which missing types are filled in
const TYPE_ROTATION: [TaskType; 5] = [
    TaskType::ActiveRecall,
    TaskType::Practice,
    TaskType::DeepStudy,
    TaskType::SpacedReview,
    TaskType::Review,
];

#[derive(Debug, Clone)]
struct Slot {
    draft: PlanTaskDraft,
    /// Type came from the proposal (or was already assigned)
    typed: bool,
    /// Index of the matching weak topic, lower is more pressing
    weak_rank: Option<usize>,
    follow_up: bool,
    day_hint: u32,
    order: usize,
}

impl Slot {
    fn priority(&self) -> (usize, u32, usize) {
        (self.weak_rank.unwrap_or(usize::MAX), self.day_hint, self.order)
    }
}

/// Distributes tasks over a plan horizon
#[derive(Debug, Clone)]
pub struct PlanAllocator {
    config: EngineConfig,
}

impl Default for PlanAllocator {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl PlanAllocator {
    /// Create an allocator with a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Request proposals from `source` and distribute them over
    /// `1..=duration_days`.
    ///
    /// Fails with [`EngineError::EmptyPlan`] when the source yields nothing
    /// usable.
    pub fn allocate(
        &self,
        goal: &str,
        duration_days: u32,
        weak_topics: &[String],
        source: &dyn ContentSource,
    ) -> Result<Vec<PlanTaskDraft>> {
        self.request_and_distribute(goal, duration_days, weak_topics, source, PlanMode::Generate, None)
    }

    /// Allocate and, only if that yields tasks, create the plan record.
    ///
    /// An empty allocation never produces a plan.
    pub fn create_plan(
        &self,
        goal: &str,
        duration_days: u32,
        weak_topics: &[String],
        source: &dyn ContentSource,
        now: DateTime<Utc>,
    ) -> Result<(StudyPlan, Vec<PlanTask>)> {
        let drafts = self.allocate(goal, duration_days, weak_topics, source)?;
        let plan = StudyPlan::new(goal, duration_days, now)?;
        let tasks = materialize(&plan, drafts)?;
        tracing::info!(plan = %plan.id, goal, duration_days, tasks = tasks.len(), "study plan created");
        Ok((plan, tasks))
    }

    pub(crate) fn request_and_distribute(
        &self,
        goal: &str,
        duration_days: u32,
        weak_topics: &[String],
        source: &dyn ContentSource,
        mode: PlanMode,
        session_cap: Option<u32>,
    ) -> Result<Vec<PlanTaskDraft>> {
        check_duration(duration_days)?;
        let weak_topics: Vec<String> = weak_topics
            .iter()
            .take(self.config.weak_topic_limit)
            .cloned()
            .collect();

        let request = ContentRequest {
            goal: goal.to_string(),
            duration_days,
            weak_topics,
            mode,
        };
        let proposals = source.propose(&request)?;
        tracing::debug!(goal, proposals = proposals.len(), ?mode, "content received");

        self.distribute_capped(goal, proposals, duration_days, &request.weak_topics, session_cap)
    }

    /// Distribute already-fetched proposals over `1..=duration_days`
    pub fn distribute(
        &self,
        goal: &str,
        proposals: Vec<TaskProposal>,
        duration_days: u32,
        weak_topics: &[String],
    ) -> Result<Vec<PlanTaskDraft>> {
        self.distribute_capped(goal, proposals, duration_days, weak_topics, None)
    }

    fn distribute_capped(
        &self,
        goal: &str,
        proposals: Vec<TaskProposal>,
        duration_days: u32,
        weak_topics: &[String],
        session_cap: Option<u32>,
    ) -> Result<Vec<PlanTaskDraft>> {
        check_duration(duration_days)?;
        let keys: Vec<TopicKey> = weak_topics
            .iter()
            .map(|topic| TopicKey::new(topic))
            .filter(|key| !key.is_empty())
            .collect();

        let mut primaries: Vec<Slot> = proposals
            .into_iter()
            .enumerate()
            .filter_map(|(order, proposal)| self.slot_for(order, proposal, &keys))
            .collect();
        if primaries.is_empty() {
            tracing::warn!(goal, "content source produced no usable tasks");
            return Err(EngineError::EmptyPlan {
                goal: goal.to_string(),
            });
        }
        primaries.sort_by_key(Slot::priority);

        let days = duration_days as usize;
        let capacity = days.saturating_mul(self.config.max_tasks_per_day);
        if primaries.len() > capacity {
            tracing::warn!(
                goal,
                dropped = primaries.len() - capacity,
                "more proposals than the plan can hold, dropping lowest priority"
            );
            primaries.truncate(capacity);
        }

        let mut buckets = bucket(primaries, days);
        self.add_weak_follow_ups(&mut buckets);
        self.top_up_thin_days(&mut buckets);
        for day in &mut buckets {
            assign_missing_types(day);
            diversify(day);
            if let Some(cap) = session_cap {
                for slot in day.iter_mut() {
                    slot.draft.time_estimate_minutes = slot.draft.time_estimate_minutes.min(cap);
                }
            }
        }

        let thin_days = buckets
            .iter()
            .filter(|day| day.len() < self.config.min_tasks_per_day)
            .count();
        if thin_days > 0 {
            tracing::debug!(goal, thin_days, "some days are below the preferred task count");
        }

        let drafts: Vec<PlanTaskDraft> = buckets
            .into_iter()
            .enumerate()
            .flat_map(|(idx, day)| {
                day.into_iter().map(move |mut slot| {
                    slot.draft.day_number = idx as u32 + 1;
                    slot.draft
                })
            })
            .collect();

        tracing::info!(goal, duration_days, tasks = drafts.len(), weak_topics = keys.len(), "plan allocated");
        Ok(drafts)
    }

    fn slot_for(&self, order: usize, proposal: TaskProposal, keys: &[TopicKey]) -> Option<Slot> {
        let title = proposal.title.trim();
        if title.is_empty() {
            tracing::debug!(order, "skipping proposal without a title");
            return None;
        }

        let topic_key = proposal.topic.as_deref().map(TopicKey::new);
        let weak_rank = keys.iter().position(|key| {
            key.is_mentioned_in(title)
                || topic_key
                    .as_ref()
                    .is_some_and(|topic| topic == key || key.is_mentioned_in(topic.as_str()))
        });
        let task_type = proposal.task_type.as_deref().map(TaskType::parse_name);

        Some(Slot {
            draft: PlanTaskDraft {
                title: title.to_string(),
                description: proposal.description.trim().to_string(),
                task_type: task_type.unwrap_or_default(),
                day_number: 0,
                time_estimate_minutes: proposal
                    .time_minutes
                    .filter(|minutes| *minutes > 0)
                    .unwrap_or(self.config.default_task_minutes),
                topic: proposal.topic.filter(|topic| !topic.trim().is_empty()),
            },
            typed: task_type.is_some(),
            weak_rank,
            follow_up: false,
            day_hint: proposal.day.unwrap_or(u32::MAX),
            order,
        })
    }

    fn follow_up_of(&self, slot: &Slot) -> Slot {
        let title = &slot.draft.title;
        Slot {
            draft: PlanTaskDraft {
                title: format!("Spaced review: {}", title),
                description: format!(
                    "Recall the key points of \"{}\" without notes, then check what you missed.",
                    title
                ),
                task_type: TaskType::SpacedReview,
                day_number: 0,
                time_estimate_minutes: self
                    .config
                    .follow_up_minutes
                    .min(slot.draft.time_estimate_minutes),
                topic: slot.draft.topic.clone(),
            },
            typed: true,
            weak_rank: slot.weak_rank,
            follow_up: true,
            day_hint: slot.day_hint,
            order: slot.order,
        }
    }

    /// Schedule spaced reviews after each weak-topic task, most pressing
    /// topics first while capacity lasts
    fn add_weak_follow_ups(&self, buckets: &mut [Vec<Slot>]) {
        let mut pending: Vec<(usize, Slot)> = Vec::new();
        for (day, slots) in buckets.iter().enumerate() {
            for slot in slots.iter().filter(|slot| slot.weak_rank.is_some()) {
                for gap in &self.config.weak_follow_up_gaps {
                    let target = day + *gap as usize;
                    if target < buckets.len() {
                        pending.push((target, self.follow_up_of(slot)));
                    }
                }
            }
        }
        pending.sort_by_key(|(target, slot)| (slot.weak_rank, *target));

        for (target, slot) in pending {
            if buckets[target].len() < self.config.max_tasks_per_day {
                buckets[target].push(slot);
            } else {
                tracing::debug!(day = target + 1, title = %slot.draft.title, "no room for follow-up");
            }
        }
    }

    /// Fill days below the minimum with reviews of earlier tasks
    fn top_up_thin_days(&self, buckets: &mut [Vec<Slot>]) {
        for day in 1..buckets.len() {
            let (earlier, rest) = buckets.split_at_mut(day);
            let today = &mut rest[0];

            while today.len() < self.config.min_tasks_per_day {
                let candidate = earlier
                    .iter()
                    .flatten()
                    .filter(|slot| !slot.follow_up)
                    .filter(|slot| {
                        let review = format!("Spaced review: {}", slot.draft.title);
                        !today.iter().any(|existing| existing.draft.title == review)
                    })
                    .min_by_key(|slot| slot.weak_rank.unwrap_or(usize::MAX));

                match candidate {
                    Some(slot) => {
                        let review = self.follow_up_of(slot);
                        today.push(review);
                    }
                    None => break,
                }
            }
        }
    }
}

fn check_duration(duration_days: u32) -> Result<()> {
    if duration_days == 0 || duration_days > MAX_PLAN_DAYS {
        return Err(EngineError::InvalidDuration(duration_days));
    }
    Ok(())
}

/// Cut `slots` into `days` contiguous buckets of near-equal size
fn bucket(slots: Vec<Slot>, days: usize) -> Vec<Vec<Slot>> {
    let total = slots.len();
    let mut buckets: Vec<Vec<Slot>> = (0..days).map(|_| Vec::new()).collect();
    for (idx, slot) in slots.into_iter().enumerate() {
        buckets[idx * days / total].push(slot);
    }
    buckets
}

/// Give untyped tasks whichever rotation type the day has least of
fn assign_missing_types(day: &mut [Slot]) {
    let mut counts: HashMap<TaskType, usize> = HashMap::new();
    for slot in day.iter().filter(|slot| slot.typed) {
        *counts.entry(slot.draft.task_type).or_default() += 1;
    }
    for slot in day.iter_mut().filter(|slot| !slot.typed) {
        let pick = TYPE_ROTATION
            .iter()
            .copied()
            .min_by_key(|task_type| counts.get(task_type).copied().unwrap_or(0))
            .unwrap_or_default();
        *counts.entry(pick).or_default() += 1;
        slot.draft.task_type = pick;
        slot.typed = true;
    }
}

/// Retag the last task of a single-type day
fn diversify(day: &mut [Slot]) {
    if day.len() < 2 {
        return;
    }
    let first = day[0].draft.task_type;
    if day.iter().any(|slot| slot.draft.task_type != first) {
        return;
    }
    if let Some(last) = day.last_mut() {
        last.draft.task_type = match first {
            TaskType::Practice => TaskType::ActiveRecall,
            TaskType::ActiveRecall => TaskType::Practice,
            _ => TaskType::ActiveRecall,
        };
    }
}

// ============================================================================
// TESTS
// ============================================================================
