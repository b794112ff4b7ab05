//! Weak-Point Tracker
//!
//! A per-learner counter of topics the learner keeps failing. Failures bump
//! the counter, mastery signals decrement it, and an entry that reaches zero
//! is pruned. The top entries bias plan allocation toward those topics.
//!
//! Topics are matched case-insensitively. The key is normalized once when a
//! topic enters the tracker (and once per lookup), never compared ad hoc.
//!
//! The tracker is an explicit value owned by the learner's session. It has no
//! global state; persistence is the caller's job (it round-trips through
//! serde as a plain list of [`WeakPoint`]s).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TOPIC KEY
// ============================================================================

/// Normalized topic key.
///
/// Leading/trailing whitespace is trimmed, inner whitespace runs collapse to a
/// single space, and letters are lower-cased with Unicode rules
/// (`str::to_lowercase`), so `"Mitosis"`, `" mitosis "` and `"MITOSIS"` share
/// one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey(String);

impl TopicKey {
    /// Normalize a raw topic
    pub fn new(topic: &str) -> Self {
        let collapsed = topic.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(collapsed.to_lowercase())
    }

    /// The normalized text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for topics that were blank before normalization
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `text` mentions this topic as whole words.
    ///
    /// Both sides are split on anything that is not alphanumeric, so `"art"`
    /// matches `"Art history"` and `"pop-art"` but not `"Start the essay"`.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let needle = words(&self.0);
        if needle.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        let haystack = words(&lowered);
        haystack.windows(needle.len()).any(|window| window == needle.as_slice())
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

impl std::fmt::Display for TopicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// WEAK POINT
// ============================================================================

/// A topic the learner is struggling with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakPoint {
    /// Topic as first recorded (display form)
    pub topic: String,
    /// Outstanding failures; an entry with zero is removed
    pub count: u32,
    /// Most recent failure
    pub last_failed_at: DateTime<Utc>,
}

impl WeakPoint {
    /// Normalized key of this topic
    pub fn key(&self) -> TopicKey {
        TopicKey::new(&self.topic)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: TopicKey,
    point: WeakPoint,
}

// ============================================================================
// TUTOR VERDICTS
// ============================================================================

/// Mastery assessment from a tutor check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    /// The concept is not understood yet
    #[default]
    NeedsWork,
    /// Partially understood
    Partial,
    /// Fully understood
    Mastered,
}

impl MasteryLevel {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::NeedsWork => "needs_work",
            MasteryLevel::Partial => "partial",
            MasteryLevel::Mastered => "mastered",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mastered" => MasteryLevel::Mastered,
            "partial" => MasteryLevel::Partial,
            _ => MasteryLevel::NeedsWork,
        }
    }
}

/// Outcome of a tutor's answer verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorVerdict {
    /// Whether the answer showed understanding
    pub correct: bool,
    /// Assessed mastery
    pub mastery_level: MasteryLevel,
}

/// What a signal did to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeakPointChange {
    /// Failure recorded; holds the new count
    Failed(u32),
    /// Mastery recorded; holds the remaining count (0 means pruned)
    Mastered(u32),
    /// Nothing changed
    Unchanged,
}

// ============================================================================
// TRACKER
// ============================================================================

/// Case-insensitive, insertion-ordered topic counter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<WeakPoint>", into = "Vec<WeakPoint>")]
pub struct WeakPointTracker {
    entries: Vec<Entry>,
}

impl WeakPointTracker {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted points, merging case-variant duplicates and
    /// dropping zero counts
    pub fn from_points(points: impl IntoIterator<Item = WeakPoint>) -> Self {
        let mut tracker = Self::new();
        for point in points {
            let key = point.key();
            if key.is_empty() || point.count == 0 {
                continue;
            }
            match tracker.position(&key) {
                Some(idx) => {
                    let existing = &mut tracker.entries[idx].point;
                    existing.count = existing.count.saturating_add(point.count);
                    existing.last_failed_at = existing.last_failed_at.max(point.last_failed_at);
                }
                None => tracker.entries.push(Entry { key, point }),
            }
        }
        tracker
    }

    fn position(&self, key: &TopicKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }

    /// Record a failure on `topic`; returns the new count
    pub fn record_failure(&mut self, topic: &str, now: DateTime<Utc>) -> u32 {
        let key = TopicKey::new(topic);
        if key.is_empty() {
            tracing::debug!("ignoring failure for blank topic");
            return 0;
        }

        let count = match self.position(&key) {
            Some(idx) => {
                let point = &mut self.entries[idx].point;
                point.count = point.count.saturating_add(1);
                point.last_failed_at = now;
                point.count
            }
            None => {
                self.entries.push(Entry {
                    key: key.clone(),
                    point: WeakPoint {
                        topic: topic.trim().to_string(),
                        count: 1,
                        last_failed_at: now,
                    },
                });
                1
            }
        };

        tracing::debug!(topic = %key, count, "weak point failure recorded");
        count
    }

    /// Record mastery of `topic`.
    ///
    /// Returns `None` if the topic is not tracked, otherwise the remaining
    /// count; `Some(0)` means the entry was removed.
    pub fn record_mastery(&mut self, topic: &str) -> Option<u32> {
        let key = TopicKey::new(topic);
        let idx = self.position(&key)?;

        let remaining = {
            let point = &mut self.entries[idx].point;
            point.count = point.count.saturating_sub(1);
            point.count
        };
        if remaining == 0 {
            self.entries.remove(idx);
            tracing::debug!(topic = %key, "weak point cleared");
        }
        Some(remaining)
    }

    /// Apply a tutor verdict: wrong answers count as failures, mastered
    /// answers as mastery, anything else is ignored
    pub fn apply_verdict(&mut self, topic: &str, verdict: TutorVerdict, now: DateTime<Utc>) -> WeakPointChange {
        if !verdict.correct {
            WeakPointChange::Failed(self.record_failure(topic, now))
        } else if verdict.mastery_level == MasteryLevel::Mastered {
            match self.record_mastery(topic) {
                Some(remaining) => WeakPointChange::Mastered(remaining),
                None => WeakPointChange::Unchanged,
            }
        } else {
            WeakPointChange::Unchanged
        }
    }

    /// Drop a topic regardless of its count
    pub fn remove(&mut self, topic: &str) -> bool {
        let key = TopicKey::new(topic);
        match self.position(&key) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether `topic` is currently weak
    pub fn is_weak(&self, topic: &str) -> bool {
        self.position(&TopicKey::new(topic)).is_some()
    }

    /// Outstanding count for `topic` (0 if untracked)
    pub fn count(&self, topic: &str) -> u32 {
        self.get(topic).map(|point| point.count).unwrap_or(0)
    }

    /// Look up a topic
    pub fn get(&self, topic: &str) -> Option<&WeakPoint> {
        self.position(&TopicKey::new(topic))
            .map(|idx| &self.entries[idx].point)
    }

    /// The `n` highest counts; ties keep insertion order
    pub fn top_weak(&self, n: usize) -> Vec<&WeakPoint> {
        let mut points: Vec<&WeakPoint> = self.entries.iter().map(|entry| &entry.point).collect();
        points.sort_by(|a, b| b.count.cmp(&a.count));
        points.truncate(n);
        points
    }

    /// Topic names of [`top_weak`](Self::top_weak), for plan allocation
    pub fn weak_topics(&self, n: usize) -> Vec<String> {
        self.top_weak(n)
            .into_iter()
            .map(|point| point.topic.clone())
            .collect()
    }

    /// All points in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &WeakPoint> {
        self.entries.iter().map(|entry| &entry.point)
    }

    /// Number of tracked topics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<WeakPoint>> for WeakPointTracker {
    fn from(points: Vec<WeakPoint>) -> Self {
        Self::from_points(points)
    }
}

impl From<WeakPointTracker> for Vec<WeakPoint> {
    fn from(tracker: WeakPointTracker) -> Self {
        tracker.entries.into_iter().map(|entry| entry.point).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
