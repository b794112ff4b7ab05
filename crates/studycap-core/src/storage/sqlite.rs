//! SQLite Storage Implementation
//!
//! Persistence collaborator for cards, weak points, plans and calendar
//! blocks. The engine itself never touches the database; hosts load a
//! snapshot, run engine operations, and write the result back here.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::EngineError;
use crate::plan::{PlanTask, Replan, StudyPlan, TaskStatus, TaskType};
use crate::review::{Flashcard, ReviewItem};
use crate::weak_points::{WeakPoint, WeakPointTracker};
use crate::workload::StudyBlock;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Engine rejected stored data
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed store.
///
/// Uses separate reader/writer connections; all methods take `&self`.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl Storage {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("STUDYCAP_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "studycap", "studycap").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join("studycap.db"))
    }

    /// Open (creating if needed) the database at `db_path`, or the default
    /// location when `None`
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::debug!(path = %path.display(), applied, "database migrated");
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // FLASHCARDS
    // ========================================================================

    /// Insert or replace a card with its review state
    pub fn save_card(&self, card: &Flashcard) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO flashcards (
                id, front, back, topic, created_at,
                ease_factor, interval_days, repetitions, last_reviewed_at, next_review_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                front = excluded.front,
                back = excluded.back,
                topic = excluded.topic,
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                last_reviewed_at = excluded.last_reviewed_at,
                next_review_at = excluded.next_review_at",
            params![
                card.item.id,
                card.front,
                card.back,
                card.topic,
                card.created_at.to_rfc3339(),
                card.item.ease_factor,
                card.item.interval_days,
                card.item.repetitions,
                card.item.last_reviewed_at.map(|dt| dt.to_rfc3339()),
                card.item.next_review_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a card by id
    pub fn get_card(&self, id: &str) -> Result<Option<Flashcard>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM flashcards WHERE id = ?1")?;
        let card = stmt
            .query_row(params![id], |row| Self::row_to_card(row))
            .optional()?;
        Ok(card)
    }

    /// All cards, soonest review first
    pub fn list_cards(&self) -> Result<Vec<Flashcard>> {
        let reader = self.reader()?;
        let mut stmt =
            reader.prepare("SELECT * FROM flashcards ORDER BY next_review_at ASC, created_at ASC")?;
        let cards = stmt
            .query_map([], |row| Self::row_to_card(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Delete a card; returns whether it existed
    pub fn delete_card(&self, id: &str) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute("DELETE FROM flashcards WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // ========================================================================
    // WEAK POINTS
    // ========================================================================

    /// Load the learner's weak points
    pub fn load_weak_points(&self) -> Result<WeakPointTracker> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT topic, count, last_failed_at FROM weak_points")?;
        let points = stmt
            .query_map([], |row| {
                let last_failed_at: String = row.get("last_failed_at")?;
                Ok(WeakPoint {
                    topic: row.get("topic")?,
                    count: row.get("count")?,
                    last_failed_at: Self::parse_timestamp(&last_failed_at, "last_failed_at")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(WeakPointTracker::from_points(points))
    }

    /// Replace the stored weak points with `tracker`
    pub fn save_weak_points(&self, tracker: &WeakPointTracker) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        tx.execute("DELETE FROM weak_points", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO weak_points (topic_key, topic, count, last_failed_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for point in tracker.iter() {
                stmt.execute(params![
                    point.key().as_str(),
                    point.topic,
                    point.count,
                    point.last_failed_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // PLANS
    // ========================================================================

    /// Insert a plan together with its tasks
    pub fn insert_plan(&self, plan: &StudyPlan, tasks: &[PlanTask]) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        tx.execute(
            "INSERT INTO study_plans (id, goal, duration_days, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![plan.id, plan.goal, plan.duration_days, plan.created_at.to_rfc3339()],
        )?;
        Self::insert_tasks(&tx, tasks)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_tasks(conn: &Connection, tasks: &[PlanTask]) -> Result<()> {
        let mut stmt = conn.prepare(
            "INSERT INTO plan_tasks (
                id, plan_id, title, description, task_type, day_number,
                time_estimate_minutes, status, completed_at, mastery_verified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for task in tasks {
            stmt.execute(params![
                task.id,
                task.plan_id,
                task.title,
                task.description,
                task.task_type.as_str(),
                task.day_number,
                task.time_estimate_minutes,
                task.status.as_str(),
                task.completed_at.map(|dt| dt.to_rfc3339()),
                task.mastery_verified,
            ])?;
        }
        Ok(())
    }

    /// Get a plan by id
    pub fn get_plan(&self, id: &str) -> Result<Option<StudyPlan>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM study_plans WHERE id = ?1")?;
        let plan = stmt
            .query_row(params![id], |row| Self::row_to_plan(row))
            .optional()?;
        Ok(plan)
    }

    /// Get a plan by id or fail with [`StorageError::NotFound`]
    pub fn require_plan(&self, id: &str) -> Result<StudyPlan> {
        self.get_plan(id)?
            .ok_or_else(|| StorageError::NotFound(format!("plan {}", id)))
    }

    /// All plans, newest first
    pub fn list_plans(&self) -> Result<Vec<StudyPlan>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM study_plans ORDER BY created_at DESC")?;
        let plans = stmt
            .query_map([], |row| Self::row_to_plan(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(plans)
    }

    /// Delete a plan and, by cascade, its tasks
    pub fn delete_plan(&self, id: &str) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute("DELETE FROM study_plans WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Tasks of a plan ordered by day
    pub fn get_plan_tasks(&self, plan_id: &str) -> Result<Vec<PlanTask>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM plan_tasks WHERE plan_id = ?1 ORDER BY day_number ASC, rowid ASC",
        )?;
        let tasks = stmt
            .query_map(params![plan_id], |row| Self::row_to_task(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Get a task by id
    pub fn get_task(&self, id: &str) -> Result<Option<PlanTask>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM plan_tasks WHERE id = ?1")?;
        let task = stmt
            .query_row(params![id], |row| Self::row_to_task(row))
            .optional()?;
        Ok(task)
    }

    /// Persist a task's completion state
    pub fn update_task_status(&self, task: &PlanTask) -> Result<()> {
        let writer = self.writer()?;
        let rows = writer.execute(
            "UPDATE plan_tasks SET status = ?1, completed_at = ?2, mastery_verified = ?3
             WHERE id = ?4",
            params![
                task.status.as_str(),
                task.completed_at.map(|dt| dt.to_rfc3339()),
                task.mastery_verified,
                task.id,
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::NotFound(format!("task {}", task.id)));
        }
        Ok(())
    }

    /// Write a replan atomically: discarded tasks are deleted and the new
    /// tasks inserted. Completed tasks are not touched.
    pub fn apply_replan(&self, replan: Replan) -> Result<Vec<PlanTask>> {
        let discarded: Vec<String> = replan.discarded.iter().map(|t| t.id.clone()).collect();
        let kept: HashSet<String> = replan.completed.iter().map(|t| t.id.clone()).collect();
        let plan_id = replan.plan.id.clone();
        let tasks = replan.apply()?;

        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        {
            let mut delete = tx.prepare(
                "DELETE FROM plan_tasks WHERE id = ?1 AND plan_id = ?2 AND status = 'pending'",
            )?;
            for id in &discarded {
                delete.execute(params![id, plan_id])?;
            }
        }
        let fresh: Vec<PlanTask> = tasks
            .iter()
            .filter(|task| !kept.contains(&task.id))
            .cloned()
            .collect();
        Self::insert_tasks(&tx, &fresh)?;
        tx.commit()?;

        Ok(tasks)
    }

    // ========================================================================
    // STUDY BLOCKS
    // ========================================================================

    /// Insert a calendar block
    pub fn insert_block(&self, block: &StudyBlock) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO study_blocks (id, title, subject, start_time, end_time, completed, task_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                block.id,
                block.title,
                block.subject,
                block.start_time.to_rfc3339(),
                block.end_time.to_rfc3339(),
                block.completed,
                block.task_id,
            ],
        )?;
        Ok(())
    }

    /// Mark a block finished
    pub fn complete_block(&self, id: &str) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute(
            "UPDATE study_blocks SET completed = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    /// All blocks in start order
    pub fn list_blocks(&self) -> Result<Vec<StudyBlock>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM study_blocks ORDER BY start_time ASC")?;
        let blocks = stmt
            .query_map([], |row| Self::row_to_block(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(blocks)
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(StorageError::InvalidTimestamp(format!(
                        "{} '{}': {}",
                        field_name, value, e
                    ))),
                )
            })
    }

    fn parse_optional_timestamp(
        value: Option<String>,
        field_name: &str,
    ) -> rusqlite::Result<Option<DateTime<Utc>>> {
        value
            .map(|v| Self::parse_timestamp(&v, field_name))
            .transpose()
    }

    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<Flashcard> {
        let created_at: String = row.get("created_at")?;
        let next_review_at: String = row.get("next_review_at")?;
        Ok(Flashcard {
            item: ReviewItem {
                id: row.get("id")?,
                ease_factor: row.get("ease_factor")?,
                interval_days: row.get("interval_days")?,
                repetitions: row.get("repetitions")?,
                last_reviewed_at: Self::parse_optional_timestamp(
                    row.get("last_reviewed_at")?,
                    "last_reviewed_at",
                )?,
                next_review_at: Self::parse_timestamp(&next_review_at, "next_review_at")?,
            },
            front: row.get("front")?,
            back: row.get("back")?,
            topic: row.get("topic")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    fn row_to_plan(row: &rusqlite::Row) -> rusqlite::Result<StudyPlan> {
        let created_at: String = row.get("created_at")?;
        Ok(StudyPlan {
            id: row.get("id")?,
            goal: row.get("goal")?,
            duration_days: row.get("duration_days")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
        })
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<PlanTask> {
        let task_type: String = row.get("task_type")?;
        let status: String = row.get("status")?;
        Ok(PlanTask {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            task_type: TaskType::parse_name(&task_type),
            day_number: row.get("day_number")?,
            time_estimate_minutes: row.get("time_estimate_minutes")?,
            status: TaskStatus::parse_name(&status),
            completed_at: Self::parse_optional_timestamp(row.get("completed_at")?, "completed_at")?,
            mastery_verified: row.get("mastery_verified")?,
        })
    }

    fn row_to_block(row: &rusqlite::Row) -> rusqlite::Result<StudyBlock> {
        let start_time: String = row.get("start_time")?;
        let end_time: String = row.get("end_time")?;
        Ok(StudyBlock {
            id: row.get("id")?,
            title: row.get("title")?,
            subject: row.get("subject")?,
            start_time: Self::parse_timestamp(&start_time, "start_time")?,
            end_time: Self::parse_timestamp(&end_time, "end_time")?,
            completed: row.get("completed")?,
            task_id: row.get("task_id")?,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
