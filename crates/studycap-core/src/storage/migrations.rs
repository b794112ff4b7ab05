//! Schema Migrations
//!
//! Ordered, versioned DDL. A fresh database runs every step; an existing one
//! runs only the steps above its recorded `schema_version`.

/// Every schema step, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: flashcards and weak points",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Study plans, plan tasks and calendar blocks",
        up: MIGRATION_V2_UP,
    },
];

/// One schema step
#[derive(Debug, Clone)]
pub struct Migration {
    /// Monotonic step number
    pub version: u32,
    /// Shown in the migration log
    pub description: &'static str,
    /// DDL batch
    pub up: &'static str,
}

/// V1: flashcards and weak points
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS flashcards (
    id TEXT PRIMARY KEY,
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    topic TEXT,
    created_at TEXT NOT NULL,

    -- SM-2 state
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 0,
    repetitions INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at TEXT,
    next_review_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_flashcards_next_review ON flashcards(next_review_at);

-- Keyed by the normalized topic so case variants share one row
CREATE TABLE IF NOT EXISTS weak_points (
    topic_key TEXT PRIMARY KEY,
    topic TEXT NOT NULL,
    count INTEGER NOT NULL CHECK (count > 0),
    last_failed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Plans and calendar
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS study_plans (
    id TEXT PRIMARY KEY,
    goal TEXT NOT NULL,
    duration_days INTEGER NOT NULL CHECK (duration_days > 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plan_tasks (
    id TEXT PRIMARY KEY,
    plan_id TEXT NOT NULL REFERENCES study_plans(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    task_type TEXT NOT NULL DEFAULT 'study',
    day_number INTEGER NOT NULL CHECK (day_number > 0),
    time_estimate_minutes INTEGER NOT NULL DEFAULT 30,
    status TEXT NOT NULL DEFAULT 'pending',
    completed_at TEXT,
    mastery_verified INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_plan_tasks_plan_day ON plan_tasks(plan_id, day_number);

-- task_id is a lookup reference only; deleting a task leaves the block
CREATE TABLE IF NOT EXISTS study_blocks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    subject TEXT,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    task_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_study_blocks_start ON study_blocks(start_time);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (2, datetime('now'));
"#;

/// Highest applied step, 0 for a new database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Run every step above the current version; returns how many ran
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
