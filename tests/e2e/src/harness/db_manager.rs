//! Throwaway Databases
//!
//! Each test gets its own SQLite file, optionally seeded with cards, that can
//! be reopened to check what survives a restart.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use studycap_core::{Flashcard, Storage};
use tempfile::TempDir;

/// One storage instance per test.
///
/// A temp-dir database disappears with the manager.
///
/// # Example
///
/// ```rust,ignore
/// let mut db = TestDatabaseManager::new_temp();
///
/// db.seed_cards(10);
/// let cards = db.storage.list_cards()?;
///
/// // the file goes away with `db`
/// ```
pub struct TestDatabaseManager {
    /// Open storage
    pub storage: Storage,
    /// Owns the temp dir for as long as the manager lives
    _temp_dir: Option<TempDir>,
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Fresh database inside a new temp dir
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_studycap.db");

        let storage = Storage::new(Some(db_path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Database at `path`; the caller cleans it up
    pub fn new_at_path(path: PathBuf) -> Self {
        let storage = Storage::new(Some(path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Location of the SQLite file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Close and reopen the database, as an application restart would
    pub fn reopen(&mut self) {
        self.storage = Storage::new(Some(self.db_path.clone())).expect("Failed to reopen storage");
    }

    /// Check if the database holds no cards, plans or blocks
    pub fn is_empty(&self) -> bool {
        self.card_count() == 0
            && self.storage.list_plans().map(|p| p.is_empty()).unwrap_or(true)
            && self.storage.list_blocks().map(|b| b.is_empty()).unwrap_or(true)
    }

    /// Get the number of cards in the database
    pub fn card_count(&self) -> usize {
        self.storage.list_cards().map(|c| c.len()).unwrap_or(0)
    }

    /// Seed the database with new cards, all due now
    pub fn seed_cards(&mut self, count: usize) -> Vec<String> {
        let now = Utc::now();
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let mut card = Flashcard::new(format!("Question {}", i), format!("Answer {}", i), now);
            card.topic = Some(format!("Topic {}", i % 3));
            if self.storage.save_card(&card).is_ok() {
                ids.push(card.item.id);
            }
        }

        ids
    }

    /// Seed cards whose next review is `offsets_hours` away from `now`
    /// (negative offsets are overdue)
    pub fn seed_scheduled(&mut self, now: DateTime<Utc>, offsets_hours: &[i64]) -> Vec<String> {
        let mut ids = Vec::with_capacity(offsets_hours.len());

        for (i, offset) in offsets_hours.iter().enumerate() {
            let mut card = Flashcard::new(format!("Scheduled {}", i), "Answer", now - Duration::days(30));
            card.item.repetitions = 2;
            card.item.interval_days = 6;
            card.item.last_reviewed_at = Some(now - Duration::days(6));
            card.item.next_review_at = now + Duration::hours(*offset);
            if self.storage.save_card(&card).is_ok() {
                ids.push(card.item.id);
            }
        }

        ids
    }

    /// Delete every card
    pub fn clear_cards(&mut self) {
        if let Ok(cards) = self.storage.list_cards() {
            for card in cards {
                let _ = self.storage.delete_card(card.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_database_starts_empty() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_and_clear() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_cards(5);
        assert_eq!(ids.len(), 5);
        assert_eq!(db.card_count(), 5);

        db.clear_cards();
        assert!(db.is_empty());
    }

    #[test]
    fn test_reopen_keeps_cards() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_cards(3);
        db.reopen();
        assert_eq!(db.card_count(), 3);
    }
}
