//! Storage Module
//!
//! SQLite persistence collaborator with:
//! - Flashcards with decimal ease factors and RFC 3339 timestamps
//! - Weak points keyed by normalized topic
//! - Plans with cascading task deletion
//! - Calendar blocks for workload aggregation

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, Storage, StorageError};
