//! Test doubles and fixtures


pub use fixtures::{RecordingContentSource, TestDataFactory};
