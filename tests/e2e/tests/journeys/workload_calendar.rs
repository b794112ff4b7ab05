//! Journey: fill a study calendar and read back the workload
//!
//! Blocks go through storage so timestamps and completion flags are
//! exercised end to end.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use studycap_core::workload::DEFAULT_SUBJECT;
use studycap_core::{day_workload, subject_progress, week_workload, StudyBlock, WorkloadBand};
use studycap_e2e_tests::{TestDataFactory, TestDatabaseManager};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_band_thresholds_through_storage() {
    let db = TestDatabaseManager::new_temp();
    let day = monday();

    let cases = [
        (0, WorkloadBand::None),
        (90, WorkloadBand::Low),
        (179, WorkloadBand::Low),
        (180, WorkloadBand::Medium),
        (359, WorkloadBand::Medium),
        (360, WorkloadBand::High),
    ];
    for (offset, (minutes, band)) in cases.into_iter().enumerate() {
        let date = day + Duration::days(offset as i64);
        if minutes > 0 {
            db.storage
                .insert_block(&TestDataFactory::block(date, 8, minutes, Some("Physics")))
                .unwrap();
        }
        let blocks = db.storage.list_blocks().unwrap();
        assert_eq!(day_workload(&blocks, date).band, band, "{} minutes", minutes);
    }
}

#[test]
fn test_hours_sum_across_blocks() {
    let db = TestDatabaseManager::new_temp();
    let day = monday();
    for (hour, minutes) in [(8, 60), (10, 90), (14, 45), (19, 75)] {
        db.storage
            .insert_block(&TestDataFactory::block(day, hour, minutes, None))
            .unwrap();
    }

    let workload = day_workload(&db.storage.list_blocks().unwrap(), day);
    assert_eq!(workload.blocks, 4);
    assert!(approx_eq(workload.total_hours, 4.5));
    assert_eq!(workload.band, WorkloadBand::Medium);
}

#[test]
fn test_overlapping_blocks_are_summed() {
    let db = TestDatabaseManager::new_temp();
    let day = monday();
    db.storage
        .insert_block(&TestDataFactory::block(day, 9, 240, Some("Chemistry")))
        .unwrap();
    db.storage
        .insert_block(&TestDataFactory::block(day, 10, 180, Some("Biology")))
        .unwrap();

    let workload = day_workload(&db.storage.list_blocks().unwrap(), day);
    assert!(approx_eq(workload.total_hours, 7.0));
    assert_eq!(workload.band, WorkloadBand::High);
}

#[test]
fn test_block_counts_toward_its_start_day() {
    let db = TestDatabaseManager::new_temp();
    let day = monday();
    db.storage
        .insert_block(&TestDataFactory::block(day, 22, 180, Some("Night owl")))
        .unwrap();
    let blocks = db.storage.list_blocks().unwrap();

    assert!(approx_eq(day_workload(&blocks, day).total_hours, 3.0));
    assert_eq!(day_workload(&blocks, day + Duration::days(1)).band, WorkloadBand::None);
}

#[test]
fn test_inverted_block_counts_as_nothing() {
    let db = TestDatabaseManager::new_temp();
    let day = monday();
    let start = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
    let inverted = StudyBlock::new("Backwards", start, start - Duration::hours(2));
    db.storage.insert_block(&inverted).unwrap();

    let workload = day_workload(&db.storage.list_blocks().unwrap(), day);
    assert_eq!(workload.blocks, 1);
    assert!(approx_eq(workload.total_hours, 0.0));
    assert_eq!(workload.band, WorkloadBand::None);
}

#[test]
fn test_week_view() {
    let db = TestDatabaseManager::new_temp();
    let start = monday();
    // Heavy Monday, light Wednesday, nothing else, one block the week after
    for hour in [8, 10, 13, 15] {
        db.storage
            .insert_block(&TestDataFactory::block(start, hour, 90, Some("Exams")))
            .unwrap();
    }
    db.storage
        .insert_block(&TestDataFactory::block(start + Duration::days(2), 9, 30, None))
        .unwrap();
    db.storage
        .insert_block(&TestDataFactory::block(start + Duration::days(7), 9, 600, None))
        .unwrap();

    let week = week_workload(&db.storage.list_blocks().unwrap(), start);
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, start);
    assert_eq!(week[6].date, start + Duration::days(6));

    let bands: Vec<WorkloadBand> = week.iter().map(|d| d.band).collect();
    assert_eq!(
        bands,
        vec![
            WorkloadBand::High,
            WorkloadBand::None,
            WorkloadBand::Low,
            WorkloadBand::None,
            WorkloadBand::None,
            WorkloadBand::None,
            WorkloadBand::None,
        ]
    );
    let total: f64 = week.iter().map(|d| d.total_hours).sum();
    assert!(approx_eq(total, 6.5));
}

#[test]
fn test_subject_progress_after_completing_blocks() {
    let db = TestDatabaseManager::new_temp();
    let day = monday();

    let mut ids = Vec::new();
    for (hour, minutes, subject) in [
        (8, 60, Some("Math")),
        (9, 120, Some("Math")),
        (12, 90, Some("History")),
        (15, 30, None),
        (17, 60, Some("Art")),
    ] {
        let block = TestDataFactory::block(day, hour, minutes, subject);
        db.storage.insert_block(&block).unwrap();
        ids.push(block.id);
    }

    // Finish the first Math block, the History block and the untitled one
    for idx in [0, 2, 3] {
        assert!(db.storage.complete_block(&ids[idx]).unwrap());
    }
    assert!(!db.storage.complete_block("no-such-block").unwrap());

    let progress = subject_progress(&db.storage.list_blocks().unwrap());
    let names: Vec<&str> = progress.iter().map(|p| p.subject.as_str()).collect();
    assert_eq!(names, vec!["History", "Math", DEFAULT_SUBJECT, "Art"]);

    let math = &progress[1];
    assert_eq!(math.blocks, 2);
    assert_eq!(math.completed_blocks, 1);
    assert!(approx_eq(math.scheduled_hours, 3.0));
    assert!(approx_eq(math.completed_hours, 1.0));

    let art = &progress[3];
    assert_eq!(art.completed_blocks, 0);
    assert!(approx_eq(art.completed_hours, 0.0));
}

#[test]
fn test_blocks_linked_to_plan_tasks_survive_restart() {
    let mut db = TestDatabaseManager::new_temp();
    let day = monday();
    let block = TestDataFactory::block(day, 18, 45, Some("Genetics")).for_task("task-123");
    db.storage.insert_block(&block).unwrap();

    db.reopen();
    let blocks = db.storage.list_blocks().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0], block);
    assert_eq!(blocks[0].task_id.as_deref(), Some("task-123"));
    assert!(approx_eq(blocks[0].duration_hours(), 0.75));
}
