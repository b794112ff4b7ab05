//! Journey: create a study plan, fall behind, replan
//!
//! Covers allocation from a content-service response, weak-topic
//! prioritization, completion, replanning mid-plan and after the horizon,
//! and cascade deletion.

use chrono::{Duration, Utc};
use studycap_core::plan::{completed_count, tasks_for_day, todays_tasks};
use studycap_core::{
    ContentError, EngineError, PlanAllocator, PlanMode, PlanProgress, ReplanEngine,
    StaticContentSource, StudyPlan, TaskStatus, TaskType, WeakPointTracker,
};
use studycap_e2e_tests::{RecordingContentSource, TestDataFactory, TestDatabaseManager};

#[test]
fn test_create_plan_from_content_response() {
    let db = TestDatabaseManager::new_temp();
    let source =
        StaticContentSource::from_response(&TestDataFactory::content_response("Thermodynamics", 15))
            .unwrap();

    let (plan, tasks) = PlanAllocator::default()
        .create_plan("Thermodynamics", 5, &[], &source, Utc::now())
        .unwrap();
    db.storage.insert_plan(&plan, &tasks).unwrap();

    let stored = db.storage.get_plan_tasks(&plan.id).unwrap();
    assert_eq!(stored.len(), 15);
    for day in 1..=5 {
        let day_tasks = tasks_for_day(&stored, &plan.id, day);
        assert_eq!(day_tasks.len(), 3);
        assert!(day_tasks.iter().all(|t| t.status == TaskStatus::Pending));
    }
    assert!(stored.iter().all(|t| t.time_estimate_minutes > 0));
    assert_eq!(PlanProgress::of(&stored).percent, 0.0);
}

#[test]
fn test_weak_topics_come_earlier_and_more_often() {
    let now = Utc::now();
    let mut weak_points = WeakPointTracker::new();
    weak_points.record_failure("Enzymes", now);
    weak_points.record_failure("enzymes", now);

    let pairs = [
        ("Cell membranes", "Membranes"),
        ("Osmosis lab", "Osmosis"),
        ("Respiration overview", "Respiration"),
        ("DNA replication", "DNA"),
        ("Protein synthesis", "Proteins"),
        ("Enzyme kinetics drill", "Enzymes"),
        ("Photosynthesis", "Photosynthesis"),
    ];
    let proposals = TestDataFactory::proposals_with_topics(&pairs);
    let source = RecordingContentSource::new().then_respond(proposals.clone());

    let allocator = PlanAllocator::default();
    let weak = weak_points.weak_topics(5);
    let with_weak = allocator.allocate("Biology", 7, &weak, &source).unwrap();
    let without = allocator
        .allocate("Biology", 7, &[], &StaticContentSource::new(proposals))
        .unwrap();

    let requests = source.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].weak_topics, vec!["Enzymes".to_string()]);
    assert_eq!(requests[0].mode, PlanMode::Generate);

    let first_day = |drafts: &[studycap_core::PlanTaskDraft]| {
        drafts
            .iter()
            .filter(|d| d.title.contains("Enzyme"))
            .map(|d| d.day_number)
            .min()
            .unwrap()
    };
    let occurrences = |drafts: &[studycap_core::PlanTaskDraft]| {
        drafts.iter().filter(|d| d.title.contains("Enzyme")).count()
    };

    assert_eq!(first_day(&with_weak), 1);
    assert!(first_day(&with_weak) < first_day(&without));
    assert!(occurrences(&with_weak) > occurrences(&without));
    assert!(with_weak
        .iter()
        .any(|d| d.task_type == TaskType::SpacedReview && d.title.contains("Enzyme")));
}

#[test]
fn test_replan_on_third_day_keeps_history() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let source = StaticContentSource::new(TestDataFactory::proposals("Genetics", 14));
    let (plan, _) = TestDataFactory::create_started_plan(&db.storage, "Genetics", 7, 2, now, &source);
    assert_eq!(plan.current_day(now), 3);
    assert_eq!(plan.remaining_days(now), 5);

    // Two tasks done on day one
    let mut completed_ids = Vec::new();
    for mut task in db
        .storage
        .get_plan_tasks(&plan.id)
        .unwrap()
        .into_iter()
        .filter(|t| t.day_number == 1)
        .take(2)
    {
        assert!(task.complete(plan.created_at + Duration::hours(3), false));
        db.storage.update_task_status(&task).unwrap();
        completed_ids.push((task.id.clone(), task.completed_at));
    }
    let before = db.storage.get_plan_tasks(&plan.id).unwrap();
    let backlog: Vec<String> = before
        .iter()
        .filter(|t| t.day_number < 3 && !t.is_completed())
        .map(|t| t.id.clone())
        .collect();

    let fresh = RecordingContentSource::new()
        .then_respond(TestDataFactory::proposals("Genetics review", 10));
    let engine = ReplanEngine::default();
    assert!(engine.needs_replan(&plan, &before, now));
    let replan = engine.replan(&plan, &before, &[], now, &fresh).unwrap();

    assert_eq!(replan.window.first_day, 3);
    assert_eq!(replan.window.last_day, 7);
    assert!(!replan.window.catch_up);
    assert_eq!(fresh.requests()[0].duration_days, 5);
    assert_eq!(fresh.requests()[0].mode, PlanMode::Replan);
    assert!(replan.drafts.iter().all(|d| (3..=7).contains(&d.day_number)));
    assert!(replan.drafts.iter().all(|d| d.time_estimate_minutes <= 45));

    db.storage.apply_replan(replan).unwrap();
    let after = db.storage.get_plan_tasks(&plan.id).unwrap();

    assert_eq!(completed_count(&after), 2);
    for (id, completed_at) in &completed_ids {
        let task = after.iter().find(|t| &t.id == id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(&task.completed_at, completed_at);
        assert_eq!(task.day_number, 1);
    }
    assert!(!backlog.is_empty());
    for id in &backlog {
        assert!(after.iter().all(|t| &t.id != id));
    }
    assert!(after.iter().filter(|t| t.day_number < 3).all(|t| t.is_completed()));
    assert!(!engine.needs_replan(&plan, &after, now));
    assert!(after
        .iter()
        .filter(|t| t.day_number >= 3)
        .all(|t| t.title.starts_with("Genetics review") || t.title.starts_with("Spaced review")));
    for day in 3..=7 {
        assert!(!tasks_for_day(&after, &plan.id, day).is_empty());
    }
}

#[test]
fn test_completion_is_terminal_across_replans() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let source = StaticContentSource::new(TestDataFactory::proposals("Calculus", 12));
    let (plan, _) = TestDataFactory::create_started_plan(&db.storage, "Calculus", 6, 1, now, &source);
    let engine = ReplanEngine::default();

    let mut history = 0;
    for round in 0..4 {
        let tasks = db.storage.get_plan_tasks(&plan.id).unwrap();
        let today = todays_tasks(&plan, &tasks, now);
        if let Some(task) = today.into_iter().find(|t| !t.is_completed()) {
            let mut task = task.clone();
            task.complete(now + Duration::minutes(round), round % 2 == 0);
            db.storage.update_task_status(&task).unwrap();
            history += 1;
        }

        let tasks = db.storage.get_plan_tasks(&plan.id).unwrap();
        let replan = engine.replan(&plan, &tasks, &[], now, &source).unwrap();
        assert_eq!(replan.completed.len(), history);
        db.storage.apply_replan(replan).unwrap();
        assert_eq!(completed_count(&db.storage.get_plan_tasks(&plan.id).unwrap()), history);
    }

    // Completing a completed task changes nothing
    let tasks = db.storage.get_plan_tasks(&plan.id).unwrap();
    let mut done = tasks.iter().find(|t| t.is_completed()).unwrap().clone();
    let stamp = done.completed_at;
    assert!(!done.complete(now + Duration::days(1), true));
    assert_eq!(done.completed_at, stamp);
}

#[test]
fn test_replan_after_horizon_is_catch_up() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let source = StaticContentSource::new(TestDataFactory::proposals("History", 6));
    let (plan, _) = TestDataFactory::create_started_plan(&db.storage, "History", 3, 10, now, &source);
    assert!(plan.is_expired(now));
    assert_eq!(plan.current_day(now), 3);
    assert_eq!(plan.remaining_days(now), 1);

    let tasks = db.storage.get_plan_tasks(&plan.id).unwrap();
    let replan = ReplanEngine::default()
        .replan(&plan, &tasks, &[], now, &source)
        .unwrap();
    assert!(replan.window.catch_up);
    assert_eq!(replan.window.days(), 1);
    assert!(replan.drafts.iter().all(|d| d.day_number == 3));
    assert!(replan.drafts.len() <= 5);

    let all = db.storage.apply_replan(replan).unwrap();
    assert!(all.iter().all(|t| plan.contains_day(t.day_number)));
}

#[test]
fn test_failed_generation_leaves_no_plan() {
    let db = TestDatabaseManager::new_temp();
    let allocator = PlanAllocator::default();

    let empty = RecordingContentSource::new().then_respond(vec![]);
    let result = allocator.create_plan("Astronomy", 7, &[], &empty, Utc::now());
    assert!(matches!(result, Err(EngineError::EmptyPlan { .. })));

    let failing =
        RecordingContentSource::new().then_fail(ContentError::Unavailable("quota exceeded".into()));
    let result = allocator.create_plan("Astronomy", 7, &[], &failing, Utc::now());
    assert!(matches!(result, Err(EngineError::Content(ContentError::Unavailable(_)))));

    assert!(StaticContentSource::from_response("I could not generate a plan.").is_err());
    assert!(db.storage.list_plans().unwrap().is_empty());
}

#[test]
fn test_invalid_durations_rejected() {
    let allocator = PlanAllocator::default();
    let source = StaticContentSource::new(TestDataFactory::proposals("Art", 3));
    assert!(matches!(
        allocator.create_plan("Art", 0, &[], &source, Utc::now()),
        Err(EngineError::InvalidDuration(0))
    ));
    assert!(StudyPlan::new("Art", 0, Utc::now()).is_err());
}

#[test]
fn test_delete_plan_cascades() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let source = StaticContentSource::new(TestDataFactory::proposals("Latin", 9));
    let (plan, tasks) = TestDataFactory::create_started_plan(&db.storage, "Latin", 3, 0, now, &source);
    let (other, _) = TestDataFactory::create_started_plan(&db.storage, "Greek", 3, 0, now, &source);

    assert!(db.storage.delete_plan(&plan.id).unwrap());
    assert!(db.storage.get_plan(&plan.id).unwrap().is_none());
    for task in &tasks {
        assert!(db.storage.get_task(&task.id).unwrap().is_none());
    }
    assert_eq!(db.storage.get_plan_tasks(&other.id).unwrap().len(), 9);
    assert_eq!(db.storage.list_plans().unwrap().len(), 1);
}
