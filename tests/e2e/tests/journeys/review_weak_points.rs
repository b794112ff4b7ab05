//! Journey: review flashcards and watch weak points rise and fall
//!
//! A learner authors cards, reviews them over several days, fails some
//! topics, and later masters them. State survives restarts.

use chrono::{Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use studycap_core::review::{due_items, study_set};
use studycap_core::{
    shuffle_items, Flashcard, MasteryLevel, Quality, ReviewScheduler, ReviewSession, TutorVerdict,
    WeakPointChange,
};
use studycap_e2e_tests::TestDatabaseManager;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_sm2_sequence_through_storage() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let card = Flashcard::new("What does ATP stand for?", "Adenosine triphosphate", now);
    db.storage.save_card(&card).unwrap();

    let mut weak_points = db.storage.load_weak_points().unwrap();

    // Easy, easy, then a lapse a week later
    let steps = [
        (Quality::EASY, now, 1u32, 1u32, 2.6),
        (Quality::EASY, now + Duration::days(1), 6u32, 2u32, 2.7),
    ];
    for (quality, at, interval, reps, ease) in steps {
        let stored = db.storage.get_card(card.id()).unwrap().unwrap();
        let outcome = ReviewSession::new(&mut weak_points).record(&stored, quality, at);
        db.storage.save_card(&outcome.card).unwrap();

        let reloaded = db.storage.get_card(card.id()).unwrap().unwrap();
        assert_eq!(reloaded.item.interval_days, interval);
        assert_eq!(reloaded.item.repetitions, reps);
        assert!(approx_eq(reloaded.item.ease_factor, ease));
        assert_eq!(reloaded.item.next_review_at, at + Duration::days(i64::from(interval)));
    }

    let stored = db.storage.get_card(card.id()).unwrap().unwrap();
    let lapse_at = now + Duration::days(7);
    let outcome = ReviewSession::new(&mut weak_points).record(&stored, Quality::FAIL, lapse_at);
    db.storage.save_card(&outcome.card).unwrap();
    db.storage.save_weak_points(&weak_points).unwrap();

    let reloaded = db.storage.get_card(card.id()).unwrap().unwrap();
    assert_eq!(reloaded.item.interval_days, 1);
    assert_eq!(reloaded.item.repetitions, 0);
    assert!(reloaded.item.ease_factor < 2.7);
    assert!(reloaded.item.ease_factor >= 1.3);
    assert_eq!(reloaded.item.last_reviewed_at, Some(lapse_at));

    // The card's front doubles as its topic
    let weak_points = db.storage.load_weak_points().unwrap();
    assert_eq!(weak_points.count("what does atp stand for?"), 1);
}

#[test]
fn test_repeated_failures_never_sink_ease_below_floor() {
    let now = Utc::now();
    let mut item = Flashcard::new("Hard card", "?", now).item;
    let scheduler = ReviewScheduler::new();
    for day in 0..40 {
        item = scheduler.schedule(&item, Quality::BLACKOUT, now + Duration::days(day));
        assert!(item.ease_factor >= 1.3);
        assert_eq!(item.interval_days, 1);
    }
    assert!(approx_eq(item.ease_factor, 1.3));
}

#[test]
fn test_invalid_quality_is_rejected_before_scheduling() {
    let now = Utc::now();
    let item = Flashcard::new("Q", "A", now).item;
    let scheduler = ReviewScheduler::new();
    assert!(scheduler.schedule_raw(&item, 6, now).is_err());
    assert!(scheduler.schedule_raw(&item, -1, now).is_err());
    assert!(scheduler.schedule_raw(&item, 4, now).is_ok());
}

#[test]
fn test_due_set_with_fallback() {
    let mut db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    db.seed_scheduled(now, &[-30, 12, -2, 48, -10]);

    let cards = db.storage.list_cards().unwrap();
    let due = due_items(&cards, now);
    assert_eq!(due.len(), 3);
    assert!(due.windows(2).all(|w| w[0].item.next_review_at <= w[1].item.next_review_at));
    assert!(due.iter().all(|c| c.item.next_review_at <= now));

    // Nothing due: the whole collection comes back, flagged
    db.clear_cards();
    db.seed_scheduled(now, &[5, 10, 20]);
    let cards = db.storage.list_cards().unwrap();
    let set = study_set(&cards, now);
    assert!(set.fallback);
    assert_eq!(set.len(), 3);

    let mut shuffled = set.items.clone();
    shuffle_items(&mut shuffled, &mut StdRng::seed_from_u64(11));
    let mut original: Vec<&str> = set.items.iter().map(|c| c.id()).collect();
    let mut permuted: Vec<&str> = shuffled.iter().map(|c| c.id()).collect();
    original.sort();
    permuted.sort();
    assert_eq!(original, permuted);
}

#[test]
fn test_weak_points_are_case_insensitive_and_prune_at_zero() {
    let mut db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let mut weak_points = db.storage.load_weak_points().unwrap();

    weak_points.record_failure("Photosynthesis", now);
    weak_points.record_failure("photosynthesis", now);
    weak_points.record_failure("  PHOTOSYNTHESIS ", now);
    weak_points.record_failure("Krebs cycle", now);
    db.storage.save_weak_points(&weak_points).unwrap();

    db.reopen();
    let mut weak_points = db.storage.load_weak_points().unwrap();
    assert_eq!(weak_points.len(), 2);
    assert_eq!(weak_points.count("Photosynthesis"), 3);
    assert_eq!(weak_points.weak_topics(1), vec!["Photosynthesis".to_string()]);

    for remaining in [2, 1, 0] {
        assert_eq!(weak_points.record_mastery("photosynthesis"), Some(remaining));
    }
    assert!(!weak_points.is_weak("Photosynthesis"));
    assert_eq!(weak_points.record_mastery("photosynthesis"), None);

    db.storage.save_weak_points(&weak_points).unwrap();
    let stored = db.storage.load_weak_points().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored.iter().all(|p| p.count > 0));
}

#[test]
fn test_review_session_feeds_weak_points() {
    let now = Utc::now();
    let mut card = Flashcard::new("Name the stages of mitosis", "PMAT", now);
    card.topic = Some("Mitosis".to_string());
    let mut weak_points = studycap_core::WeakPointTracker::new();

    let mut session = ReviewSession::new(&mut weak_points);
    let failed = session.record(&card, Quality::new(2).unwrap(), now);
    assert_eq!(failed.weak_point, WeakPointChange::Failed(1));
    assert!(session.is_weak(&card));

    let hard = session.record(&failed.card, Quality::HARD, now + Duration::days(1));
    assert_eq!(hard.weak_point, WeakPointChange::Unchanged);

    let good = session.record(&hard.card, Quality::GOOD, now + Duration::days(2));
    assert_eq!(good.weak_point, WeakPointChange::Mastered(0));
    assert!(!session.is_weak(&card));
}

#[test]
fn test_tutor_verdicts() {
    let now = Utc::now();
    let mut weak_points = studycap_core::WeakPointTracker::new();
    let wrong = TutorVerdict {
        correct: false,
        mastery_level: MasteryLevel::NeedsWork,
    };
    let partial = TutorVerdict {
        correct: true,
        mastery_level: MasteryLevel::Partial,
    };
    let mastered = TutorVerdict {
        correct: true,
        mastery_level: MasteryLevel::Mastered,
    };

    assert_eq!(weak_points.apply_verdict("Entropy", wrong, now), WeakPointChange::Failed(1));
    assert_eq!(weak_points.apply_verdict("Entropy", wrong, now), WeakPointChange::Failed(2));
    assert_eq!(weak_points.apply_verdict("entropy", partial, now), WeakPointChange::Unchanged);
    assert_eq!(weak_points.apply_verdict("ENTROPY", mastered, now), WeakPointChange::Mastered(1));
    assert_eq!(weak_points.count("Entropy"), 1);
}
