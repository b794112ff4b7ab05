//! `card` and `weak` commands

use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use studycap_core::review::study_set;
use studycap_core::{
    shuffle_items, Flashcard, MasteryLevel, Quality, ReviewScheduler, ReviewSession, TutorVerdict,
    WeakPointChange,
};

use crate::context::{resolve_prefix, AppContext};
use crate::output::{print_bar, short_id};

#[derive(Subcommand)]
pub enum CardCommand {
    /// Author a new flashcard (due immediately)
    Add {
        /// Prompt side
        front: String,
        /// Answer side
        back: String,
        /// Topic for weak-point tracking (defaults to the front text)
        #[arg(long)]
        topic: Option<String>,
    },

    /// List all cards, soonest review first
    List,

    /// Show the cards to study now
    Due {
        /// Shuffle the study set
        #[arg(long)]
        shuffle: bool,
    },

    /// Grade a card 0-5 and reschedule it
    Review {
        /// Card id (or unique prefix)
        id: String,
        /// Quality of recall: 0-2 failed, 3 hard, 4 good, 5 easy
        #[arg(allow_negative_numbers = true)]
        quality: i64,
    },

    /// Show the next interval each answer button would give
    Preview {
        /// Card id (or unique prefix)
        id: String,
    },

    /// Delete a card
    Delete {
        /// Card id (or unique prefix)
        id: String,
    },
}

#[derive(Subcommand)]
pub enum WeakCommand {
    /// Show weak topics, most failed first
    List {
        /// Maximum number of topics
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Record a failure on a topic
    Fail {
        topic: String,
    },

    /// Record mastery of a topic
    Master {
        topic: String,
    },

    /// Apply a tutor's verdict on an answer about a topic
    Verdict {
        topic: String,
        /// The answer was correct
        #[arg(long)]
        correct: bool,
        /// Assessed mastery: needs_work, partial or mastered
        #[arg(long, default_value = "needs_work")]
        mastery: String,
    },

    /// Stop tracking a topic
    Remove {
        topic: String,
    },

    /// Forget all weak points
    Clear,
}

pub fn run_card(ctx: &AppContext, command: CardCommand) -> anyhow::Result<()> {
    match command {
        CardCommand::Add { front, back, topic } => {
            let mut card = Flashcard::new(front, back, Utc::now());
            card.topic = topic.filter(|t| !t.trim().is_empty());
            ctx.storage.save_card(&card)?;
            println!("{} {}", "Added card".green().bold(), short_id(card.id()));
        }
        CardCommand::List => {
            let cards = ctx.storage.list_cards()?;
            println!("{}", "=== Flashcards ===".cyan().bold());
            if cards.is_empty() {
                println!("{}", "No cards yet.".dimmed());
            }
            let now = Utc::now();
            for card in &cards {
                let next = card.item.next_review_at.format("%Y-%m-%d").to_string();
                let due = if card.item.is_due(now) {
                    "due".yellow().bold()
                } else {
                    next.as_str().normal()
                };
                println!(
                    "  {}  {:40}  ease {:.2}  every {:>3}d  {}",
                    short_id(card.id()).dimmed(),
                    card.front,
                    card.item.ease_factor,
                    card.item.interval_days,
                    due
                );
            }
        }
        CardCommand::Due { shuffle } => {
            let cards = ctx.storage.list_cards()?;
            let weak_points = ctx.storage.load_weak_points()?;
            let mut set = study_set(&cards, Utc::now());
            if shuffle {
                shuffle_items(&mut set.items, &mut rand::thread_rng());
            }

            println!("{}", "=== Study Set ===".cyan().bold());
            if set.fallback && !set.is_empty() {
                println!("{}", "Nothing is due; showing the whole collection.".dimmed());
            }
            if set.is_empty() {
                println!("{}", "No cards yet.".dimmed());
            }
            for card in &set.items {
                let marker = if weak_points.is_weak(card.topic()) {
                    "weak".red().bold()
                } else {
                    "    ".normal()
                };
                println!("  {}  {}  {}", short_id(card.id()).dimmed(), marker, card.front);
            }
        }
        CardCommand::Review { id, quality } => {
            let quality = Quality::new(quality)?;
            let card = find_card(ctx, &id)?;
            let mut weak_points = ctx.storage.load_weak_points()?;

            let outcome = ReviewSession::new(&mut weak_points).record(&card, quality, Utc::now());
            ctx.storage.save_card(&outcome.card)?;
            ctx.storage.save_weak_points(&weak_points)?;

            let item = &outcome.card.item;
            println!(
                "{} next review in {} day(s) on {} (ease {:.2}, streak {})",
                if quality.is_pass() { "Passed.".green().bold() } else { "Failed.".red().bold() },
                item.interval_days,
                item.next_review_at.format("%Y-%m-%d"),
                item.ease_factor,
                item.repetitions
            );
            print_weak_change(card.topic(), outcome.weak_point);
        }
        CardCommand::Preview { id } => {
            let card = find_card(ctx, &id)?;
            let preview = ReviewScheduler::new().preview(&card.item);
            println!("{} {}", "=== Preview ===".cyan().bold(), card.front);
            let max = f64::from(preview.easy_days.max(1));
            print_bar("Fail (1)", f64::from(preview.fail_days), max, &format!("{}d", preview.fail_days), "red");
            print_bar("Hard (3)", f64::from(preview.hard_days), max, &format!("{}d", preview.hard_days), "yellow");
            print_bar("Good (4)", f64::from(preview.good_days), max, &format!("{}d", preview.good_days), "green");
            print_bar("Easy (5)", f64::from(preview.easy_days), max, &format!("{}d", preview.easy_days), "blue");
        }
        CardCommand::Delete { id } => {
            let card = find_card(ctx, &id)?;
            ctx.storage.delete_card(card.id())?;
            println!("{} {}", "Deleted card".green().bold(), card.front);
        }
    }
    Ok(())
}

pub fn run_weak(ctx: &AppContext, command: WeakCommand) -> anyhow::Result<()> {
    let mut weak_points = ctx.storage.load_weak_points()?;
    let now = Utc::now();

    match command {
        WeakCommand::List { limit } => {
            println!("{}", "=== Weak Points ===".cyan().bold());
            let top = weak_points.top_weak(limit);
            if top.is_empty() {
                println!("{}", "No weak points. Nice work.".dimmed());
            }
            let max = top.first().map(|p| f64::from(p.count)).unwrap_or(1.0);
            for point in top {
                print_bar(
                    &point.topic,
                    f64::from(point.count),
                    max,
                    &format!("{} (last {})", point.count, point.last_failed_at.format("%Y-%m-%d")),
                    "red",
                );
            }
            return Ok(());
        }
        WeakCommand::Fail { topic } => {
            let count = weak_points.record_failure(&topic, now);
            print_weak_change(&topic, WeakPointChange::Failed(count));
        }
        WeakCommand::Master { topic } => {
            let change = match weak_points.record_mastery(&topic) {
                Some(remaining) => WeakPointChange::Mastered(remaining),
                None => WeakPointChange::Unchanged,
            };
            print_weak_change(&topic, change);
        }
        WeakCommand::Verdict {
            topic,
            correct,
            mastery,
        } => {
            let verdict = TutorVerdict {
                correct,
                mastery_level: MasteryLevel::parse_name(&mastery),
            };
            let change = weak_points.apply_verdict(&topic, verdict, now);
            print_weak_change(&topic, change);
        }
        WeakCommand::Remove { topic } => {
            if weak_points.remove(&topic) {
                println!("{} {}", "No longer tracking".green(), topic);
            } else {
                println!("{} is not a weak point", topic);
            }
        }
        WeakCommand::Clear => {
            let removed = weak_points.len();
            weak_points.clear();
            println!("{} {} weak point(s)", "Cleared".green(), removed);
        }
    }

    ctx.storage.save_weak_points(&weak_points)?;
    Ok(())
}

fn find_card(ctx: &AppContext, id: &str) -> anyhow::Result<Flashcard> {
    if let Some(card) = ctx.storage.get_card(id)? {
        return Ok(card);
    }
    resolve_prefix(ctx.storage.list_cards()?, |card| card.id(), id, "card")
}

fn print_weak_change(topic: &str, change: WeakPointChange) {
    match change {
        WeakPointChange::Failed(0) => {}
        WeakPointChange::Failed(count) => {
            println!("{} {} ({} outstanding)", "Weak point:".red(), topic, count);
        }
        WeakPointChange::Mastered(0) => {
            println!("{} {}", "Mastered:".green(), topic);
        }
        WeakPointChange::Mastered(remaining) => {
            println!("{} {} ({} to go)", "Progress on".green(), topic, remaining);
        }
        WeakPointChange::Unchanged => {}
    }
}
