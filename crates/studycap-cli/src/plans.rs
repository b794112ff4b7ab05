//! `plan` commands

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use studycap_core::plan::todays_tasks;
use studycap_core::{
    PlanAllocator, PlanProgress, PlanTask, ReplanEngine, StaticContentSource, StudyPlan,
};

use crate::context::{resolve_prefix, AppContext};
use crate::output::{print_bar, short_id, status_mark, task_type_label};

#[derive(Subcommand)]
pub enum PlanCommand {
    /// Create a plan from a content-service response
    Create {
        /// What you are studying for
        goal: String,
        /// Plan length in days (default from config)
        #[arg(long)]
        days: Option<u32>,
        /// JSON file with proposed tasks ({"tasks": [...]})
        #[arg(long)]
        tasks: PathBuf,
    },

    /// Show a plan day by day
    Show {
        /// Plan id (or unique prefix)
        id: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show today's tasks of a plan
    Today {
        /// Plan id (or unique prefix)
        id: String,
    },

    /// Mark a task done
    Complete {
        /// Task id (or unique prefix)
        task_id: String,
        /// A tutor check confirmed mastery
        #[arg(long)]
        mastery: bool,
    },

    /// Regenerate the remaining days of a plan
    Replan {
        /// Plan id (or unique prefix)
        id: String,
        /// JSON file with proposed tasks for the remaining days
        #[arg(long)]
        tasks: PathBuf,
    },

    /// List plans, newest first
    List,

    /// Delete a plan and its tasks
    Delete {
        /// Plan id (or unique prefix)
        id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanReport<'a> {
    plan: &'a StudyPlan,
    current_day: u32,
    remaining_days: u32,
    progress: PlanProgress,
    tasks: &'a [PlanTask],
}

pub fn run_plan(ctx: &AppContext, command: PlanCommand) -> anyhow::Result<()> {
    match command {
        PlanCommand::Create { goal, days, tasks } => run_create(ctx, &goal, days, &tasks),
        PlanCommand::Show { id, json } => run_show(ctx, &id, json),
        PlanCommand::Today { id } => run_today(ctx, &id),
        PlanCommand::Complete { task_id, mastery } => run_complete(ctx, &task_id, mastery),
        PlanCommand::Replan { id, tasks } => run_replan(ctx, &id, &tasks),
        PlanCommand::List => run_list(ctx),
        PlanCommand::Delete { id } => {
            let plan = find_plan(ctx, &id)?;
            ctx.storage.delete_plan(&plan.id)?;
            println!("{} {}", "Deleted plan".green().bold(), plan.goal);
            Ok(())
        }
    }
}

fn load_source(path: &Path) -> anyhow::Result<StaticContentSource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    StaticContentSource::from_response(&text)
        .with_context(|| format!("Could not use tasks from {}", path.display()))
}

fn run_create(ctx: &AppContext, goal: &str, days: Option<u32>, tasks: &Path) -> anyhow::Result<()> {
    let source = load_source(tasks)?;
    let weak_points = ctx.storage.load_weak_points()?;
    let weak_topics = weak_points.weak_topics(ctx.config.weak_topic_limit);
    let days = days.unwrap_or(ctx.config.default_duration_days);

    let allocator = PlanAllocator::new(ctx.config.clone())?;
    let (plan, tasks) = allocator.create_plan(goal, days, &weak_topics, &source, Utc::now())?;
    ctx.storage.insert_plan(&plan, &tasks)?;

    println!(
        "{} {} ({} days, {} tasks)",
        "Created plan".green().bold(),
        short_id(&plan.id),
        plan.duration_days,
        tasks.len()
    );
    if !weak_topics.is_empty() {
        println!("{} {}", "Prioritized:".dimmed(), weak_topics.join(", "));
    }
    Ok(())
}

fn run_show(ctx: &AppContext, id: &str, json: bool) -> anyhow::Result<()> {
    let plan = find_plan(ctx, id)?;
    let tasks = ctx.storage.get_plan_tasks(&plan.id)?;
    let now = Utc::now();
    let progress = PlanProgress::of(&tasks);
    let current_day = plan.current_day(now);

    if json {
        let report = PlanReport {
            plan: &plan,
            current_day,
            remaining_days: plan.remaining_days(now),
            progress,
            tasks: &tasks,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "=== Plan ===".cyan().bold(), plan.goal.white().bold());
    println!(
        "{}: {} of {}   {}: {}",
        "Day".white().bold(),
        current_day,
        plan.duration_days,
        "Started".white().bold(),
        plan.created_at.format("%Y-%m-%d")
    );
    print_bar(
        "Progress",
        progress.percent,
        100.0,
        &format!("{}/{} ({:.0}%)", progress.completed, progress.total, progress.percent),
        "green",
    );

    for day in 1..=plan.duration_days {
        let day_tasks: Vec<&PlanTask> = tasks.iter().filter(|t| t.day_number == day).collect();
        if day_tasks.is_empty() {
            continue;
        }
        println!();
        let heading = format!("Day {}", day);
        if day == current_day {
            println!("{} {}", heading.yellow().bold(), "(today)".yellow());
        } else {
            println!("{}", heading.bold());
        }
        for task in day_tasks {
            print_task(task);
        }
    }

    let engine = ReplanEngine::new(ctx.config.clone())?;
    if engine.needs_replan(&plan, &tasks, now) {
        println!();
        println!(
            "{}",
            "You have unfinished tasks from earlier days. Consider `studycap plan replan`.".yellow()
        );
    }
    Ok(())
}

fn run_today(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let plan = find_plan(ctx, id)?;
    let tasks = ctx.storage.get_plan_tasks(&plan.id)?;
    let now = Utc::now();
    let today = todays_tasks(&plan, &tasks, now);

    println!(
        "{} {} (day {} of {})",
        "=== Today ===".cyan().bold(),
        plan.goal,
        plan.current_day(now),
        plan.duration_days
    );
    if today.is_empty() {
        println!("{}", "Nothing scheduled today.".dimmed());
    }
    let minutes: u32 = today
        .iter()
        .filter(|t| !t.is_completed())
        .map(|t| t.time_estimate_minutes)
        .sum();
    for task in &today {
        print_task(task);
    }
    if minutes > 0 {
        println!("{} {} min remaining", "Total:".dimmed(), minutes);
    }
    Ok(())
}

fn run_complete(ctx: &AppContext, task_id: &str, mastery: bool) -> anyhow::Result<()> {
    let mut task = find_task(ctx, task_id)?;
    if !task.complete(Utc::now(), mastery) {
        println!("{} was already completed", task.title);
        return Ok(());
    }
    ctx.storage.update_task_status(&task)?;

    let tasks = ctx.storage.get_plan_tasks(&task.plan_id)?;
    let progress = PlanProgress::of(&tasks);
    println!(
        "{} {} ({}/{} done)",
        "Completed".green().bold(),
        task.title,
        progress.completed,
        progress.total
    );
    Ok(())
}

fn run_replan(ctx: &AppContext, id: &str, tasks_path: &Path) -> anyhow::Result<()> {
    let source = load_source(tasks_path)?;
    let plan = find_plan(ctx, id)?;
    let tasks = ctx.storage.get_plan_tasks(&plan.id)?;
    let weak_points = ctx.storage.load_weak_points()?;
    let weak_topics = weak_points.weak_topics(ctx.config.weak_topic_limit);

    let engine = ReplanEngine::new(ctx.config.clone())?;
    let replan = engine.replan(&plan, &tasks, &weak_topics, Utc::now(), &source)?;
    let window = replan.window;
    let discarded = replan.discarded.len();
    let added = replan.drafts.len();
    let all = ctx.storage.apply_replan(replan)?;

    if window.catch_up {
        println!(
            "{}",
            "The plan period has ended; scheduled a catch-up on the final day.".yellow()
        );
    }
    println!(
        "{} days {}-{}: {} new task(s), {} replaced",
        "Replanned".green().bold(),
        window.first_day,
        window.last_day,
        added,
        discarded
    );
    let progress = PlanProgress::of(&all);
    println!("{}/{} done", progress.completed, progress.total);
    Ok(())
}

fn run_list(ctx: &AppContext) -> anyhow::Result<()> {
    let plans = ctx.storage.list_plans()?;
    println!("{}", "=== Study Plans ===".cyan().bold());
    if plans.is_empty() {
        println!("{}", "No plans yet.".dimmed());
    }
    let now = Utc::now();
    for plan in &plans {
        let tasks = ctx.storage.get_plan_tasks(&plan.id)?;
        let progress = PlanProgress::of(&tasks);
        let state = if plan.is_expired(now) {
            "ended".dimmed()
        } else {
            format!("day {}/{}", plan.current_day(now), plan.duration_days).normal()
        };
        println!(
            "  {}  {:30}  {:>3.0}%  {}",
            short_id(&plan.id).dimmed(),
            plan.goal,
            progress.percent,
            state
        );
    }
    Ok(())
}

fn print_task(task: &PlanTask) {
    let title = if task.is_completed() {
        task.title.dimmed()
    } else {
        task.title.normal()
    };
    println!(
        "  {} {}  {}  {} ({} min)",
        status_mark(task.status),
        short_id(&task.id).dimmed(),
        title,
        task_type_label(task.task_type),
        task.time_estimate_minutes
    );
}

fn find_plan(ctx: &AppContext, id: &str) -> anyhow::Result<StudyPlan> {
    if let Some(plan) = ctx.storage.get_plan(id)? {
        return Ok(plan);
    }
    resolve_prefix(ctx.storage.list_plans()?, |plan| plan.id.as_str(), id, "plan")
}

fn find_task(ctx: &AppContext, id: &str) -> anyhow::Result<PlanTask> {
    if let Some(task) = ctx.storage.get_task(id)? {
        return Ok(task);
    }
    let mut all = Vec::new();
    for plan in ctx.storage.list_plans()? {
        all.extend(ctx.storage.get_plan_tasks(&plan.id)?);
    }
    resolve_prefix(all, |task| task.id.as_str(), id, "task")
}
