//! `block`, `workload` and `subjects` commands

use chrono::{Duration, Utc};
use clap::Subcommand;
use colored::Colorize;
use studycap_core::workload::{HIGH_WORKLOAD_HOURS, MEDIUM_WORKLOAD_HOURS};
use studycap_core::{day_workload, subject_progress, week_workload, StudyBlock};

use crate::context::{parse_date, parse_time, resolve_prefix, AppContext};
use crate::output::{band_color, band_label, hours, print_bar, short_id};

#[derive(Subcommand)]
pub enum BlockCommand {
    /// Place a study block on the calendar
    Add {
        /// What to study
        title: String,
        /// Start time (RFC 3339 or 'YYYY-MM-DD HH:MM', UTC)
        #[arg(long)]
        start: String,
        /// Length in minutes
        #[arg(long, default_value = "60")]
        minutes: u32,
        /// Subject
        #[arg(long)]
        subject: Option<String>,
        /// Plan task this block is for
        #[arg(long)]
        task: Option<String>,
    },

    /// List blocks in start order
    List,

    /// Mark a block as done
    Complete {
        /// Block id (or unique prefix)
        id: String,
    },
}

pub fn run_block(ctx: &AppContext, command: BlockCommand) -> anyhow::Result<()> {
    match command {
        BlockCommand::Add {
            title,
            start,
            minutes,
            subject,
            task,
        } => {
            if minutes == 0 {
                anyhow::bail!("A study block needs a positive length");
            }
            let start = parse_time(&start)?;
            let mut block = StudyBlock::new(title, start, start + Duration::minutes(i64::from(minutes)));
            block.subject = subject;
            block.task_id = task;
            ctx.storage.insert_block(&block)?;

            let day = day_workload(&ctx.storage.list_blocks()?, block.date());
            println!(
                "{} {} on {} ({} that day, {})",
                "Added block".green().bold(),
                short_id(&block.id),
                block.date(),
                hours(day.total_hours),
                band_label(day.band)
            );
        }
        BlockCommand::List => {
            let blocks = ctx.storage.list_blocks()?;
            println!("{}", "=== Study Blocks ===".cyan().bold());
            if blocks.is_empty() {
                println!("{}", "No blocks scheduled.".dimmed());
            }
            for block in &blocks {
                let mark = if block.completed { "[x]".green() } else { "[ ]".white() };
                println!(
                    "  {} {}  {} - {}  {:30}  {}",
                    mark,
                    short_id(&block.id).dimmed(),
                    block.start_time.format("%Y-%m-%d %H:%M"),
                    block.end_time.format("%H:%M"),
                    block.title,
                    block.subject_or_default().dimmed()
                );
            }
        }
        BlockCommand::Complete { id } => {
            let block = resolve_prefix(ctx.storage.list_blocks()?, |b| b.id.as_str(), &id, "block")?;
            ctx.storage.complete_block(&block.id)?;
            println!("{} {}", "Completed".green().bold(), block.title);
        }
    }
    Ok(())
}

pub fn run_workload(ctx: &AppContext, date: Option<String>, week: Option<String>) -> anyhow::Result<()> {
    let blocks = ctx.storage.list_blocks()?;

    if let Some(start) = week {
        let start = parse_date(&start)?;
        println!("{} {}", "=== Weekly Workload from".cyan().bold(), format!("{} ===", start).cyan().bold());
        for day in week_workload(&blocks, start) {
            print_bar(
                &day.date.format("%a %Y-%m-%d").to_string(),
                day.total_hours,
                HIGH_WORKLOAD_HOURS,
                &format!("{} {}", hours(day.total_hours), band_label(day.band)),
                band_color(day.band),
            );
        }
        return Ok(());
    }

    let date = match date {
        Some(value) => parse_date(&value)?,
        None => Utc::now().date_naive(),
    };
    let day = day_workload(&blocks, date);
    println!("{} {}", "=== Workload ===".cyan().bold(), date);
    println!("{}: {}", "Blocks".white().bold(), day.blocks);
    println!("{}: {}", "Scheduled".white().bold(), hours(day.total_hours));
    println!("{}: {}", "Band".white().bold(), band_label(day.band));
    println!();
    println!("{}", "Bands:".dimmed());
    println!("  {} >= {}h", "high".red(), HIGH_WORKLOAD_HOURS);
    println!("  {} >= {}h", "medium".yellow(), MEDIUM_WORKLOAD_HOURS);
    println!("  {} > 0h", "low".blue());
    Ok(())
}

pub fn run_subjects(ctx: &AppContext) -> anyhow::Result<()> {
    let blocks = ctx.storage.list_blocks()?;
    let progress = subject_progress(&blocks);

    println!("{}", "=== Subjects ===".cyan().bold());
    if progress.is_empty() {
        println!("{}", "No study blocks yet.".dimmed());
    }
    for subject in &progress {
        print_bar(
            &subject.subject,
            subject.completed_hours,
            subject.scheduled_hours,
            &format!(
                "{} of {} studied ({}/{} blocks)",
                hours(subject.completed_hours),
                hours(subject.scheduled_hours),
                subject.completed_blocks,
                subject.blocks
            ),
            "green",
        );
    }
    Ok(())
}
