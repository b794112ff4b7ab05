//! StudyCap CLI
//!
//! Command-line front end for the scheduling engine. It plays the host role:
//! loads state from SQLite, runs engine operations, and writes results back.
//! Task content for plans is read from a JSON document produced by the
//! content-generation service.

mod calendar;
mod cards;
mod context;
mod output;
mod plans;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::context::AppContext;

/// StudyCap - Adaptive Study Scheduler CLI
#[derive(Parser)]
#[command(name = "studycap")]
#[command(author = "StudyCap Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spaced-repetition reviews, weak-point tracking and adaptive study plans")]
#[command(long_about = "StudyCap schedules flashcard reviews with SM-2, tracks the topics you keep failing, \
and spreads multi-day study plans so weak topics come up earlier and more often.")]
struct Cli {
    /// Custom data directory (database and config.json)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flashcards and SM-2 reviews
    #[command(subcommand)]
    Card(cards::CardCommand),

    /// Weak-point tracking
    #[command(subcommand)]
    Weak(cards::WeakCommand),

    /// Multi-day study plans
    #[command(subcommand)]
    Plan(plans::PlanCommand),

    /// Calendar study blocks
    #[command(subcommand)]
    Block(calendar::BlockCommand),

    /// Show scheduled workload for a day or a week
    Workload {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Show the seven days starting at this date (YYYY-MM-DD)
        #[arg(long)]
        week: Option<String>,
    },

    /// Show scheduled and completed hours per subject
    Subjects,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let ctx = AppContext::open(cli.data_dir)?;

    match cli.command {
        Commands::Card(command) => cards::run_card(&ctx, command),
        Commands::Weak(command) => cards::run_weak(&ctx, command),
        Commands::Plan(command) => plans::run_plan(&ctx, command),
        Commands::Block(command) => calendar::run_block(&ctx, command),
        Commands::Workload { date, week } => calendar::run_workload(&ctx, date, week),
        Commands::Subjects => calendar::run_subjects(&ctx),
    }
}

/// Logging goes to stderr so command output stays clean
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
