//! Terminal formatting helpers

use colored::{ColoredString, Colorize};
use studycap_core::{TaskStatus, TaskType, WorkloadBand};

/// Print a horizontal bar scaled to `max`
pub fn print_bar(label: &str, value: f64, max: f64, suffix: &str, color: &str) {
    let fraction = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };

    let bar_width: usize = 30;
    let filled = (fraction * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);

    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));
    let colored_bar = match color {
        "green" => bar.green(),
        "yellow" => bar.yellow(),
        "red" => bar.red(),
        "blue" => bar.blue(),
        "magenta" => bar.magenta(),
        _ => bar.white(),
    };

    println!("  {:15} [{:30}] {}", label, colored_bar, suffix);
}

/// Bar color for a workload band
pub fn band_color(band: WorkloadBand) -> &'static str {
    match band {
        WorkloadBand::High => "red",
        WorkloadBand::Medium => "yellow",
        WorkloadBand::Low => "blue",
        WorkloadBand::None => "white",
    }
}

/// Colored band label
pub fn band_label(band: WorkloadBand) -> ColoredString {
    match band {
        WorkloadBand::High => band.as_str().red().bold(),
        WorkloadBand::Medium => band.as_str().yellow(),
        WorkloadBand::Low => band.as_str().blue(),
        WorkloadBand::None => band.as_str().dimmed(),
    }
}

/// Checkbox for a task status
pub fn status_mark(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Completed => "[x]".green(),
        TaskStatus::Pending => "[ ]".white(),
    }
}

/// Colored task type
pub fn task_type_label(task_type: TaskType) -> ColoredString {
    let name = task_type.as_str();
    match task_type {
        TaskType::ActiveRecall => name.magenta(),
        TaskType::Practice => name.blue(),
        TaskType::Review | TaskType::SpacedReview => name.yellow(),
        TaskType::DeepStudy => name.cyan(),
        TaskType::Study => name.white(),
    }
}

/// Hours with one decimal, e.g. `2.5h`
pub fn hours(value: f64) -> String {
    format!("{:.1}h", value)
}

/// First eight characters of an id
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
