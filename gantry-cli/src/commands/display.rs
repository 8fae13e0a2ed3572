//! Terminal rendering shared by the commands

use colored::*;
use gantry_core::domain::log::{LogEntry, LogLevel};
use gantry_core::domain::run::{Run, RunResult, RunStatus};
use gantry_core::dto::run::RunSummary;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Print a one-block run summary
pub fn print_run_summary(run: &RunSummary) {
    println!("  {} Run {}", "▸".cyan(), run.id.to_string().dimmed());
    println!("    Revision: {}", run.revision.short());
    println!("    Status:   {}", colorize_status(&run.status));
    println!(
        "    Created:  {}",
        run.requested_at.format(TIME_FORMAT).to_string().dimmed()
    );
    if let Some(failure) = run.failure {
        println!("    Failure:  {}", failure.to_string().red());
    }
    println!();
}

/// Print detailed run information
pub fn print_run_details(run: &Run) {
    println!("{}", "Run Details:".bold());
    println!("  ID:          {}", run.id.to_string().cyan());
    println!("  Revision:    {}", run.revision);
    println!("  Status:      {}", colorize_status(&run.status));
    println!("  Requested:   {}", run.requested_at.format(TIME_FORMAT));

    if let Some(started) = run.started_at {
        println!("  Started:     {}", started.format(TIME_FORMAT));
    }

    if let Some(completed) = run.completed_at {
        println!("  Completed:   {}", completed.format(TIME_FORMAT));

        if let Some(started) = run.started_at {
            let duration = completed.signed_duration_since(started);
            println!("  Duration:    {}s", duration.num_seconds());
        }
    }

    if let Some(result) = &run.result {
        print_result(result);
    }
}

/// Print the outcome of a run
pub fn print_result(result: &RunResult) {
    println!("\n{}", "Result:".bold());
    println!(
        "  Success:     {}",
        if result.success {
            "✓".green()
        } else {
            "✗".red()
        }
    );

    if let Some(image) = &result.image {
        println!("  Image:       {}", image);
    }

    if let Some(scan) = &result.scan {
        println!(
            "  Scan:        {}",
            if scan.passed {
                "passed".green()
            } else {
                "failed".red()
            }
        );
    }

    if let Some(failure) = &result.failure {
        println!("\n{}", "Error:".bold());
        println!("{}", failure.reason.red());
    }
}

/// Print a log entry
pub fn print_log_entry(log: &LogEntry) {
    let level_str = format!("{:?}", log.level).to_uppercase();
    let level_colored = match log.level {
        LogLevel::Debug => level_str.dimmed(),
        LogLevel::Info => level_str.cyan(),
        LogLevel::Warning => level_str.yellow(),
        LogLevel::Error => level_str.red(),
    };
    let stage = log
        .stage
        .map(|stage| format!("[{}] ", stage))
        .unwrap_or_default();

    println!(
        "{} [{}] {}{}",
        log.timestamp.format("%H:%M:%S").to_string().dimmed(),
        level_colored,
        stage.magenta(),
        log.message
    );
}

/// Print a list of log entries between rules
pub fn print_log(entries: &[LogEntry]) {
    println!("{}", "─".repeat(80).dimmed());
    for entry in entries {
        print_log_entry(entry);
    }
    println!("{}", "─".repeat(80).dimmed());
}

/// Colorize run status for display
pub fn colorize_status(status: &RunStatus) -> ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        RunStatus::Queued => status_str.yellow(),
        RunStatus::Running => status_str.cyan(),
        RunStatus::Succeeded => status_str.green(),
        RunStatus::Failed => status_str.red(),
    }
}
