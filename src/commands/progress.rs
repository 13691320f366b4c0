use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use fitrack::{
    progress::{DEFAULT_USER, ProgressLog, USER_KEY},
    types::{Config, OutputFmt, emit},
    utils::format_duration,
};
use sqlx::SqlitePool;

use crate::cli::ProgressCmd;

pub async fn handle(cmd: ProgressCmd, pool: &SqlitePool, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    let user = cfg.get(USER_KEY).unwrap_or(DEFAULT_USER);
    let log = ProgressLog::new(pool.clone());

    match cmd {
        ProgressCmd::Log {
            exercise,
            sets,
            reps,
            weight,
            duration,
        } => {
            if exercise.trim().is_empty() {
                println!("{} exercise name must not be empty", "error:".red().bold());
                return Ok(());
            }
            if sets == 0 && reps == 0 && duration == 0 {
                println!(
                    "{} nothing to record -- give at least --sets, --reps or --duration",
                    "warning:".yellow().bold()
                );
                return Ok(());
            }

            let entry = log.log(user, exercise.trim(), sets, reps, weight, duration).await?;
            emit(fmt, &entry, || {
                println!("{} progress saved for `{}`", "ok:".green().bold(), entry.exercise);
            });
        }

        ProgressCmd::List { exercise } => {
            let entries = log.list(user, exercise.as_deref()).await?;
            emit(fmt, &entries, || {
                if entries.is_empty() {
                    println!("{}", "  (no progress recorded)".dimmed());
                    return;
                }

                println!("{} {}", "Progress for".cyan().bold(), user.bold());
                for e in &entries {
                    let mut parts = Vec::new();
                    if e.sets > 0 || e.reps > 0 {
                        parts.push(format!("{} × {}", e.sets, e.reps));
                    }
                    if e.weight > 0.0 {
                        parts.push(format!("{}kg", e.weight));
                    }
                    if e.duration_seconds > 0 {
                        parts.push(format_duration(e.duration_seconds as u64));
                    }
                    println!(
                        "  {}  {} {}",
                        e.date.with_timezone(&Local).format("%Y-%m-%d").to_string().dimmed(),
                        e.exercise.bold(),
                        parts.join(" · ")
                    );
                }
            });
        }
    }

    Ok(())
}
