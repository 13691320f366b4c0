use std::io::{self, BufRead, Write};

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use fitrack::{
    HistoryStore,
    models::WorkoutRecord,
    types::{OutputFmt, emit},
    utils::{format_clock, plain_len},
};
use sqlx::SqlitePool;

use crate::cli::HistoryCmd;

pub async fn handle(cmd: HistoryCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    let store = HistoryStore::new(pool.clone());

    match cmd {
        HistoryCmd::List => {
            let records = store.load().await?;
            emit(fmt, &records, || print_list(&records));
        }

        HistoryCmd::Show { workout } => match store.get(&workout).await? {
            Some(r) => emit(fmt, &r, || print_record(&r)),
            None => println!("{} no workout `{}`", "error:".red().bold(), workout),
        },

        HistoryCmd::Clear { yes } => {
            if !yes && !confirm("Delete all workout history?")? {
                println!("{} nothing deleted", "info:".blue().bold());
                return Ok(());
            }
            let n = store.clear().await?;
            println!("{} removed {} workout(s)", "ok:".green().bold(), n);
        }
    }

    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn rate_colored(rate: u8) -> String {
    let s = format!("{:>3}%", rate);
    match rate {
        80.. => s.green().to_string(),
        50..=79 => s.yellow().to_string(),
        _ => s.red().to_string(),
    }
}

fn print_list(records: &[WorkoutRecord]) {
    if records.is_empty() {
        println!("{}", "  (no workouts yet)".dimmed());
        return;
    }

    println!("{}", "Workouts:".cyan().bold());

    let idx_w = records.len().to_string().len();
    let mut left = Vec::<String>::new();
    let mut right = Vec::<String>::new();

    for (i, r) in records.iter().enumerate() {
        let idx = format!("{:>width$}", i + 1, width = idx_w).yellow();
        let parts = if r.body_parts.is_empty() {
            String::new()
        } else {
            format!("– {}", r.body_parts.join(", ")).dimmed().to_string()
        };
        left.push(format!(
            " {} • {} ({}) {}",
            idx,
            r.goal.bold(),
            r.difficulty.to_string().yellow(),
            parts
        ));
        right.push(format!(
            "{}  {}  {}/{} {}",
            r.date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string().dimmed(),
            format_clock(r.duration_seconds),
            r.completed_exercise_count,
            r.total_exercises,
            rate_colored(r.completion_rate_percent)
        ));
    }

    let pad_plain = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);
    for (l, r) in left.into_iter().zip(right) {
        let pad = pad_plain + (l.chars().count() - plain_len(&l));
        println!("{:<pad$} {} {}", l, "|".blue(), r, pad = pad);
    }
}

fn print_record(r: &WorkoutRecord) {
    let start = r.start_time.with_timezone(&Local);
    let end = r.end_time.with_timezone(&Local);

    println!("{}: {} ({})", "Workout".cyan().bold(), r.goal.bold(), r.difficulty.to_string().yellow());
    println!("{}: {}", "Id".dimmed(), r.id);
    println!(
        "{}: {} - {} ({})",
        "When".dimmed(),
        start.format("%a %b %d %H:%M"),
        end.format("%H:%M"),
        format_clock(r.duration_seconds)
    );
    if !r.body_parts.is_empty() {
        println!("{}: {}", "Focus".dimmed(), r.body_parts.join(", "));
    }
    println!(
        "{}: {} of {} exercises, {}",
        "Completed".dimmed(),
        r.completed_exercise_count,
        r.total_exercises,
        rate_colored(r.completion_rate_percent).trim_start()
    );

    if !r.exercises.is_empty() {
        println!("\n{}", "Exercises done:".cyan().bold());
        for (i, ex) in r.exercises.iter().enumerate() {
            println!(
                " {} • {} ({})",
                format!("{}", i + 1).yellow(),
                ex.name.bold(),
                ex.muscle
            );
        }
    }
}
