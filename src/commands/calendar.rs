use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, TimeZone};
use colored::Colorize;
use fitrack::{
    HistoryStore,
    models::WorkoutRecord,
    stats::record_day,
    types::{OutputFmt, emit},
    utils::format_duration,
};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Serialize)]
struct MonthJson<'a> {
    year: i32,
    month: u32,
    workouts: Vec<&'a WorkoutRecord>,
}

/// First and last day of the month, or `None` if it doesn't exist.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Records falling in `first..=last` (local days), oldest first.
fn workouts_between<'a, Tz: TimeZone>(
    records: &'a [WorkoutRecord],
    tz: &Tz,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<&'a WorkoutRecord> {
    let mut hits: Vec<_> = records
        .iter()
        .filter(|r| (first..=last).contains(&record_day(r, tz)))
        .collect();
    hits.sort_by_key(|r| r.start_time);
    hits
}

pub async fn handle(pool: &SqlitePool, year: Option<i32>, month: Option<u32>, fmt: OutputFmt) -> Result<()> {
    let now = Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    if !(1..=12).contains(&month) {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    }
    let Some((first_day, last_day)) = month_bounds(year, month) else {
        println!("{} year {} is out of range", "error:".red().bold(), year);
        return Ok(());
    };

    let records = HistoryStore::new(pool.clone()).load().await?;
    let workouts = workouts_between(&records, &Local, first_day, last_day);

    let json = MonthJson { year, month, workouts };
    emit(fmt, &json, || print_month(first_day, last_day, &json.workouts));

    Ok(())
}

fn print_month(first_day: NaiveDate, last_day: NaiveDate, workouts: &[&WorkoutRecord]) {
    println!("\n{}", first_day.format("%B %Y").to_string().bold().cyan());
    println!("{}", "Su Mo Tu We Th Fr Sa".dimmed());

    let active: BTreeSet<u32> = workouts.iter().map(|r| record_day(r, &Local).day()).collect();

    let first_weekday = first_day.weekday().num_days_from_sunday() as usize;
    print!("{}", "   ".repeat(first_weekday));

    for day in 1..=last_day.day() {
        if active.contains(&day) {
            print!("{} ", format!("{:2}", day).green().bold());
        } else {
            print!("{:2} ", day);
        }

        if (first_weekday + day as usize) % 7 == 0 {
            println!();
        }
    }
    println!("\n");

    if workouts.is_empty() {
        println!("{}", "  (no workouts this month)".dimmed());
        return;
    }

    println!("{}", "Workouts:".bold().cyan());
    for r in workouts {
        let start = r.start_time.with_timezone(&Local);
        let end = r.end_time.with_timezone(&Local);
        println!(
            "  {} - {} ({}) | {} {}/{} ({}%)",
            start.format("%a %b %d %H:%M").to_string().green(),
            end.format("%H:%M"),
            format_duration(r.duration_seconds),
            r.goal.bold(),
            r.completed_exercise_count,
            r.total_exercises,
            r.completion_rate_percent
        );
        if !r.body_parts.is_empty() {
            println!("    {}", r.body_parts.join(", ").dimmed());
        }
    }
}
