use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use fitrack::{
    HistoryStore,
    stats::{self, HistorySummary},
    types::{OutputFmt, emit},
    utils::format_duration,
};
use sqlx::SqlitePool;

/// Plots `data` (oldest first) on a fixed `min..=max` value axis.
fn create_ascii_graph(
    data: &[(DateTime<Utc>, f32)],
    width: usize,
    height: usize,
    (min_value, max_value): (f32, f32),
    title: &str,
) -> Vec<String> {
    if data.len() < 2 {
        return vec!["Not enough workouts to graph yet".to_string()];
    }
    let width = width.max(2);
    let height = height.max(2);
    let range = max_value - min_value;

    let point = |i: usize, value: f32| {
        let x = (i as f32 / (data.len() - 1) as f32 * (width - 1) as f32) as usize;
        let y = ((value.clamp(min_value, max_value) - min_value) / range * (height - 1) as f32) as usize;
        (x.min(width - 1), height - 1 - y.min(height - 1))
    };

    let mut grid = vec![vec![' '; width]; height];

    for (i, &(_, value)) in data.iter().enumerate() {
        let (x, y) = point(i, value);
        grid[y][x] = '●';

        if i > 0 {
            let (prev_x, prev_y) = point(i - 1, data[i - 1].1);
            let dx = x as isize - prev_x as isize;
            let dy = y as isize - prev_y as isize;
            let steps = dx.abs().max(dy.abs());

            for step in 1..steps {
                let px = (prev_x as isize + dx * step / steps) as usize;
                let py = (prev_y as isize + dy * step / steps) as usize;
                if grid[py][px] == ' ' {
                    grid[py][px] = '·';
                }
            }
        }
    }

    let step = range / (height - 1) as f32;
    let mut result = vec![format!("\n{}", title.bold()), "─".repeat(width + 7)];

    for (i, row) in grid.iter().enumerate() {
        let value = min_value + step * (height - 1 - i) as f32;
        result.push(format!("{:4.0} │{}", value, row.iter().collect::<String>()));
    }

    result.push(format!("     └{}", "─".repeat(width)));

    if let (Some(first), Some(last)) = (data.first(), data.last()) {
        let first = first.0.with_timezone(&Local).format("%Y-%m-%d").to_string();
        let last = last.0.with_timezone(&Local).format("%Y-%m-%d").to_string();
        let gap = width.saturating_sub(first.len() + last.len()).max(2);
        result.push(format!("      {}{}{}", first, " ".repeat(gap), last));
    }

    result
}

fn print_summary(s: &HistorySummary) {
    if s.workouts == 0 {
        println!(
            "{} no workouts yet -- start one with `fitrack workout start`",
            "info:".blue().bold()
        );
        return;
    }

    println!("{}", "Training status".cyan().bold());
    println!("{}: {}", "Workouts".cyan().bold(), s.workouts);
    println!("{}: {}", "Time trained".cyan().bold(), format_duration(s.total_seconds));
    println!(
        "{}: {} of {} planned",
        "Exercises done".cyan().bold(),
        s.exercises_completed,
        s.exercises_planned
    );
    println!(
        "{}: {}%",
        "Avg completion".cyan().bold(),
        s.average_completion_percent
    );

    let streak = if s.current_streak_days > 0 {
        format!("{} day(s)", s.current_streak_days).green().to_string()
    } else {
        "none".dimmed().to_string()
    };
    println!(
        "{}: {} (longest {})",
        "Current streak".cyan().bold(),
        streak,
        s.longest_streak_days
    );

    println!();
    println!("{}", "Goals:".cyan().bold());
    for (goal, n) in &s.by_goal {
        println!("  • {} {}", goal.bold(), format!("×{}", n).dimmed());
    }

    println!();
    println!("{}", "Workouts per week:".cyan().bold());
    for (week, n) in &s.by_week {
        println!(
            "  {} {} {}",
            week.format("%Y-%m-%d").to_string().dimmed(),
            "█".repeat(*n).green(),
            n
        );
    }
}

pub async fn handle(pool: &SqlitePool, graph: bool, fmt: OutputFmt) -> Result<()> {
    let records = HistoryStore::new(pool.clone()).load().await?;
    let summary = stats::summarize(&records, &Local, Local::now().date_naive());

    emit(fmt, &summary, || {
        print_summary(&summary);

        if graph && summary.workouts > 0 {
            let data: Vec<(DateTime<Utc>, f32)> = records
                .iter()
                .rev()
                .map(|r| (r.date, r.completion_rate_percent as f32))
                .collect();

            let (term_width, term_height) = term_size::dimensions().unwrap_or((80, 24));
            let width = (term_width / 2).min(60);
            let height = (term_height / 2).min(15);

            for line in create_ascii_graph(&data, width, height, (0.0, 100.0), "Completion rate (%)") {
                println!("{}", line);
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn series(values: &[f32]) -> Vec<(DateTime<Utc>, f32)> {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (t0 + Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn single_point_is_not_graphed() {
        let lines = create_ascii_graph(&series(&[50.0]), 20, 5, (0.0, 100.0), "t");
        assert_eq!(lines, ["Not enough workouts to graph yet"]);
    }

    #[test]
    fn points_land_on_the_axis_extremes() {
        let lines = create_ascii_graph(&series(&[0.0, 100.0]), 10, 5, (0.0, 100.0), "t");

        // title, rule, 5 rows, x-axis, dates
        assert_eq!(lines.len(), 9);
        let top = &lines[2];
        let bottom = &lines[6];
        assert!(top.starts_with(" 100 │"));
        assert!(top.ends_with('●'));
        assert!(bottom.starts_with("   0 │●"));
        assert!(lines[8].contains("2026-03-0"));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let lines = create_ascii_graph(&series(&[150.0, -3.0, 40.0]), 12, 4, (0.0, 100.0), "t");
        assert_eq!(lines.len(), 8);
        assert!(lines[2].contains('●'));
        assert!(lines[5].contains('●'));
    }
}
