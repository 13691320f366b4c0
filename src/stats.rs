use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, TimeZone};
use itertools::Itertools;
use serde::Serialize;

use crate::models::WorkoutRecord;

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct HistorySummary {
    pub workouts: usize,
    pub total_seconds: u64,
    pub exercises_completed: usize,
    pub exercises_planned: usize,
    pub average_completion_percent: u8,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    /// Goal name and how many workouts had it, most frequent first.
    pub by_goal: Vec<(String, usize)>,
    /// ISO week start (Monday) and number of workouts that week, oldest first.
    pub by_week: Vec<(NaiveDate, usize)>,
}

/// Calendar day a record belongs to in `tz`.
pub fn record_day<Tz: TimeZone>(r: &WorkoutRecord, tz: &Tz) -> NaiveDate {
    r.date.with_timezone(tz).date_naive()
}

pub fn summarize<Tz: TimeZone>(records: &[WorkoutRecord], tz: &Tz, today: NaiveDate) -> HistorySummary {
    if records.is_empty() {
        return HistorySummary::default();
    }

    let total_rate: u64 = records.iter().map(|r| r.completion_rate_percent as u64).sum();
    let average = (total_rate as f64 / records.len() as f64).round() as u8;

    let days: BTreeSet<NaiveDate> = records.iter().map(|r| record_day(r, tz)).collect();
    let (current, longest) = streaks(&days, today);

    let by_goal = records
        .iter()
        .map(|r| r.goal.clone())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect();

    let by_week = records
        .iter()
        .map(|r| week_start(record_day(r, tz)))
        .sorted()
        .chunk_by(|d| *d)
        .into_iter()
        .map(|(week, group)| (week, group.count()))
        .collect();

    HistorySummary {
        workouts: records.len(),
        total_seconds: records.iter().map(|r| r.duration_seconds).sum(),
        exercises_completed: records.iter().map(|r| r.completed_exercise_count).sum(),
        exercises_planned: records.iter().map(|r| r.total_exercises).sum(),
        average_completion_percent: average,
        current_streak_days: current,
        longest_streak_days: longest,
        by_goal,
        by_week,
    }
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - chrono::Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// (current, longest) runs of consecutive workout days. The current run may
/// end yesterday: today's workout might just not have happened yet.
fn streaks(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for &d in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(d) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(d);
    }

    let mut current = 0;
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|y| days.contains(y))
    };
    while let Some(d) = cursor.filter(|d| days.contains(d)) {
        current += 1;
        cursor = d.pred_opt();
    }

    (current, longest)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::Difficulty;

    fn rec(day: u32, goal: &str, rate: u8, secs: u64) -> WorkoutRecord {
        let at = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
        WorkoutRecord {
            id: format!("{day}-{goal}"),
            date: at,
            start_time: at,
            end_time: at,
            goal: goal.into(),
            body_parts: vec![],
            difficulty: Difficulty::Beginner,
            duration_seconds: secs,
            total_exercises: 4,
            completed_exercise_count: (rate as usize) * 4 / 100,
            completion_rate_percent: rate,
            exercises: vec![],
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn empty_history() {
        assert_eq!(summarize(&[], &Utc, day(1)), HistorySummary::default());
    }

    #[test]
    fn totals_and_goal_counts() {
        let records = vec![
            rec(10, "Cardio", 100, 600),
            rec(9, "Muscle Gain", 50, 1200),
            rec(9, "Cardio", 75, 300),
        ];
        let s = summarize(&records, &Utc, day(10));

        assert_eq!(s.workouts, 3);
        assert_eq!(s.total_seconds, 2100);
        assert_eq!(s.exercises_completed, 4 + 2 + 3);
        assert_eq!(s.exercises_planned, 12);
        assert_eq!(s.average_completion_percent, 75);
        assert_eq!(
            s.by_goal,
            vec![("Cardio".to_string(), 2), ("Muscle Gain".to_string(), 1)]
        );
    }

    #[test]
    fn streaks_count_consecutive_days() {
        let records = vec![rec(1, "a", 0, 0), rec(2, "a", 0, 0), rec(3, "a", 0, 0), rec(6, "a", 0, 0), rec(7, "a", 0, 0)];

        let s = summarize(&records, &Utc, day(7));
        assert_eq!(s.current_streak_days, 2);
        assert_eq!(s.longest_streak_days, 3);

        // Nothing yet today, but yesterday still counts.
        let s = summarize(&records, &Utc, day(8));
        assert_eq!(s.current_streak_days, 2);

        let s = summarize(&records, &Utc, day(9));
        assert_eq!(s.current_streak_days, 0);
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        // 2026-03-02 is a Monday.
        assert_eq!(week_start(day(2)), day(2));
        assert_eq!(week_start(day(8)), day(2));
        assert_eq!(week_start(day(9)), day(9));

        let records = vec![rec(3, "a", 0, 0), rec(4, "a", 0, 0), rec(10, "a", 0, 0)];
        let s = summarize(&records, &Utc, day(10));
        assert_eq!(s.by_week, vec![(day(2), 2), (day(9), 1)]);
    }
}
