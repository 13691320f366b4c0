use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::ProgressEntry;

/// Config key holding the id progress entries are filed under.
pub const USER_KEY: &str = "user";
pub const DEFAULT_USER: &str = "local";

/// Manual per-exercise progress, kept per user.
#[derive(Clone)]
pub struct ProgressLog {
    pool: SqlitePool,
}

impl ProgressLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        user_id: &str,
        exercise: &str,
        sets: u32,
        reps: u32,
        weight: f32,
        duration_seconds: u32,
    ) -> Result<ProgressEntry> {
        let entry = ProgressEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exercise: exercise.to_string(),
            sets,
            reps,
            weight,
            duration_seconds,
            date: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO user_progress
              (id, user_id, exercise, sets, reps, weight, duration_seconds, date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.exercise)
        .bind(entry.sets)
        .bind(entry.reps)
        .bind(entry.weight)
        .bind(entry.duration_seconds)
        .bind(entry.date.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save progress for `{}`", exercise))?;

        Ok(entry)
    }

    /// Newest first. `exercise` matches case-insensitively.
    pub async fn list(&self, user_id: &str, exercise: Option<&str>) -> Result<Vec<ProgressEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, exercise, sets, reps, weight, duration_seconds, date
            FROM user_progress
            WHERE user_id = ?1
              AND (?2 IS NULL OR lower(exercise) = lower(?2))
            ORDER BY date DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(exercise)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read progress")?;

        rows.iter()
            .map(|r| {
                let date: String = r.get("date");
                Ok(ProgressEntry {
                    id: r.get("id"),
                    user_id: r.get("user_id"),
                    exercise: r.get("exercise"),
                    sets: r.get("sets"),
                    reps: r.get("reps"),
                    weight: r.get("weight"),
                    duration_seconds: r.get("duration_seconds"),
                    date: DateTime::parse_from_rfc3339(&date)
                        .with_context(|| format!("bad progress timestamp `{}`", date))?
                        .with_timezone(&Utc),
                })
            })
            .collect()
    }
}
