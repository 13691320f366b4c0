use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::models::WorkoutRecord;

pub const HISTORY_KEY: &str = "workout_history";
pub const HISTORY_CAP: usize = 50;

/// Workout history kept as one JSON list under a fixed key, newest first.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn load(&self) -> Result<Vec<WorkoutRecord>> {
        let mut conn = self.pool.acquire().await?;
        read_records(&mut conn).await
    }

    /// Puts `record` at the front of the history, evicting the oldest entries
    /// past [`HISTORY_CAP`]. Returns `false` if a record with the same id is
    /// already stored.
    pub async fn append(&self, record: &WorkoutRecord) -> Result<bool> {
        self.locked(|records| {
            if records.iter().any(|r| r.id == record.id) {
                debug!(id = %record.id, "duplicate workout record ignored");
                return (false, false);
            }

            records.insert(0, record.clone());
            records.truncate(HISTORY_CAP);
            debug!(id = %record.id, stored = records.len(), "workout record saved");
            (true, true)
        })
        .await
    }

    /// Deletes every record. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        self.locked(|records| {
            let n = records.len();
            records.clear();
            (n, true)
        })
        .await
    }

    /// Looks a record up by id, or by its 1-based position (newest = 1).
    pub async fn get(&self, id_or_index: &str) -> Result<Option<WorkoutRecord>> {
        let records = self.load().await?;

        if let Some(r) = records.iter().find(|r| r.id == id_or_index) {
            return Ok(Some(r.clone()));
        }

        Ok(id_or_index
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| records.get(i).cloned()))
    }

    /// Read-modify-write of the whole list under one write transaction; `f`
    /// returns its result and whether the list must be written back.
    /// `BEGIN IMMEDIATE` takes the write lock before reading, so concurrent
    /// writers queue on the busy timeout instead of overwriting each other.
    async fn locked<T>(&self, f: impl FnOnce(&mut Vec<WorkoutRecord>) -> (T, bool)) -> Result<T> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .context("Failed to lock workout history")?;

        let res = async {
            let mut records = read_records(&mut conn).await?;
            let (out, dirty) = f(&mut records);
            if dirty {
                write_records(&mut conn, &records).await?;
            }
            Ok::<T, anyhow::Error>(out)
        }
        .await;

        let end = if res.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(e) = sqlx::query(end).execute(&mut *conn).await {
            warn!(error = %e, statement = end, "failed to end history transaction");
            res?;
            return Err(anyhow::Error::new(e).context("Failed to commit workout history"));
        }
        res
    }
}

async fn read_records(conn: &mut SqliteConnection) -> Result<Vec<WorkoutRecord>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
        .bind(HISTORY_KEY)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to read workout history")?;

    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    match serde_json::from_str(&raw) {
        Ok(records) => Ok(records),
        Err(e) => {
            warn!(error = %e, "stored workout history is unreadable, starting fresh");
            Ok(Vec::new())
        }
    }
}

async fn write_records(conn: &mut SqliteConnection, records: &[WorkoutRecord]) -> Result<()> {
    if records.is_empty() {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(HISTORY_KEY)
            .execute(&mut *conn)
            .await
            .context("Failed to clear workout history")?;
        return Ok(());
    }

    let content = serde_json::to_string(records)?;
    sqlx::query(
        r#"
        INSERT INTO kv (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(HISTORY_KEY)
    .bind(content)
    .execute(&mut *conn)
    .await
    .context("Failed to write workout history")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{db, models::Difficulty};

    fn record(id: &str, minute: i64) -> WorkoutRecord {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minute);
        WorkoutRecord {
            id: id.to_string(),
            date: start,
            start_time: start,
            end_time: start,
            goal: "General Fitness".into(),
            body_parts: vec![],
            difficulty: Difficulty::Beginner,
            duration_seconds: 0,
            total_exercises: 1,
            completed_exercise_count: 0,
            completion_rate_percent: 0,
            exercises: vec![],
        }
    }

    async fn store() -> HistoryStore {
        HistoryStore::new(db::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let s = store().await;
        assert!(s.load().await.unwrap().is_empty());
        assert_eq!(s.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn newest_first_and_deduplicated() {
        let s = store().await;
        assert!(s.append(&record("a", 0)).await.unwrap());
        assert!(s.append(&record("b", 1)).await.unwrap());
        assert!(!s.append(&record("a", 0)).await.unwrap());

        let ids: Vec<_> = s.load().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[tokio::test]
    async fn capped_at_fifty_evicting_oldest() {
        let s = store().await;
        for i in 0..(HISTORY_CAP + 5) {
            s.append(&record(&format!("r{i}"), i as i64)).await.unwrap();
        }

        let records = s.load().await.unwrap();
        assert_eq!(records.len(), HISTORY_CAP);
        assert_eq!(records.first().unwrap().id, format!("r{}", HISTORY_CAP + 4));
        assert_eq!(records.last().unwrap().id, "r5");
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let s = store().await;
        s.append(&record("a", 0)).await.unwrap();
        s.append(&record("b", 1)).await.unwrap();
        assert_eq!(s.clear().await.unwrap(), 2);
        assert!(s.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_by_id_or_position() {
        let s = store().await;
        s.append(&record("a", 0)).await.unwrap();
        s.append(&record("b", 1)).await.unwrap();

        assert_eq!(s.get("a").await.unwrap().unwrap().id, "a");
        assert_eq!(s.get("1").await.unwrap().unwrap().id, "b");
        assert_eq!(s.get("2").await.unwrap().unwrap().id, "a");
        assert!(s.get("0").await.unwrap().is_none());
        assert!(s.get("3").await.unwrap().is_none());
        assert!(s.get("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_history_reads_as_empty() {
        let pool = db::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO kv (key, value) VALUES (?, 'not json')")
            .bind(HISTORY_KEY)
            .execute(&pool)
            .await
            .unwrap();

        let s = HistoryStore::new(pool);
        assert!(s.load().await.unwrap().is_empty());
        assert!(s.append(&record("a", 0)).await.unwrap());
        assert_eq!(s.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_also_drops_a_corrupt_history() {
        let pool = db::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO kv (key, value) VALUES (?, 'not json')")
            .bind(HISTORY_KEY)
            .execute(&pool)
            .await
            .unwrap();

        let s = HistoryStore::new(pool.clone());
        assert_eq!(s.clear().await.unwrap(), 0);

        let left: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(HISTORY_KEY)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(left.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        let pool = db::open(path.to_str().unwrap()).await.unwrap();

        // Two handles over separate pools behave like two processes.
        let other = db::open(path.to_str().unwrap()).await.unwrap();
        let stores = [HistoryStore::new(pool), HistoryStore::new(other)];

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..12 {
            let s = stores[i % 2].clone();
            tasks.spawn(async move { s.append(&record(&format!("c{i}"), i as i64)).await });
        }
        while let Some(res) = tasks.join_next().await {
            assert!(res.unwrap().unwrap());
        }

        let mut ids: Vec<_> = stores[0].load().await.unwrap().into_iter().map(|r| r.id).collect();
        ids.sort();
        let mut want: Vec<_> = (0..12).map(|i| format!("c{i}")).collect();
        want.sort();
        assert_eq!(ids, want);
    }
}
