use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

pub type DB = SqlitePool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS kv (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS exercises (
        idx           INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT NOT NULL UNIQUE,
        muscle        TEXT NOT NULL,
        exercise_type TEXT NOT NULL,
        difficulty    TEXT NOT NULL,
        instructions  TEXT NOT NULL DEFAULT '',
        equipment     TEXT,
        created_at    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_progress (
        id               TEXT PRIMARY KEY,
        user_id          TEXT NOT NULL,
        exercise         TEXT NOT NULL,
        sets             INTEGER NOT NULL DEFAULT 0,
        reps             INTEGER NOT NULL DEFAULT 0,
        weight           REAL NOT NULL DEFAULT 0,
        duration_seconds INTEGER NOT NULL DEFAULT 0,
        date             TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS user_progress_user ON user_progress(user_id, date)",
];

pub async fn open(path: &str) -> Result<DB> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database {}", path))?;

    init(&pool).await?;
    debug!(path, "database ready");
    Ok(pool)
}

/// Private in-memory database. A single connection keeps every query on the
/// same memory image.
pub async fn open_in_memory() -> Result<DB> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init(&pool).await?;
    Ok(pool)
}

pub async fn init(pool: &DB) -> Result<()> {
    for stmt in SCHEMA {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .context("Failed to create schema")?;
    }
    Ok(())
}
