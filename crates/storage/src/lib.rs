use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use companion_core::MoodRecord;
use parking_lot::RwLock;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

pub trait MoodRepository: Send + Sync {
    async fn append_mood(&self, record: &MoodRecord) -> Result<()>;
    async fn latest_mood(&self, uid: &str) -> Result<Option<MoodRecord>>;
    async fn mood_history(&self, uid: &str, limit: usize) -> Result<Vec<MoodRecord>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    moods: Arc<RwLock<HashMap<String, Vec<MoodRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoodRepository for MemoryStore {
    async fn append_mood(&self, record: &MoodRecord) -> Result<()> {
        self.moods
            .write()
            .entry(record.uid.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn latest_mood(&self, uid: &str) -> Result<Option<MoodRecord>> {
        Ok(self
            .moods
            .read()
            .get(uid)
            .and_then(|records| records.last().cloned()))
    }

    async fn mood_history(&self, uid: &str, limit: usize) -> Result<Vec<MoodRecord>> {
        let guard = self.moods.read();
        let Some(records) = guard.get(uid) else {
            return Ok(Vec::new());
        };

        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // every connection to an in-memory database is a separate database
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mood_entries (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              uid TEXT NOT NULL,
              timestamp TEXT NOT NULL,
              answers_json TEXT NOT NULL,
              mood_score REAL NOT NULL,
              mood_label TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_mood_entries_uid ON mood_entries (uid, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MoodRecord> {
        let uid: String = row.try_get("uid")?;
        let answers_json: String = row.try_get("answers_json")?;
        let answers = serde_json::from_str(&answers_json)
            .with_context(|| format!("corrupt mood answers for {}: {}", uid, answers_json))?;

        Ok(MoodRecord {
            uid,
            timestamp: row.try_get("timestamp")?,
            answers,
            mood_score: row.try_get("mood_score")?,
            mood_label: row.try_get("mood_label")?,
        })
    }
}

impl MoodRepository for SqliteStore {
    async fn append_mood(&self, record: &MoodRecord) -> Result<()> {
        let answers_json = serde_json::to_string(&record.answers)?;

        sqlx::query(
            r#"
            INSERT INTO mood_entries (uid, timestamp, answers_json, mood_score, mood_label)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.uid)
        .bind(&record.timestamp)
        .bind(answers_json)
        .bind(record.mood_score)
        .bind(&record.mood_label)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_mood(&self, uid: &str) -> Result<Option<MoodRecord>> {
        let row = sqlx::query(
            r#"
            SELECT uid, timestamp, answers_json, mood_score, mood_label
            FROM mood_entries
            WHERE uid = ?1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn mood_history(&self, uid: &str, limit: usize) -> Result<Vec<MoodRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT uid, timestamp, answers_json, mood_score, mood_label
            FROM mood_entries
            WHERE uid = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(uid)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::record_from_row).collect()
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl MoodRepository for Store {
    async fn append_mood(&self, record: &MoodRecord) -> Result<()> {
        match self {
            Store::Memory(store) => store.append_mood(record).await,
            Store::Sqlite(store) => store.append_mood(record).await,
        }
    }

    async fn latest_mood(&self, uid: &str) -> Result<Option<MoodRecord>> {
        match self {
            Store::Memory(store) => store.latest_mood(uid).await,
            Store::Sqlite(store) => store.latest_mood(uid).await,
        }
    }

    async fn mood_history(&self, uid: &str, limit: usize) -> Result<Vec<MoodRecord>> {
        match self {
            Store::Memory(store) => store.mood_history(uid, limit).await,
            Store::Sqlite(store) => store.mood_history(uid, limit).await,
        }
    }
}
