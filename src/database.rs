use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mobc::{Manager, Pool};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::models::{IngestionRun, NewsItem, Pillar, Result, RunStatus};

fn log_rusqlite_error(context: &str, err: &rusqlite::Error) {
    error!("🔥 SQLite Error in {}: {:?}", context, err);
}

pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    pub fn new(db_path: String) -> Self {
        debug!("🔧 Creating SqliteManager for path: {}", db_path);
        Self { db_path }
    }
}

#[async_trait]
impl Manager for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        debug!("🔌 Opening database: {}", self.db_path);
        let conn = Connection::open(&self.db_path)?;

        // Some PRAGMA statements return a row; fall back to query_row for those.
        let exec_pragma = |conn: &Connection, pragma: &str| -> SqliteResult<()> {
            match conn.execute(pragma, []) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::ExecuteReturnedResults) => {
                    conn.query_row(pragma, [], |_| Ok(()))
                }
                Err(e) => Err(e),
            }
        };

        exec_pragma(&conn, "PRAGMA journal_mode=WAL")?;
        exec_pragma(&conn, "PRAGMA synchronous=NORMAL")?;
        exec_pragma(&conn, "PRAGMA temp_store=memory")?;

        if let Err(e) = init_database(&conn) {
            log_rusqlite_error("init_database", &e);
            return Err(e);
        }

        Ok(conn)
    }

    async fn check(&self, conn: Self::Connection) -> std::result::Result<Self::Connection, Self::Error> {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(conn)
    }
}

fn init_database(conn: &Connection) -> SqliteResult<()> {
    debug!("🏗️ init_database() - Creating tables and indexes...");

    create_pillars_table(conn)?;
    create_ingestion_runs_table(conn)?;
    create_indexes(conn)?;

    Ok(())
}

pub type DbPool = Pool<SqliteManager>;

pub async fn create_db_pool(db_path: &str) -> Result<DbPool> {
    if let Some(parent) = Path::new(db_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let manager = SqliteManager::new(db_path.to_string());
    let pool = Pool::builder().max_open(10).max_idle(5).build(manager);

    info!("✓ SQLite connection pool created: {}", db_path);
    Ok(pool)
}

fn create_pillars_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS pillars (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            keywords TEXT NOT NULL,
            news_items TEXT NOT NULL,
            last_updated TEXT
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_ingestion_runs_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_runs (
            id TEXT PRIMARY KEY,
            job_name TEXT NOT NULL,
            status TEXT NOT NULL,
            total_entities INTEGER NOT NULL,
            success_count INTEGER NOT NULL,
            failed_count INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_indexes(conn: &Connection) -> SqliteResult<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_pillars_name ON pillars(name)",
        "CREATE INDEX IF NOT EXISTS idx_ingestion_runs_created_at ON ingestion_runs(created_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_ingestion_runs_job_name ON ingestion_runs(job_name)",
    ];

    for index_sql in indexes.iter() {
        conn.execute(index_sql, [])?;
    }
    Ok(())
}

/// Persistence seam for pillars and the ingestion audit trail.
#[async_trait]
pub trait PillarStore: Send + Sync {
    async fn list_pillars(&self) -> Result<Vec<Pillar>>;

    /// Replace a pillar's news items wholesale and stamp the refresh time.
    async fn replace_pillar_items(
        &self,
        pillar_id: &str,
        items: &[NewsItem],
        refreshed_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn upsert_pillar(&self, pillar: &Pillar) -> Result<()>;

    async fn append_ingestion_run(&self, record: &IngestionRun) -> Result<()>;

    /// Most recent audit records, newest first.
    async fn recent_runs(&self, limit: usize) -> Result<Vec<IngestionRun>>;
}

pub struct SqlitePillarStore {
    pool: DbPool,
}

impl SqlitePillarStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_pillar(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pillar> {
    let keywords_json: String = row.get(2)?;
    let items_json: String = row.get(3)?;
    let last_updated_str: Option<String> = row.get(4)?;

    // A malformed JSON column degrades to empty rather than poisoning the list.
    let keywords: Vec<String> = serde_json::from_str(&keywords_json).unwrap_or_default();
    let news_items: Vec<NewsItem> = serde_json::from_str(&items_json).unwrap_or_default();

    let last_updated = last_updated_str.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    });

    Ok(Pillar {
        id: row.get(0)?,
        name: row.get(1)?,
        keywords,
        news_items,
        last_updated,
    })
}

#[async_trait]
impl PillarStore for SqlitePillarStore {
    async fn list_pillars(&self) -> Result<Vec<Pillar>> {
        let conn = self.pool.get().await?;

        let mut stmt = conn.prepare(
            "SELECT id, name, keywords, news_items, last_updated FROM pillars ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], row_to_pillar)?;

        let mut pillars = Vec::new();
        for pillar in rows {
            match pillar {
                Ok(p) => pillars.push(p),
                Err(e) => warn!("⚠️ Skipping unreadable pillar row: {}", e),
            }
        }

        debug!("📚 Loaded {} pillars", pillars.len());
        Ok(pillars)
    }

    async fn replace_pillar_items(
        &self,
        pillar_id: &str,
        items: &[NewsItem],
        refreshed_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.pool.get().await?;
        let items_json = serde_json::to_string(items)?;

        let updated = conn.execute(
            "UPDATE pillars SET news_items = ?1, last_updated = ?2 WHERE id = ?3",
            params![items_json, refreshed_at.to_rfc3339(), pillar_id],
        )?;

        if updated == 0 {
            return Err(format!("pillar not found: {}", pillar_id).into());
        }

        debug!("💾 Stored {} items for pillar {}", items.len(), pillar_id);
        Ok(())
    }

    async fn upsert_pillar(&self, pillar: &Pillar) -> Result<()> {
        let conn = self.pool.get().await?;
        let keywords_json = serde_json::to_string(&pillar.keywords)?;
        let items_json = serde_json::to_string(&pillar.news_items)?;
        let last_updated = pillar.last_updated.map(|dt| dt.to_rfc3339());

        conn.execute(
            r#"
            INSERT INTO pillars (id, name, keywords, news_items, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                keywords = excluded.keywords,
                news_items = excluded.news_items,
                last_updated = excluded.last_updated
            "#,
            params![pillar.id, pillar.name, keywords_json, items_json, last_updated],
        )?;

        Ok(())
    }

    async fn append_ingestion_run(&self, record: &IngestionRun) -> Result<()> {
        let conn = self.pool.get().await?;

        conn.execute(
            r#"
            INSERT INTO ingestion_runs (
                id, job_name, status, total_entities, success_count, failed_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.job_name,
                record.status.as_str(),
                record.total_entities as i64,
                record.success_count as i64,
                record.failed_count as i64,
                record.created_at.to_rfc3339(),
            ],
        )?;

        debug!("📝 Recorded ingestion run {} ({})", record.id, record.status.as_str());
        Ok(())
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<IngestionRun>> {
        let conn = self.pool.get().await?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, job_name, status, total_entities, success_count, failed_count, created_at
            FROM ingestion_runs ORDER BY created_at DESC LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let status_str: String = row.get(2)?;
            let created_at_str: String = row.get(6)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        6,
                        created_at_str.clone(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Utc);

            Ok(IngestionRun {
                id: row.get(0)?,
                job_name: row.get(1)?,
                status: RunStatus::from_str(&status_str),
                total_entities: row.get::<_, i64>(3)? as usize,
                success_count: row.get::<_, i64>(4)? as usize,
                failed_count: row.get::<_, i64>(5)? as usize,
                created_at,
            })
        })?;

        let mut runs = Vec::new();
        for run in rows {
            runs.push(run?);
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_db_path() -> String {
        std::env::temp_dir()
            .join(format!("digest-test-{}.db", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    fn sample_pillar(id: &str, name: &str) -> Pillar {
        Pillar {
            id: id.to_string(),
            name: name.to_string(),
            keywords: vec!["seo".to_string(), "serp".to_string()],
            news_items: Vec::new(),
            last_updated: None,
        }
    }

    #[tokio::test]
    async fn pillar_round_trip_and_item_replacement() {
        let path = temp_db_path();
        let pool = create_db_pool(&path).await.unwrap();
        let store = SqlitePillarStore::new(pool);

        store
            .upsert_pillar(&sample_pillar("p1", "Search Marketing"))
            .await
            .unwrap();

        let items = vec![NewsItem {
            title: "Algorithm update rolls out".to_string(),
            ..Default::default()
        }];
        let stamp = Utc::now();
        store.replace_pillar_items("p1", &items, stamp).await.unwrap();

        let pillars = store.list_pillars().await.unwrap();
        assert_eq!(pillars.len(), 1);
        assert_eq!(pillars[0].news_items.len(), 1);
        assert_eq!(pillars[0].news_items[0].title, "Algorithm update rolls out");
        assert!(pillars[0].last_updated.is_some());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn replacing_items_for_missing_pillar_errors() {
        let path = temp_db_path();
        let pool = create_db_pool(&path).await.unwrap();
        let store = SqlitePillarStore::new(pool);

        let result = store.replace_pillar_items("ghost", &[], Utc::now()).await;
        assert!(result.is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn ingestion_runs_come_back_newest_first() {
        let path = temp_db_path();
        let pool = create_db_pool(&path).await.unwrap();
        let store = SqlitePillarStore::new(pool);

        for (i, status) in [(1usize, RunStatus::Success), (2, RunStatus::Partial)] {
            store
                .append_ingestion_run(&IngestionRun {
                    id: Uuid::new_v4().to_string(),
                    job_name: "daily-news-update".to_string(),
                    status,
                    total_entities: 3,
                    success_count: 3 - i,
                    failed_count: i - 1,
                    created_at: Utc::now() + chrono::Duration::seconds(i as i64),
                })
                .await
                .unwrap();
        }

        let runs = store.recent_runs(10).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].status, RunStatus::Partial);
        assert_eq!(runs[1].status, RunStatus::Success);

        let _ = std::fs::remove_file(&path);
    }
}
