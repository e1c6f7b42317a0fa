use crate::models::search::{NewSearchRecord, SearchRecord};
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::search_history::SearchHistoryRepository;

/// Long-lived handle to the search history database, opened once at startup.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    collection: String,
    /// Serializes appends so timestamps follow id order across the pool.
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub async fn new(db_url: &str, collection: &str) -> Result<Self> {
        Self::with_pool_options(db_url, collection, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        collection: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory && db_url.starts_with("sqlite:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` would see its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            collection,
            "Database connected & migrations applied (pool: {}-{})", min_connections, max_connections
        );

        Ok(Self {
            conn,
            collection: collection.to_string(),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("Database connection closed");
        Ok(())
    }

    fn history_repo(&self) -> SearchHistoryRepository {
        SearchHistoryRepository::new(self.conn.clone(), self.collection.clone())
    }

    pub async fn add_search(&self, record: &NewSearchRecord) -> Result<SearchRecord> {
        let _guard = self.write_lock.lock().await;
        self.history_repo().add(record).await
    }

    pub async fn recent_searches(&self, limit: u64) -> Result<Vec<SearchRecord>> {
        self.history_repo().recent(limit).await
    }

    pub async fn count_searches(&self) -> Result<u64> {
        self.history_repo().count().await
    }
}
