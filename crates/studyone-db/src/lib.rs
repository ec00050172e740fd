//! # studyone-db
//!
//! PostgreSQL database layer for study-one.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for folders, knowledge items, content
//!   variants, tags and learning records
//! - The filesystem content backend for markdown bodies
//! - Schema migrations (`migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studyone_db::{Database, FilesystemBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/studyone").await?;
//!     db.migrate().await?;
//!
//!     let tree = db.folder_tree().tree(None).await?;
//!     println!("{} top-level folders", tree.len());
//!     Ok(())
//! }
//! ```
pub mod file_storage;
pub mod folders;
pub mod knowledge;
pub mod learning;
pub mod markdown;
pub mod pool;
pub mod tags;
pub mod webpage;

#[cfg(test)]
mod tests;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use studyone_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use file_storage::FilesystemBackend;
pub use folders::PgFolderRepository;
pub use knowledge::PgKnowledgeRepository;
pub use learning::PgLearningRecordRepository;
pub use markdown::PgMarkdownContentRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use tags::PgTagRepository;
pub use webpage::PgWebpageContentRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Folder hierarchy rows.
    pub folders: Arc<PgFolderRepository>,
    /// Knowledge item rows.
    pub items: Arc<PgKnowledgeRepository>,
    /// Tags and item memberships.
    pub tags: Arc<PgTagRepository>,
    /// Markdown pointer rows.
    pub markdown: Arc<PgMarkdownContentRepository>,
    /// Inline webpage content rows.
    pub webpages: Arc<PgWebpageContentRepository>,
    /// Learning history.
    pub learning: Arc<PgLearningRecordRepository>,
    max_folder_depth: usize,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            folders: Arc::new(PgFolderRepository::new(pool.clone())),
            items: Arc::new(PgKnowledgeRepository::new(pool.clone())),
            tags: Arc::new(PgTagRepository::new(pool.clone())),
            markdown: Arc::new(PgMarkdownContentRepository::new(pool.clone())),
            webpages: Arc::new(PgWebpageContentRepository::new(pool.clone())),
            learning: Arc::new(PgLearningRecordRepository::new(pool.clone())),
            max_folder_depth: defaults::MAX_FOLDER_DEPTH,
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect using application configuration (URL, pool size, tree depth).
    pub async fn from_app_config(config: &AppConfig) -> Result<Self> {
        let db = Self::connect_with_config(
            &config.database_url,
            PoolConfig::from_app_config(config),
        )
        .await?;
        Ok(db.with_max_folder_depth(config.max_folder_depth))
    }

    /// Override the folder tree depth cut-off.
    pub fn with_max_folder_depth(mut self, max_depth: usize) -> Self {
        self.max_folder_depth = max_depth;
        self
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        tracing::info!(
            subsystem = "database",
            component = "migrations",
            op = "run",
            "Migrations applied"
        );
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Folder hierarchy service over this database.
    pub fn folder_tree(&self) -> FolderTree {
        FolderTree::new(self.folders.clone()).with_max_depth(self.max_folder_depth)
    }

    /// Content resolver using the given content backend and fetcher.
    pub fn content_resolver(
        &self,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn WebpageFetcher>,
    ) -> ContentResolver {
        ContentResolver::new(
            self.items.clone(),
            self.markdown.clone(),
            self.webpages.clone(),
            backend,
            fetcher,
        )
    }

    /// Tag membership service over this database.
    pub fn tag_associator(&self) -> TagAssociator {
        TagAssociator::new(self.items.clone(), self.tags.clone())
    }

    /// Learning history service over this database.
    pub fn learning_log(&self) -> LearningLog {
        LearningLog::new(self.items.clone(), self.learning.clone())
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
