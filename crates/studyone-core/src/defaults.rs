//! Centralized default constants for study-one.
//!
//! Configuration values fall back to these when the corresponding
//! environment variable is unset.

// =============================================================================
// STORAGE
// =============================================================================

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/studyone";

/// Default root directory of the markdown content backend.
pub const DATA_DIR: &str = "./data";

/// Directory, relative to the data root, holding markdown bodies.
pub const MARKDOWN_DIR: &str = "knowledge/markdown";

/// Default maximum number of pooled database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a pooled connection before giving up.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// WEBPAGE FETCHING
// =============================================================================

/// Webpage fetch timeout in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// User-Agent sent with webpage fetches. Some sites refuse non-browser agents.
pub const FETCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Maximum characters kept in an extracted page summary.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Number of leading paragraphs joined into a page summary.
pub const SUMMARY_PARAGRAPHS: usize = 3;

// =============================================================================
// FOLDERS
// =============================================================================

/// Maximum folder nesting. Top-level folders sit at level 0; folder writes
/// reaching this level are refused and tree assembly stops descending here.
pub const MAX_FOLDER_DEPTH: usize = 64;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LEN: usize = 100;

/// Maximum tag color length in characters.
pub const TAG_COLOR_MAX_LEN: usize = 20;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list operations.
pub const PAGE_LIMIT: i64 = 20;

/// Largest page size accepted by list operations.
pub const PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;
