//! Structured logging schema and field name constants for study-one.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query them consistently across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Tolerated inconsistency or failed fetch, nothing written |
//! | INFO  | Lifecycle events (startup, migrations), operation completions |
//! | DEBUG | Decision points (create vs. update a content row) |
//! | TRACE | Per-item iteration (tree nodes, extracted paragraphs) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "database", "fetch", "admin"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "tree", "content", "tagging", "pool", "file_storage"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "build_tree", "set_content", "add_tag", "fetch"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Knowledge item UUID being operated on.
pub const ITEM_ID: &str = "item_id";

/// Folder UUID being operated on.
pub const FOLDER_ID: &str = "folder_id";

/// Tag UUID being operated on.
pub const TAG_ID: &str = "tag_id";

/// Declared knowledge item type.
pub const ITEM_TYPE: &str = "item_type";

/// Content backend path of a markdown body.
pub const STORAGE_PATH: &str = "storage_path";

/// URL of a fetched webpage.
pub const URL: &str = "url";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows or nodes returned.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of content written or read.
pub const BYTES: &str = "bytes";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_snake_case() {
        for name in [
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            ITEM_ID,
            FOLDER_ID,
            TAG_ID,
            ITEM_TYPE,
            STORAGE_PATH,
            URL,
            DURATION_MS,
            RESULT_COUNT,
            BYTES,
            POOL_SIZE,
            POOL_IDLE,
            SUCCESS,
            ERROR_MSG,
        ] {
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
