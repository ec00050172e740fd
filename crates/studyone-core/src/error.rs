//! Error types for study-one.

use thiserror::Error;
use uuid::Uuid;

use crate::models::KnowledgeType;

/// Result type alias using study-one's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for study-one operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Folder not found
    #[error("Folder not found: {0}")]
    FolderNotFound(Uuid),

    /// Knowledge item not found
    #[error("Knowledge item not found: {0}")]
    ItemNotFound(Uuid),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(Uuid),

    /// Learning record not found
    #[error("Learning record not found: {0}")]
    LearningRecordNotFound(Uuid),

    /// Content operation does not match the item's declared type
    #[error("Type mismatch for item {item_id}: item is {expected}, content is {actual}")]
    TypeMismatch {
        item_id: Uuid,
        expected: KnowledgeType,
        actual: KnowledgeType,
    },

    /// Webpage fetch did not produce content; nothing was written
    #[error("Fetch failed for {url}: {message}")]
    FetchFailure { url: String, message: String },

    /// Content backend and pointer rows disagree
    #[error("Storage inconsistency: {0}")]
    StorageInconsistency(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for every "referenced id does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::FolderNotFound(_)
                | Error::ItemNotFound(_)
                | Error::TagNotFound(_)
                | Error::LearningRecordNotFound(_)
        )
    }

    /// True when an I/O error reports a missing file.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_item_not_found() {
        let id = Uuid::nil();
        let err = Error::ItemNotFound(id);
        assert_eq!(err.to_string(), format!("Knowledge item not found: {}", id));
    }

    #[test]
    fn test_error_display_type_mismatch() {
        let err = Error::TypeMismatch {
            item_id: Uuid::nil(),
            expected: KnowledgeType::Webpage,
            actual: KnowledgeType::Markdown,
        };
        assert_eq!(
            err.to_string(),
            format!(
                "Type mismatch for item {}: item is webpage, content is markdown",
                Uuid::nil()
            )
        );
    }

    #[test]
    fn test_error_display_fetch_failure() {
        let err = Error::FetchFailure {
            url: "https://example.com".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Fetch failed for https://example.com: timeout");
    }

    #[test]
    fn test_is_not_found_groups_entity_variants() {
        assert!(Error::FolderNotFound(Uuid::nil()).is_not_found());
        assert!(Error::ItemNotFound(Uuid::nil()).is_not_found());
        assert!(Error::TagNotFound(Uuid::nil()).is_not_found());
        assert!(Error::LearningRecordNotFound(Uuid::nil()).is_not_found());
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::InvalidInput("x".into()).is_not_found());
        assert!(!Error::StorageInconsistency("x".into()).is_not_found());
    }

    #[test]
    fn test_is_missing_file() {
        let missing = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(missing.is_missing_file());

        let denied = Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(!denied.is_missing_file());
        assert!(!Error::Internal("x".into()).is_missing_file());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
