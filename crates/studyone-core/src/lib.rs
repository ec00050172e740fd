//! # studyone-core
//!
//! Core types, traits, and services for the study-one knowledge base.
//!
//! This crate holds the data model and the three pieces of structural logic
//! that sit above raw storage:
//!
//! - [`tree`]: assembles flat folder rows into a nested tree
//! - [`content`]: resolves and writes an item's markdown or webpage content
//! - [`tagging`]: idempotent tag membership
//!
//! Storage, the markdown content backend and the webpage fetcher are reached
//! only through the traits in [`traits`]; concrete implementations live in
//! `studyone-db` and `studyone-fetch`.

pub mod config;
pub mod content;
pub mod defaults;
pub mod error;
pub mod learning;
pub mod logging;
pub mod models;
pub mod paging;
pub mod tagging;
pub mod tags;
pub mod traits;
pub mod tree;
pub mod uuid_utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types at crate root
pub use config::AppConfig;
pub use content::{markdown_storage_path, ContentResolver};
pub use error::{Error, Result};
pub use learning::LearningLog;
pub use models::*;
pub use paging::page_bounds;
pub use tagging::TagAssociator;
pub use tags::*;
pub use traits::*;
pub use tree::{
    build_tree, build_tree_with_limit, folder_level, subtree_height, would_create_cycle, FolderTree,
};
pub use uuid_utils::new_v7;
