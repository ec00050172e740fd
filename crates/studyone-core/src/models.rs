//! Core data models for study-one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// FOLDER TYPES
// =============================================================================

/// A folder in the knowledge hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    /// Parent folder ID (None = top level)
    pub parent_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// A folder together with its nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: Folder,
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Number of folders in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(FolderNode::subtree_size)
            .sum::<usize>()
    }

    /// Folder IDs in this subtree, depth-first.
    pub fn ids(&self) -> Vec<Uuid> {
        let mut out = vec![self.folder.id];
        for child in &self.children {
            out.extend(child.ids());
        }
        out
    }
}

// =============================================================================
// KNOWLEDGE ITEM TYPES
// =============================================================================

/// Declared content type of a knowledge item. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeType {
    /// Note body held as a markdown file in the content backend
    Markdown,
    /// Saved webpage with fetched metadata held inline
    Webpage,
}

impl KnowledgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Webpage => "webpage",
        }
    }
}

impl std::fmt::Display for KnowledgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KnowledgeType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" => Ok(Self::Markdown),
            "webpage" => Ok(Self::Webpage),
            _ => Err(format!("Invalid knowledge type: {}", s)),
        }
    }
}

/// A knowledge item: a note or a saved page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: KnowledgeType,
    pub folder_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// A knowledge item with its current tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItemWithTags {
    #[serde(flatten)]
    pub item: KnowledgeItem,
    pub tags: Vec<Tag>,
}

impl KnowledgeItemWithTags {
    /// Tag IDs currently attached, sorted for order-independent comparison.
    pub fn tag_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.tags.iter().map(|t| t.id).collect();
        ids.sort();
        ids
    }
}

/// Full view of an item: metadata, tags and resolved content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItemDetail {
    #[serde(flatten)]
    pub item: KnowledgeItem,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ItemContent>,
}

// =============================================================================
// CONTENT VARIANTS
// =============================================================================

/// Pointer row for a markdown item's body in the content backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
    pub id: Uuid,
    pub knowledge_item_id: Uuid,
    /// Backend path, relative to the data directory
    pub storage_path: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Markdown pointer row with the body read from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContentWithData {
    #[serde(flatten)]
    pub record: MarkdownContent,
    /// None when the backing bytes are missing.
    pub content: Option<String>,
}

/// Metadata extracted from a fetched webpage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebpageData {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub keywords: Option<String>,
}

impl WebpageData {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Stored webpage content for a webpage item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebpageContent {
    pub id: Uuid,
    pub knowledge_item_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub keywords: Option<String>,
    pub fetched_at_utc: Option<DateTime<Utc>>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl WebpageContent {
    /// The inline fields as written by the caller.
    pub fn data(&self) -> WebpageData {
        WebpageData {
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            summary: self.summary.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

/// Resolved content of a knowledge item, keyed by its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemContent {
    Markdown(MarkdownContentWithData),
    Webpage(WebpageContent),
}

impl ItemContent {
    pub fn kind(&self) -> KnowledgeType {
        match self {
            Self::Markdown(_) => KnowledgeType::Markdown,
            Self::Webpage(_) => KnowledgeType::Webpage,
        }
    }
}

/// Content supplied by a caller for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentInput {
    /// Raw markdown text
    Markdown(String),
    /// Webpage fields, already extracted
    Webpage(WebpageData),
}

impl ContentInput {
    pub fn kind(&self) -> KnowledgeType {
        match self {
            Self::Markdown(_) => KnowledgeType::Markdown,
            Self::Webpage(_) => KnowledgeType::Webpage,
        }
    }
}

/// Result of a webpage fetch. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchOutcome {
    Fetched(WebpageData),
    Failed { url: String, error: String },
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag definition. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// LEARNING TYPES
// =============================================================================

/// Outcome of one question asked against a knowledge item. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningRecord {
    pub id: Uuid,
    pub knowledge_item_id: Uuid,
    pub question: String,
    pub answer: Option<String>,
    pub is_correct: Option<bool>,
    pub created_at_utc: DateTime<Utc>,
}
