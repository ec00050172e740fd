//! Folder tree assembly.
//!
//! Folders are stored as flat rows with a `parent_id` self-reference. The
//! tree is derived on demand: every row is bucketed by parent once, then
//! nodes are built top-down from the requested root. Siblings keep the
//! order in which they appear in the input.
//!
//! [`FolderTree`] refuses writes that would create a cycle or nest folders
//! deeper than its depth limit, so stored data always assembles completely.
//! The store itself enforces neither, so the assembler still guards itself:
//! a folder is never emitted twice, and descent stops at the depth limit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::defaults::MAX_FOLDER_DEPTH;
use crate::error::{Error, Result};
use crate::models::{Folder, FolderNode};
use crate::traits::{CreateFolderRequest, FolderRepository, UpdateFolderRequest};

/// Build the tree of folders below `root_id` (None = every top-level folder).
///
/// `folders` must be the complete folder set; the root folder itself is not
/// part of the result, only its descendants.
pub fn build_tree(folders: &[Folder], root_id: Option<Uuid>) -> Vec<FolderNode> {
    build_tree_with_limit(folders, root_id, MAX_FOLDER_DEPTH)
}

/// Build a folder tree, descending at most `max_depth` levels.
pub fn build_tree_with_limit(
    folders: &[Folder],
    root_id: Option<Uuid>,
    max_depth: usize,
) -> Vec<FolderNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<&Folder>> = HashMap::new();
    for folder in folders {
        by_parent.entry(folder.parent_id).or_default().push(folder);
    }

    let mut placed = HashSet::new();
    if let Some(root) = root_id {
        placed.insert(root);
    }

    build_level(&by_parent, root_id, 0, max_depth, &mut placed)
}

fn build_level(
    by_parent: &HashMap<Option<Uuid>, Vec<&Folder>>,
    parent_id: Option<Uuid>,
    depth: usize,
    max_depth: usize,
    placed: &mut HashSet<Uuid>,
) -> Vec<FolderNode> {
    let Some(children) = by_parent.get(&parent_id) else {
        return Vec::new();
    };

    if depth >= max_depth {
        warn!(
            subsystem = "core",
            component = "tree",
            op = "build_tree",
            folder_id = ?parent_id,
            max_depth,
            "Folder tree depth limit reached; deeper folders omitted"
        );
        return Vec::new();
    }

    let mut nodes = Vec::with_capacity(children.len());
    for folder in children {
        if !placed.insert(folder.id) {
            warn!(
                subsystem = "core",
                component = "tree",
                op = "build_tree",
                folder_id = %folder.id,
                "Folder already placed; parent links form a cycle"
            );
            continue;
        }
        let grandchildren = build_level(by_parent, Some(folder.id), depth + 1, max_depth, placed);
        nodes.push(FolderNode {
            folder: (*folder).clone(),
            children: grandchildren,
        });
    }
    nodes
}

/// True if making `new_parent` the parent of `folder_id` would put the
/// folder among its own ancestors.
pub fn would_create_cycle(folders: &[Folder], folder_id: Uuid, new_parent: Option<Uuid>) -> bool {
    let parents: HashMap<Uuid, Option<Uuid>> =
        folders.iter().map(|f| (f.id, f.parent_id)).collect();

    let mut cursor = new_parent;
    // Bounded walk: an existing cycle elsewhere must not loop forever.
    for _ in 0..=parents.len() {
        match cursor {
            None => return false,
            Some(id) if id == folder_id => return true,
            Some(id) => cursor = parents.get(&id).copied().flatten(),
        }
    }
    true
}

/// Number of ancestors above `folder_id` (0 for a top-level folder).
///
/// A folder caught in a corrupted parent cycle has no finite level and
/// yields `usize::MAX`.
pub fn folder_level(folders: &[Folder], folder_id: Uuid) -> usize {
    let parents: HashMap<Uuid, Option<Uuid>> =
        folders.iter().map(|f| (f.id, f.parent_id)).collect();

    let mut level = 0;
    let mut cursor = parents.get(&folder_id).copied().flatten();
    while let Some(id) = cursor {
        level += 1;
        if level > parents.len() {
            return usize::MAX;
        }
        cursor = parents.get(&id).copied().flatten();
    }
    level
}

/// Levels occupied by `folder_id` and its descendants (1 for a leaf).
pub fn subtree_height(folders: &[Folder], folder_id: Uuid) -> usize {
    let mut by_parent: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for folder in folders {
        if let Some(parent) = folder.parent_id {
            by_parent.entry(parent).or_default().push(folder.id);
        }
    }

    let mut seen = HashSet::from([folder_id]);
    let mut frontier = vec![folder_id];
    let mut height = 0;
    while !frontier.is_empty() {
        height += 1;
        frontier = frontier
            .iter()
            .filter_map(|id| by_parent.get(id))
            .flatten()
            .copied()
            .filter(|child| seen.insert(*child))
            .collect();
    }
    height
}

/// Folder hierarchy operations over a [`FolderRepository`].
#[derive(Clone)]
pub struct FolderTree {
    folders: Arc<dyn FolderRepository>,
    max_depth: usize,
}

impl FolderTree {
    /// Create a FolderTree with the default depth limit.
    pub fn new(folders: Arc<dyn FolderRepository>) -> Self {
        Self {
            folders,
            max_depth: MAX_FOLDER_DEPTH,
        }
    }

    /// Override the depth at which assembly stops descending.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Assemble the tree below `root_id`, or the whole forest when None.
    ///
    /// # Errors
    ///
    /// Returns `Error::FolderNotFound` if `root_id` does not exist.
    pub async fn tree(&self, root_id: Option<Uuid>) -> Result<Vec<FolderNode>> {
        let start = Instant::now();
        let all = self.folders.list_all().await?;

        if let Some(root) = root_id {
            if !all.iter().any(|f| f.id == root) {
                return Err(Error::FolderNotFound(root));
            }
        }

        let tree = build_tree_with_limit(&all, root_id, self.max_depth);
        debug!(
            subsystem = "core",
            component = "tree",
            op = "tree",
            folder_id = ?root_id,
            result_count = all.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Folder tree assembled"
        );
        Ok(tree)
    }

    /// `deepest_level` is 0-based; the assembler emits levels below `max_depth`.
    fn check_depth(&self, deepest_level: usize) -> Result<()> {
        if deepest_level < self.max_depth {
            return Ok(());
        }
        Err(Error::InvalidInput(format!(
            "Folder nesting would exceed the maximum depth of {}",
            self.max_depth
        )))
    }

    /// Create a folder after checking that its parent exists.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` for an empty name, or if the new folder would sit
    ///   at or below the depth limit
    /// - `Error::FolderNotFound` if `parent_id` does not exist
    pub async fn create_folder(&self, name: &str, parent_id: Option<Uuid>) -> Result<Folder> {
        let name = validate_folder_name(name)?;
        let level = match parent_id {
            None => 0,
            Some(parent) => {
                let all = self.folders.list_all().await?;
                if !all.iter().any(|f| f.id == parent) {
                    return Err(Error::FolderNotFound(parent));
                }
                folder_level(&all, parent).saturating_add(1)
            }
        };
        self.check_depth(level)?;

        self.folders
            .create(CreateFolderRequest {
                name: name.to_string(),
                parent_id,
            })
            .await
    }

    /// Re-parent a folder, refusing moves that would create a cycle or push
    /// its subtree past the depth limit.
    ///
    /// # Errors
    ///
    /// - `Error::FolderNotFound` if either folder does not exist
    /// - `Error::InvalidInput` if `new_parent` is the folder or one of its
    ///   descendants, or the moved subtree would be nested too deep
    pub async fn move_folder(&self, folder_id: Uuid, new_parent: Option<Uuid>) -> Result<Folder> {
        let all = self.folders.list_all().await?;

        if !all.iter().any(|f| f.id == folder_id) {
            return Err(Error::FolderNotFound(folder_id));
        }
        if let Some(parent) = new_parent {
            if !all.iter().any(|f| f.id == parent) {
                return Err(Error::FolderNotFound(parent));
            }
        }
        if would_create_cycle(&all, folder_id, new_parent) {
            return Err(Error::InvalidInput(format!(
                "Cannot move folder {} beneath itself",
                folder_id
            )));
        }
        let level = new_parent.map_or(0, |parent| folder_level(&all, parent).saturating_add(1));
        self.check_depth(level.saturating_add(subtree_height(&all, folder_id) - 1))?;

        self.folders
            .update(
                folder_id,
                UpdateFolderRequest {
                    name: None,
                    parent_id: Some(new_parent),
                },
            )
            .await?
            .ok_or(Error::FolderNotFound(folder_id))
    }

    /// Rename a folder in place.
    pub async fn rename_folder(&self, folder_id: Uuid, name: &str) -> Result<Folder> {
        let name = validate_folder_name(name)?;
        self.folders
            .update(
                folder_id,
                UpdateFolderRequest {
                    name: Some(name.to_string()),
                    parent_id: None,
                },
            )
            .await?
            .ok_or(Error::FolderNotFound(folder_id))
    }

    /// Delete a folder subtree. Items inside are detached, never deleted.
    pub async fn delete_folder(&self, folder_id: Uuid) -> Result<()> {
        if self.folders.delete(folder_id).await? {
            Ok(())
        } else {
            Err(Error::FolderNotFound(folder_id))
        }
    }
}

fn validate_folder_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Folder name cannot be empty".to_string()));
    }
    Ok(name)
}
