//! Command line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use studyone_core::KnowledgeType;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "studyone")]
#[command(author, version, about = "Operate a study-one knowledge base")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Run pending migrations before the command
    #[arg(long, global = true)]
    pub migrate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations and exit
    Migrate,

    /// Print the folder tree
    Tree {
        /// Only print the subtree below this folder
        #[arg(long)]
        root: Option<Uuid>,
    },

    /// Folder management
    #[command(subcommand)]
    Folder(FolderCommand),

    /// Knowledge item management
    #[command(subcommand)]
    Item(ItemCommand),

    /// Item content
    #[command(subcommand)]
    Content(ContentCommand),

    /// Tags and tag membership
    #[command(subcommand)]
    Tag(TagCommand),

    /// Learning history
    #[command(subcommand)]
    Learn(LearnCommand),
}

#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Create a folder
    Create {
        name: String,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// Move a folder under a new parent (omit --parent for top level)
    Move {
        id: Uuid,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// Rename a folder
    Rename { id: Uuid, name: String },
    /// Show a single folder
    Show { id: Uuid },
    /// List folders, optionally only the children of one parent
    List {
        #[arg(long, conflicts_with = "top_level")]
        parent: Option<Uuid>,
        /// Only folders without a parent
        #[arg(long)]
        top_level: bool,
        #[command(flatten)]
        page: Page,
    },
    /// Delete a folder and its subfolders
    Delete { id: Uuid },
}

#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// Create a knowledge item
    Create {
        title: String,
        #[arg(long = "type", value_name = "TYPE")]
        kind: KnowledgeType,
        #[arg(long)]
        folder: Option<Uuid>,
    },
    /// Show an item with its tags and content
    Show { id: Uuid },
    /// List items
    List {
        #[arg(long)]
        folder: Option<Uuid>,
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<KnowledgeType>,
        #[command(flatten)]
        page: Page,
    },
    /// Search titles and tag names
    Search {
        query: String,
        #[command(flatten)]
        page: Page,
    },
    /// Change an item's title or folder (the type never changes)
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "no_folder")]
        folder: Option<Uuid>,
        /// Detach the item from its folder
        #[arg(long)]
        no_folder: bool,
    },
    /// List items carrying every one of the given tags
    ByTags {
        #[arg(required = true)]
        tags: Vec<Uuid>,
        #[command(flatten)]
        page: Page,
    },
    /// Delete an item together with its content
    Delete { id: Uuid },
}

#[derive(Debug, Subcommand)]
pub enum ContentCommand {
    /// Write the markdown body of an item from a file ("-" reads stdin)
    SetMarkdown { id: Uuid, source: PathBuf },
    /// Fetch a URL and store its metadata on a webpage item
    Fetch { id: Uuid, url: String },
    /// Fetch a URL and print its metadata without storing anything
    Preview { url: String },
    /// Remove an item's content, keeping the item
    Delete { id: Uuid },
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// Create a tag (an existing tag with the same name is reused)
    Create {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// List tags
    List {
        #[command(flatten)]
        page: Page,
    },
    /// Rename a tag or change its color
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_color")]
        color: Option<String>,
        /// Remove the tag's color
        #[arg(long)]
        clear_color: bool,
    },
    /// Delete a tag, detaching it from every item
    Delete { id: Uuid },
    /// Attach a tag, given by id or name, to an item
    Add { item: Uuid, tag: String },
    /// Detach a tag, given by id or name, from an item
    Remove { item: Uuid, tag: String },
}

#[derive(Debug, Subcommand)]
pub enum LearnCommand {
    /// Record a question asked about an item
    Record {
        item: Uuid,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long)]
        correct: Option<bool>,
    },
    /// Show the learning history of an item
    History {
        item: Uuid,
        #[command(flatten)]
        page: Page,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct Page {
    #[arg(long)]
    pub limit: Option<i64>,
    #[arg(long)]
    pub offset: Option<i64>,
}

/// A tag given on the command line, either by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef {
    Id(Uuid),
    Name(String),
}

impl TagRef {
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_create() {
        let cli = Cli::try_parse_from(["studyone", "item", "create", "Notes", "--type", "markdown"])
            .unwrap();
        match cli.command {
            Commands::Item(ItemCommand::Create {
                title,
                kind,
                folder,
            }) => {
                assert_eq!(title, "Notes");
                assert_eq!(kind, KnowledgeType::Markdown);
                assert!(folder.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = Cli::try_parse_from(["studyone", "item", "create", "x", "--type", "pdf"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_global_migrate_flag() {
        let cli = Cli::try_parse_from(["studyone", "tree", "--migrate"]).unwrap();
        assert!(cli.migrate);
        assert!(matches!(cli.command, Commands::Tree { root: None }));
    }

    #[test]
    fn test_list_paging() {
        let cli =
            Cli::try_parse_from(["studyone", "tag", "list", "--limit", "5", "--offset", "10"])
                .unwrap();
        let Commands::Tag(TagCommand::List { page }) = cli.command else {
            panic!("expected tag list");
        };
        assert_eq!(page.limit, Some(5));
        assert_eq!(page.offset, Some(10));
    }

    #[test]
    fn test_tag_ref() {
        let id = Uuid::new_v4();
        assert_eq!(TagRef::parse(&id.to_string()), TagRef::Id(id));
        assert_eq!(TagRef::parse("rust"), TagRef::Name("rust".into()));
    }

    #[test]
    fn test_parse_folder_rename() {
        let id = Uuid::new_v4();
        let cli =
            Cli::try_parse_from(["studyone", "folder", "rename", &id.to_string(), "Rust"])
                .unwrap();
        match cli.command {
            Commands::Folder(FolderCommand::Rename { id: got, name }) => {
                assert_eq!(got, id);
                assert_eq!(name, "Rust");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_folder_list() {
        let cli = Cli::try_parse_from(["studyone", "folder", "list", "--top-level"]).unwrap();
        let Commands::Folder(FolderCommand::List {
            parent, top_level, ..
        }) = cli.command
        else {
            panic!("expected folder list");
        };
        assert!(parent.is_none());
        assert!(top_level);

        let parent_id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "studyone",
            "folder",
            "list",
            "--parent",
            &parent_id.to_string(),
            "--limit",
            "20",
        ])
        .unwrap();
        let Commands::Folder(FolderCommand::List {
            parent,
            top_level,
            page,
        }) = cli.command
        else {
            panic!("expected folder list");
        };
        assert_eq!(parent, Some(parent_id));
        assert!(!top_level);
        assert_eq!(page.limit, Some(20));

        let both = Cli::try_parse_from([
            "studyone",
            "folder",
            "list",
            "--parent",
            &parent_id.to_string(),
            "--top-level",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_item_update() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "studyone",
            "item",
            "update",
            &id.to_string(),
            "--title",
            "Lifetimes",
            "--no-folder",
        ])
        .unwrap();
        match cli.command {
            Commands::Item(ItemCommand::Update {
                id: got,
                title,
                folder,
                no_folder,
            }) => {
                assert_eq!(got, id);
                assert_eq!(title.as_deref(), Some("Lifetimes"));
                assert!(folder.is_none());
                assert!(no_folder);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let folder = Uuid::new_v4().to_string();
        let both = Cli::try_parse_from([
            "studyone",
            "item",
            "update",
            &id.to_string(),
            "--folder",
            &folder,
            "--no-folder",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_item_by_tags() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "studyone",
            "item",
            "by-tags",
            &a.to_string(),
            &b.to_string(),
            "--offset",
            "5",
        ])
        .unwrap();
        let Commands::Item(ItemCommand::ByTags { tags, page }) = cli.command else {
            panic!("expected item by-tags");
        };
        assert_eq!(tags, vec![a, b]);
        assert_eq!(page.offset, Some(5));

        assert!(Cli::try_parse_from(["studyone", "item", "by-tags"]).is_err());
        assert!(Cli::try_parse_from(["studyone", "item", "by-tags", "rust"]).is_err());
    }

    #[test]
    fn test_parse_tag_update() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "studyone",
            "tag",
            "update",
            &id.to_string(),
            "--name",
            "systems",
            "--clear-color",
        ])
        .unwrap();
        match cli.command {
            Commands::Tag(TagCommand::Update {
                id: got,
                name,
                color,
                clear_color,
            }) => {
                assert_eq!(got, id);
                assert_eq!(name.as_deref(), Some("systems"));
                assert!(color.is_none());
                assert!(clear_color);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let both = Cli::try_parse_from([
            "studyone",
            "tag",
            "update",
            &id.to_string(),
            "--color",
            "red",
            "--clear-color",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_tag_delete() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["studyone", "tag", "delete", &id.to_string()]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tag(TagCommand::Delete { id: got }) if got == id
        ));
    }

    #[test]
    fn test_parse_content_preview() {
        let cli = Cli::try_parse_from([
            "studyone",
            "content",
            "preview",
            "https://www.rust-lang.org",
        ])
        .unwrap();
        match cli.command {
            Commands::Content(ContentCommand::Preview { url }) => {
                assert_eq!(url, "https://www.rust-lang.org");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
