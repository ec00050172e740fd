//! studyone - operator command line for a study-one knowledge base.
//!
//! Every command prints its result as pretty JSON on stdout.

mod cli;
mod logging;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use cli::{
    Cli, Commands, ContentCommand, FolderCommand, ItemCommand, LearnCommand, TagCommand, TagRef,
};
use studyone_core::{
    page_bounds, AppConfig, ContentInput, ContentResolver, CreateKnowledgeItemRequest,
    CreateLearningRecordRequest, Error, FolderRepository, KnowledgeRepository,
    ListKnowledgeRequest, TagRepository, UpdateKnowledgeItemRequest, WebpageFetcher,
};
use studyone_db::{Database, FilesystemBackend};
use studyone_fetch::HttpWebpageFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads .env first so RUST_LOG and LOG_* from it reach the subscriber.
    let config = AppConfig::load();
    let _log_guard = logging::init();

    let cli = Cli::parse();
    let config = config.context("Invalid configuration")?;

    let db = Database::from_app_config(&config)
        .await
        .context("Failed to connect to database")?;

    if cli.migrate || matches!(cli.command, Commands::Migrate) {
        db.migrate().await.context("Failed to run migrations")?;
    }

    run(cli.command, &db, &config).await
}

async fn run(command: Commands, db: &Database, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => print_json(&serde_json::json!({ "migrated": true })),
        Commands::Tree { root } => print_json(&db.folder_tree().tree(root).await?),
        Commands::Folder(cmd) => folder_command(cmd, db).await,
        Commands::Item(cmd) => item_command(cmd, db, config).await,
        Commands::Content(cmd) => content_command(cmd, db, config).await,
        Commands::Tag(cmd) => tag_command(cmd, db).await,
        Commands::Learn(cmd) => learn_command(cmd, db).await,
    }
}

async fn content_resolver(db: &Database, config: &AppConfig) -> anyhow::Result<ContentResolver> {
    let backend = FilesystemBackend::new(config.data_dir.clone());
    backend
        .validate()
        .await
        .with_context(|| {
            format!("Data directory {} is unusable", config.data_dir.display())
        })?;
    Ok(db.content_resolver(Arc::new(backend), Arc::new(fetcher(config)?)))
}

fn fetcher(config: &AppConfig) -> anyhow::Result<HttpWebpageFetcher> {
    HttpWebpageFetcher::from_app_config(config).context("Failed to build fetcher")
}

async fn folder_command(cmd: FolderCommand, db: &Database) -> anyhow::Result<()> {
    let tree = db.folder_tree();
    match cmd {
        FolderCommand::Create { name, parent } => {
            print_json(&tree.create_folder(&name, parent).await?)
        }
        FolderCommand::Move { id, parent } => print_json(&tree.move_folder(id, parent).await?),
        FolderCommand::Rename { id, name } => print_json(&tree.rename_folder(id, &name).await?),
        FolderCommand::Show { id } => {
            let folder = db.folders.get(id).await?.ok_or(Error::FolderNotFound(id))?;
            print_json(&folder)
        }
        FolderCommand::List {
            parent,
            top_level,
            page,
        } => {
            let folders = if top_level {
                db.folders.list_by_parent(None).await?
            } else if parent.is_some() {
                db.folders.list_by_parent(parent).await?
            } else {
                let (limit, offset) = page_bounds(page.limit, page.offset);
                db.folders.list(limit, offset).await?
            };
            print_json(&folders)
        }
        FolderCommand::Delete { id } => {
            tree.delete_folder(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

async fn item_command(cmd: ItemCommand, db: &Database, config: &AppConfig) -> anyhow::Result<()> {
    match cmd {
        ItemCommand::Create {
            title,
            kind,
            folder,
        } => {
            let item = db
                .items
                .create(CreateKnowledgeItemRequest {
                    title,
                    kind,
                    folder_id: folder,
                })
                .await?;
            info!(item_id = %item.id, kind = %item.kind, "Knowledge item created");
            print_json(&item)
        }
        ItemCommand::Show { id } => {
            print_json(&content_resolver(db, config).await?.get_detail(id).await?)
        }
        ItemCommand::List { folder, kind, page } => {
            let items = db
                .items
                .list(ListKnowledgeRequest {
                    folder_id: folder,
                    kind,
                    limit: page.limit,
                    offset: page.offset,
                })
                .await?;
            print_json(&items)
        }
        ItemCommand::Search { query, page } => {
            let (limit, offset) = page_bounds(page.limit, page.offset);
            print_json(&db.items.search(&query, limit, offset).await?)
        }
        ItemCommand::Update {
            id,
            title,
            folder,
            no_folder,
        } => {
            if let Some(folder_id) = folder {
                if db.folders.get(folder_id).await?.is_none() {
                    return Err(Error::FolderNotFound(folder_id).into());
                }
            }
            let folder_id = if no_folder { Some(None) } else { folder.map(Some) };
            let item = db
                .items
                .update(id, UpdateKnowledgeItemRequest { title, folder_id })
                .await?
                .ok_or(Error::ItemNotFound(id))?;
            info!(item_id = %item.id, "Knowledge item updated");
            print_json(&item)
        }
        ItemCommand::ByTags { tags, page } => {
            let (limit, offset) = page_bounds(page.limit, page.offset);
            print_json(&db.items.list_by_tags(&tags, limit, offset).await?)
        }
        ItemCommand::Delete { id } => {
            content_resolver(db, config).await?.delete_item(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

async fn content_command(
    cmd: ContentCommand,
    db: &Database,
    config: &AppConfig,
) -> anyhow::Result<()> {
    match cmd {
        ContentCommand::SetMarkdown { id, source } => {
            let body = read_source(&source)?;
            let resolver = content_resolver(db, config).await?;
            print_json(
                &resolver
                    .set_content(id, ContentInput::Markdown(body))
                    .await?,
            )
        }
        ContentCommand::Fetch { id, url } => {
            let resolver = content_resolver(db, config).await?;
            print_json(&resolver.fetch_and_set_webpage(id, &url).await?)
        }
        ContentCommand::Preview { url } => print_json(&fetcher(config)?.fetch(&url).await),
        ContentCommand::Delete { id } => {
            let removed = content_resolver(db, config).await?.delete_content(id).await?;
            print_json(&serde_json::json!({ "item_id": id, "removed": removed }))
        }
    }
}

async fn tag_command(cmd: TagCommand, db: &Database) -> anyhow::Result<()> {
    let tagger = db.tag_associator();
    match cmd {
        TagCommand::Create { name, color } => {
            print_json(&tagger.create_tag(&name, color.as_deref()).await?)
        }
        TagCommand::List { page } => {
            let (limit, offset) = page_bounds(page.limit, page.offset);
            print_json(&db.tags.list(limit, offset).await?)
        }
        TagCommand::Update {
            id,
            name,
            color,
            clear_color,
        } => {
            let color = if clear_color {
                Some(None)
            } else {
                color.as_deref().map(Some)
            };
            print_json(&tagger.update_tag(id, name.as_deref(), color).await?)
        }
        TagCommand::Delete { id } => {
            tagger.delete_tag(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        TagCommand::Add { item, tag } => match TagRef::parse(&tag) {
            TagRef::Id(tag_id) => print_json(&tagger.add_tag(item, tag_id).await?),
            TagRef::Name(name) => print_json(&tagger.add_tag_by_name(item, &name).await?),
        },
        TagCommand::Remove { item, tag } => {
            let tag_id = match TagRef::parse(&tag) {
                TagRef::Id(id) => Some(id),
                TagRef::Name(name) => db.tags.get_by_name(name.trim()).await?.map(|t| t.id),
            };
            match tag_id {
                Some(tag_id) => print_json(&tagger.remove_tag(item, tag_id).await?),
                // An unknown name cannot be attached, so removal is a no-op.
                None => print_json(&current_item(db, item).await?),
            }
        }
    }
}

async fn current_item(
    db: &Database,
    item_id: Uuid,
) -> anyhow::Result<studyone_core::KnowledgeItemWithTags> {
    db.items
        .get_with_tags(item_id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(item_id).into())
}

async fn learn_command(cmd: LearnCommand, db: &Database) -> anyhow::Result<()> {
    let log = db.learning_log();
    match cmd {
        LearnCommand::Record {
            item,
            question,
            answer,
            correct,
        } => {
            let record = log
                .record(CreateLearningRecordRequest {
                    knowledge_item_id: item,
                    question,
                    answer,
                    is_correct: correct,
                })
                .await?;
            print_json(&record)
        }
        LearnCommand::History { item, page } => {
            print_json(&log.history(item, page.limit, page.offset).await?)
        }
    }
}

fn read_source(source: &Path) -> anyhow::Result<String> {
    if source == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read markdown from stdin")?;
        Ok(body)
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
