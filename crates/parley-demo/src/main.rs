//! Parley Demo - Real-time Room Directory and Message Log
//!
//! Runs the sync engine against an in-memory store and prints what each
//! observer sees.
//!
//! ## Usage
//!
//! ```bash
//! # Two clients race to create the same room
//! parley-demo race general
//!
//! # Two users chat; the log is shown newest first
//! parley-demo chat
//! parley-demo --scope general chat
//!
//! # Create several rooms and print the directory
//! parley-demo rooms general random "  general  " ""
//!
//! # Log the whole session to ./logs/parley-<session>.log
//! parley-demo --log-dir logs chat
//! ```

mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use parley_logging::{LogConfig, ParleySubscriberBuilder, ViewerContextGuard};
use parley_store::{CollectionStore, InMemoryCollectionStore};
use parley_sync::{ChatClient, MessageScope, PostOutcome, Subscription, ViewerContext};
use tracing::{Instrument, debug};
use uuid::Uuid;

use display::*;

/// How long to wait for a snapshot to reflect a write
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Parley Demo - Real-time Room Sync
#[derive(Parser)]
#[command(name = "parley-demo")]
#[command(about = "Real-time room directory and message log demo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overridden by RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Human-readable log output instead of JSONL
    #[arg(long)]
    pretty: bool,

    /// Write this session's log to a file in DIR instead of the console
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Post and read messages in this room instead of the global log
    #[arg(short, long)]
    scope: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Two clients race to create the same room
    Race {
        /// Room name
        room: String,
    },
    /// Two users exchange messages
    Chat,
    /// Create rooms and print the directory
    Rooms {
        /// Room names
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = Uuid::new_v4();
    let config = match &cli.log_dir {
        Some(dir) => LogConfig::session(dir, session),
        None => LogConfig::interactive(cli.pretty),
    };
    let mut logging = ParleySubscriberBuilder::new().with_config(config);
    if let Some(level) = &cli.log_level {
        logging = logging.with_level(level);
    }
    let _log_guard = logging.init();

    let store: Arc<dyn CollectionStore> = Arc::new(InMemoryCollectionStore::new());
    let scope = match cli.scope.as_deref() {
        Some(room) => MessageScope::room(room),
        None => MessageScope::Global,
    };

    print_banner();
    match cli.command {
        Commands::Race { room } => cmd_race(store, &room).await,
        Commands::Chat => cmd_chat(store, scope, session).await,
        Commands::Rooms { names } => cmd_rooms(store, &names).await,
    }
}

/// Wait until a subscription's snapshot satisfies `predicate`
async fn settle<T, P>(subscription: &mut Subscription<T>, predicate: P) -> Result<Arc<T>>
where
    P: FnMut(&T) -> bool,
{
    tokio::time::timeout(SETTLE_TIMEOUT, subscription.wait_until(predicate))
        .await
        .context("Timed out waiting for the store")?
        .context("Subscription ended")
}

async fn cmd_race(store: Arc<dyn CollectionStore>, room: &str) -> Result<()> {
    print_header(&format!("Racing to create '{}'", room.trim()));

    let first = ChatClient::new(Arc::clone(&store));
    let second = ChatClient::new(Arc::clone(&store));
    let mut directory = first.observe_room_directory();

    let (a, b) = tokio::join!(first.create_room(room), second.create_room(room));
    for (client, result) in [("client A", a), ("client B", b)] {
        match result {
            Ok(()) => print_success(&format!("{client}: room created")),
            Err(e) => print_error(&format!("{client}: {e}")),
        }
    }

    let name = room.trim().to_string();
    if name.is_empty() {
        return Ok(());
    }
    let snapshot = settle(&mut directory, |d| d.contains(&name)).await?;
    print_info(&format!(
        "Directory lists '{}' {} time(s)",
        name,
        snapshot.iter().filter(|r| *r == name).count()
    ));
    print_directory(&snapshot);
    Ok(())
}

async fn cmd_chat(
    store: Arc<dyn CollectionStore>,
    scope: MessageScope,
    session: Uuid,
) -> Result<()> {
    let client = ChatClient::builder(store).message_scope(scope.clone()).build();
    if let MessageScope::Room(room) = &scope {
        match client.create_room(room).await {
            Ok(()) => print_success(&format!("Created room '{}'", room.trim())),
            Err(e) => print_error(&e.to_string()),
        }
    }

    let ada = ViewerContext::signed_in("ada");
    let bo = ViewerContext::signed_in("bo");
    client.register_profile(&ada, "Ada").await?;
    client.register_profile(&bo, "Bo").await?;

    let mut ada_view = client.observe_messages(ada.clone());
    let composer = client.composer();

    let conversation = [
        (&ada, "Hey Bo, is the new room directory live?"),
        (&bo, "Yes, every change arrives as a full snapshot."),
        (&ada, "And my messages show up highlighted for me."),
        (&bo, "Newest first, straight from the log."),
    ];
    for (viewer, text) in conversation {
        let context =
            ViewerContextGuard::with_session_id(viewer.user_id().unwrap_or_default(), session);
        async {
            if viewer == &ada {
                composer.set_draft(text);
                composer.submit(viewer).await?;
            } else {
                client.post_message(text, viewer).await?;
            }
            debug!(text, "Posted demo message");
            anyhow::Ok(())
        }
        .instrument(context.span())
        .await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    if client.post_message("", &bo).await? == PostOutcome::Ignored {
        print_info("Empty message ignored");
    }
    if let Err(e) = client.post_message("hello?", &ViewerContext::anonymous()).await {
        print_error(&format!("Anonymous post rejected: {e}"));
    }

    let snapshot = settle(&mut ada_view, |s| s.len() >= conversation.len()).await?;
    let title = match &scope {
        MessageScope::Global => "All messages (as Ada)".to_string(),
        MessageScope::Room(room) => format!("#{} (as Ada)", room.trim()),
    };
    print_header(&title);
    for message in &snapshot.messages {
        print_message(message);
    }
    println!();
    print_success(&format!("{} messages synchronized", snapshot.len()));
    Ok(())
}

async fn cmd_rooms(store: Arc<dyn CollectionStore>, names: &[String]) -> Result<()> {
    print_header("Creating rooms");

    let client = ChatClient::new(store);
    let mut directory = client.observe_room_directory();
    let mut created = Vec::new();
    for name in names {
        match client.create_room(name).await {
            Ok(()) => {
                print_success(&format!("'{}' created", name.trim()));
                created.push(name.trim().to_string());
            }
            Err(e) => print_error(&format!("{:?}: {}", name, e)),
        }
    }

    let snapshot = settle(&mut directory, |d| {
        d.batch > 0 && created.iter().all(|name| d.contains(name))
    })
    .await?;
    print_directory(&snapshot);
    println!("{}", format!("{} room(s) total", snapshot.len()).dimmed());
    Ok(())
}
