//! # Parley Sync
//!
//! Real-time synchronization of chat rooms and messages against a
//! push-capable document store.
//!
//! This crate keeps live, wholesale-replaced snapshots of a room directory
//! and of a message log, creates rooms without a transaction, and derives
//! the per-viewer presentation of messages.
//!
//! ## Components
//!
//! - **RoomDirectory**: Live set of room names and `create_room`
//! - **MessageLog**: Live newest-first message log and `post_message`
//! - **projection**: Pure ownership marking and ordering of messages
//! - **Subscription**: Handle to a live snapshot, cancelled on drop
//! - **ChatClient**: Facade bundling the above over one store
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parley_store::InMemoryCollectionStore;
//! use parley_sync::{ChatClient, ViewerContext};
//!
//! #[tokio::main]
//! async fn main() -> parley_sync::SyncResult<()> {
//!     let client = ChatClient::new(Arc::new(InMemoryCollectionStore::new()));
//!     let viewer = ViewerContext::signed_in("ada");
//!
//!     let mut log = client.observe_messages(viewer.clone());
//!     client.create_room("general").await?;
//!     client.post_message("hello", &viewer).await?;
//!
//!     let snapshot = log.wait_until(|s| !s.is_empty()).await.unwrap();
//!     for message in &snapshot.messages {
//!         println!("{}: {}", message.author_name, message.body);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod clock;
pub mod composer;
pub mod config;
pub mod directory;
pub mod error;
pub mod live;
pub mod messages;
pub mod profile;
pub mod projection;
pub mod record;
pub mod viewer;

// Re-exports
pub use client::{ChatClient, ChatClientBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use composer::Composer;
pub use config::{EmptyBodyPolicy, MessageScope, Preset, SyncConfig};
pub use directory::{DirectorySnapshot, RoomDirectory};
pub use error::{SyncError, SyncResult};
pub use live::Subscription;
pub use messages::{MessageLog, MessageSnapshot, PostOutcome};
pub use profile::ProfileDirectory;
pub use projection::{DisplayMessage, project};
pub use record::{NewMessage, ProfileRecord, RoomRecord, StoredMessage};
pub use viewer::ViewerContext;
