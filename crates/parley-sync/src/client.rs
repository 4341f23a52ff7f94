//! The facade UI code talks to.

use std::sync::Arc;

use parley_store::CollectionStore;

use crate::clock::{Clock, SystemClock};
use crate::composer::Composer;
use crate::config::{MessageScope, Preset, SyncConfig};
use crate::directory::{DirectorySnapshot, RoomDirectory};
use crate::error::SyncResult;
use crate::live::Subscription;
use crate::messages::{MessageLog, MessageSnapshot, PostOutcome};
use crate::profile::ProfileDirectory;
use crate::viewer::ViewerContext;

/// Entry point bundling the room directory, the message log and profiles
/// over one store.
///
/// # Example
///
/// ```ignore
/// let client = ChatClient::new(Arc::new(InMemoryCollectionStore::new()));
/// let mut rooms = client.observe_room_directory();
/// client.create_room("general").await?;
/// rooms.wait_until(|d| d.contains("general")).await;
/// ```
pub struct ChatClient {
    store: Arc<dyn CollectionStore>,
    config: Arc<SyncConfig>,
    clock: Arc<dyn Clock>,
    directory: RoomDirectory,
    messages: Arc<MessageLog>,
    profiles: ProfileDirectory,
}

impl ChatClient {
    /// Create a client with default configuration
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self::builder(store).build()
    }

    /// Start building a client
    pub fn builder(store: Arc<dyn CollectionStore>) -> ChatClientBuilder {
        ChatClientBuilder {
            store,
            config: SyncConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Observe the set of rooms
    pub fn observe_room_directory(&self) -> Subscription<DirectorySnapshot> {
        self.directory.subscribe()
    }

    /// Create a room
    pub async fn create_room(&self, name: &str) -> SyncResult<()> {
        self.directory.create_room(name).await
    }

    /// Observe the default-scope message log as `viewer`
    pub fn observe_messages(&self, viewer: ViewerContext) -> Subscription<MessageSnapshot> {
        self.messages.subscribe(viewer)
    }

    /// Post into the default-scope message log
    pub async fn post_message(
        &self,
        body: &str,
        viewer: &ViewerContext,
    ) -> SyncResult<PostOutcome> {
        self.messages.post_message(body, viewer).await
    }

    /// Store the viewer's display name
    pub async fn register_profile(&self, viewer: &ViewerContext, username: &str) -> SyncResult<()> {
        self.profiles.register(viewer, username).await
    }

    /// The message log of one room, independent of the configured default scope
    ///
    /// The room name is trimmed, so `room_log(" general ")` is the log of the
    /// room `create_room(" general ")` created.
    pub fn room_log(&self, room: impl AsRef<str>) -> MessageLog {
        MessageLog::with_scope(
            Arc::clone(&self.store),
            Arc::clone(&self.config),
            MessageScope::room(room),
        )
        .with_clock(Arc::clone(&self.clock))
    }

    /// A composer posting into the default-scope message log
    pub fn composer(&self) -> Composer {
        Composer::new(Arc::clone(&self.messages))
    }
}

/// Builder for [`ChatClient`]
pub struct ChatClientBuilder {
    store: Arc<dyn CollectionStore>,
    config: SyncConfig,
    clock: Arc<dyn Clock>,
}

impl ChatClientBuilder {
    /// Use a complete configuration
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a preset, keeping other settings
    pub fn preset(mut self, preset: Preset) -> Self {
        self.config.preset = preset;
        self
    }

    /// Set the default message scope
    pub fn message_scope(mut self, scope: MessageScope) -> Self {
        self.config.message_scope = scope.normalized();
        self
    }

    /// Use a custom clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the client
    pub fn build(self) -> ChatClient {
        let config = Arc::new(self.config);
        let directory = RoomDirectory::new(Arc::clone(&self.store), Arc::clone(&config))
            .with_clock(Arc::clone(&self.clock));
        let messages = MessageLog::new(Arc::clone(&self.store), Arc::clone(&config))
            .with_clock(Arc::clone(&self.clock));
        let profiles = ProfileDirectory::new(Arc::clone(&self.store), Arc::clone(&config));
        ChatClient {
            store: self.store,
            config,
            clock: self.clock,
            directory,
            messages: Arc::new(messages),
            profiles,
        }
    }
}
