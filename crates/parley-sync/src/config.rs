//! Configuration and presets for the sync engine.
//!
//! Defaults name the `chatRooms`, `messages` and `users` collections that
//! other Parley clients use.

use parley_store::{CollectionPath, StoreResult};

/// Preset configurations for common use cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// Balanced defaults for general use
    #[default]
    Default,
    /// Many short-lived observers, e.g. a chat screen per room
    Chat,
    /// Minimal footprint for headless tools
    Minimal,
}

impl Preset {
    /// Capacity of the per-subscription fault channel
    pub fn fault_channel_capacity(&self) -> usize {
        match self {
            Preset::Default => 64,
            Preset::Chat => 256,
            Preset::Minimal => 8,
        }
    }
}

/// Which message log a [`MessageLog`](crate::MessageLog) reads and writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum MessageScope {
    /// One log shared by every room
    #[default]
    Global,
    /// The `messages` subcollection of a single room
    Room(String),
}

impl MessageScope {
    /// Scope to the room named `name`, trimmed the way room names are
    pub fn room(name: impl AsRef<str>) -> Self {
        MessageScope::Room(name.as_ref().trim().to_string())
    }

    pub(crate) fn normalized(self) -> Self {
        match self {
            MessageScope::Room(room) => MessageScope::room(room),
            global => global,
        }
    }
}

/// What posting an empty body does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyBodyPolicy {
    /// Return without touching the store and without an error
    #[default]
    Ignore,
    /// Fail with [`SyncError::EmptyBody`](crate::SyncError::EmptyBody)
    Reject,
}

/// Configuration for the sync components
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Collection holding one document per room, keyed by room name
    pub rooms_collection: String,
    /// Collection holding the global message log, and the name of each
    /// room's message subcollection.
    pub messages_collection: String,
    /// Collection holding user profiles, keyed by user id
    pub users_collection: String,
    /// Default scope of message logs
    pub message_scope: MessageScope,
    /// Empty-body behavior of `post_message`
    pub empty_body: EmptyBodyPolicy,
    /// Display name used when a profile lookup yields nothing
    pub unknown_author: String,
    /// Configuration preset
    pub preset: Preset,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rooms_collection: "chatRooms".to_string(),
            messages_collection: "messages".to_string(),
            users_collection: "users".to_string(),
            message_scope: MessageScope::Global,
            empty_body: EmptyBodyPolicy::Ignore,
            unknown_author: "Unknown".to_string(),
            preset: Preset::Default,
        }
    }
}

impl SyncConfig {
    /// Create a configuration from a preset
    pub fn with_preset(preset: Preset) -> Self {
        Self {
            preset,
            ..Default::default()
        }
    }

    /// Set the default message scope
    pub fn message_scope(mut self, scope: MessageScope) -> Self {
        self.message_scope = scope.normalized();
        self
    }

    /// Set the empty-body policy
    pub fn empty_body(mut self, policy: EmptyBodyPolicy) -> Self {
        self.empty_body = policy;
        self
    }

    /// Set the fallback author display name
    pub fn unknown_author(mut self, name: impl Into<String>) -> Self {
        self.unknown_author = name.into();
        self
    }

    /// Override the collection names
    pub fn collections(
        mut self,
        rooms: impl Into<String>,
        messages: impl Into<String>,
        users: impl Into<String>,
    ) -> Self {
        self.rooms_collection = rooms.into();
        self.messages_collection = messages.into();
        self.users_collection = users.into();
        self
    }

    pub(crate) fn rooms_path(&self) -> StoreResult<CollectionPath> {
        CollectionPath::new(self.rooms_collection.as_str())
    }

    pub(crate) fn users_path(&self) -> StoreResult<CollectionPath> {
        CollectionPath::new(self.users_collection.as_str())
    }

    pub(crate) fn messages_path(&self, scope: &MessageScope) -> StoreResult<CollectionPath> {
        match scope {
            MessageScope::Global => CollectionPath::new(self.messages_collection.as_str()),
            MessageScope::Room(room) => self
                .rooms_path()?
                .subcollection(room.trim(), &self.messages_collection),
        }
    }

    pub(crate) fn fault_channel_capacity(&self) -> usize {
        self.preset.fault_channel_capacity()
    }
}
