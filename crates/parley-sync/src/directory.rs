//! Room directory synchronization.
//!
//! The directory is the set of room names, rebuilt from every batch the
//! rooms collection delivers. Room creation is a plain check-then-write:
//! two callers racing on the same name can both succeed, and the store's
//! last-write-wins upsert keeps the name unique.

use std::collections::BTreeSet;
use std::sync::Arc;

use parley_store::{CollectionStore, SnapshotBatch};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::live::{Subscription, spawn_subscription};
use crate::record::RoomRecord;

/// The set of known room names as of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    /// Room names
    pub rooms: BTreeSet<String>,
    /// Number of batches folded so far; 0 before the first one arrives
    pub batch: u64,
}

impl DirectorySnapshot {
    fn from_batch(seq: u64, batch: &SnapshotBatch) -> Self {
        Self {
            rooms: batch.iter().map(|doc| doc.id.to_string()).collect(),
            batch: seq,
        }
    }

    /// Whether a room with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains(name)
    }

    /// Number of rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether there are no rooms
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Iterate over room names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(String::as_str)
    }
}

/// Check a trimmed room name
pub(crate) fn validate_room_name(name: &str) -> SyncResult<()> {
    if name.is_empty() {
        return Err(SyncError::EmptyName);
    }
    if name.contains('/') {
        return Err(SyncError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Live room directory and room creation
pub struct RoomDirectory {
    store: Arc<dyn CollectionStore>,
    config: Arc<SyncConfig>,
    clock: Arc<dyn Clock>,
}

impl RoomDirectory {
    /// Create a directory over `store` using the wall clock
    pub fn new(store: Arc<dyn CollectionStore>, config: Arc<SyncConfig>) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock stamping `createdAt`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Observe the room directory
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> Subscription<DirectorySnapshot> {
        let store = Arc::clone(&self.store);
        let path = self.config.rooms_path();
        let open = async move {
            let path = path?;
            store.subscribe_collection(&path, None).await
        };
        spawn_subscription(
            "room-directory",
            open,
            DirectorySnapshot::default(),
            self.config.fault_channel_capacity(),
            |seq, batch| DirectorySnapshot::from_batch(seq, &batch),
        )
    }

    /// Create a room named `name` (trimmed)
    ///
    /// # Errors
    ///
    /// `EmptyName` or `InvalidName` without touching the store, `NameTaken`
    /// if the room already exists, `WriteFailed` if the lookup or the write
    /// fails.
    pub async fn create_room(&self, name: &str) -> SyncResult<()> {
        let name = name.trim();
        validate_room_name(name)?;

        let path = self
            .config
            .rooms_path()
            .and_then(|rooms| rooms.doc(name))
            .map_err(|e| SyncError::write_failed("Failed to check room name", e))?;

        let existing = self
            .store
            .get_document(&path)
            .await
            .map_err(|e| SyncError::write_failed("Failed to check room name", e))?;
        if existing.is_some() {
            debug!(room = %name, "Room name already taken");
            return Err(SyncError::NameTaken);
        }

        let fields = RoomRecord {
            created_at: self.clock.now_millis(),
        }
        .to_fields()
        .map_err(|e| SyncError::write_failed("Failed to create room", e))?;
        self.store
            .set_document(&path, fields)
            .await
            .map_err(|e| SyncError::write_failed("Failed to create room", e))?;

        info!(room = %name, "Room created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use parley_store::{CollectionPath, InMemoryCollectionStore};

    fn directory(store: &InMemoryCollectionStore) -> RoomDirectory {
        RoomDirectory::new(Arc::new(store.clone()), Arc::new(SyncConfig::default()))
    }

    #[test]
    fn test_validate_room_name() {
        assert_eq!(validate_room_name(""), Err(SyncError::EmptyName));
        assert!(matches!(validate_room_name("a/b"), Err(SyncError::InvalidName(_))));
        assert!(validate_room_name("general").is_ok());
    }

    #[tokio::test]
    async fn test_create_then_observe() {
        let store = InMemoryCollectionStore::new();
        let dir = directory(&store);
        let mut sub = dir.subscribe();

        dir.create_room("  general ").await.unwrap();
        let snapshot = sub.wait_until(|s| s.contains("general")).await.unwrap();
        assert_eq!(snapshot.iter().filter(|r| *r == "general").count(), 1);
        assert!(!snapshot.contains("  general "));
    }

    #[tokio::test]
    async fn test_blank_name_touches_nothing() {
        let store = InMemoryCollectionStore::new();
        let dir = directory(&store);
        assert_eq!(dir.create_room("").await, Err(SyncError::EmptyName));
        assert_eq!(dir.create_room("   ").await, Err(SyncError::EmptyName));
        assert!(matches!(dir.create_room("x/y").await, Err(SyncError::InvalidName(_))));
        assert_eq!(store.reads(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_existing_name_is_taken() {
        let store = InMemoryCollectionStore::new();
        let dir = directory(&store);
        dir.create_room("general").await.unwrap();
        assert_eq!(store.writes(), 1);

        assert_eq!(dir.create_room("general").await, Err(SyncError::NameTaken));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_created_at_from_clock() {
        let store = InMemoryCollectionStore::new();
        let dir = directory(&store).with_clock(Arc::new(ManualClock::new(1234)));
        dir.create_room("general").await.unwrap();

        let path = CollectionPath::new("chatRooms").unwrap().doc("general").unwrap();
        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc.get_i64("createdAt"), Some(1234));
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let store = InMemoryCollectionStore::new();
        store.fail_reads(true);
        let err = directory(&store).create_room("general").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to check room name"));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_write_failure() {
        let store = InMemoryCollectionStore::new();
        store.fail_writes(true);
        let err = directory(&store).create_room("general").await.unwrap_err();
        assert!(matches!(err, SyncError::WriteFailed(_)));
        assert!(err.to_string().starts_with("Failed to create room"));
    }
}
