//! Message log synchronization.
//!
//! A [`MessageLog`] observes one message collection ordered by send time and
//! republishes it, projected for a viewer, after every batch. Posting
//! resolves the author's display name from their profile and appends a new
//! document under a store-assigned id.

use std::sync::Arc;

use parley_store::{CollectionStore, DocumentId, OrderBy, SnapshotBatch};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{EmptyBodyPolicy, MessageScope, SyncConfig};
use crate::directory::validate_room_name;
use crate::error::{SyncError, SyncResult};
use crate::live::{Subscription, spawn_subscription};
use crate::profile::ProfileDirectory;
use crate::projection::{DisplayMessage, project};
use crate::record::{NewMessage, StoredMessage, fields};
use crate::viewer::ViewerContext;

/// The projected message log as of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Messages, newest first
    pub messages: Vec<DisplayMessage>,
    /// Number of batches folded so far; 0 before the first one arrives
    pub batch: u64,
}

impl MessageSnapshot {
    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message
    pub fn newest(&self) -> Option<&DisplayMessage> {
        self.messages.first()
    }
}

/// Result of a post request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The message was written under this id
    Posted(DocumentId),
    /// Nothing was written (empty body)
    Ignored,
}

impl PostOutcome {
    /// Whether a message was written
    pub fn is_posted(&self) -> bool {
        matches!(self, PostOutcome::Posted(_))
    }
}

/// Decode a batch, skipping documents that are not messages
fn decode_batch(batch: &SnapshotBatch) -> Vec<StoredMessage> {
    batch
        .iter()
        .filter_map(|doc| match StoredMessage::from_document(doc) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(
                    collection = %batch.collection,
                    id = %doc.id,
                    error = %e,
                    "Skipping malformed message document"
                );
                None
            }
        })
        .collect()
}

/// Live message log and posting for one scope
pub struct MessageLog {
    store: Arc<dyn CollectionStore>,
    config: Arc<SyncConfig>,
    scope: MessageScope,
    profiles: ProfileDirectory,
    clock: Arc<dyn Clock>,
}

impl MessageLog {
    /// Create a log over the configured default scope
    pub fn new(store: Arc<dyn CollectionStore>, config: Arc<SyncConfig>) -> Self {
        let scope = config.message_scope.clone();
        Self::with_scope(store, config, scope)
    }

    /// Create a log over an explicit scope
    pub fn with_scope(
        store: Arc<dyn CollectionStore>,
        config: Arc<SyncConfig>,
        scope: MessageScope,
    ) -> Self {
        let profiles = ProfileDirectory::new(Arc::clone(&store), Arc::clone(&config));
        Self {
            store,
            config,
            scope: scope.normalized(),
            profiles,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock stamping `sent_on`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The scope this log reads and writes
    pub fn scope(&self) -> &MessageScope {
        &self.scope
    }

    /// Observe the log as seen by `viewer`
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self, viewer: ViewerContext) -> Subscription<MessageSnapshot> {
        let store = Arc::clone(&self.store);
        let path = self.config.messages_path(&self.scope);
        let open = async move {
            let path = path?;
            store
                .subscribe_collection(&path, Some(OrderBy::ascending(fields::SENT_ON)))
                .await
        };
        let label = match &self.scope {
            MessageScope::Global => "message-log".to_string(),
            MessageScope::Room(room) => format!("message-log:{room}"),
        };
        spawn_subscription(
            label,
            open,
            MessageSnapshot::default(),
            self.config.fault_channel_capacity(),
            move |seq, batch| MessageSnapshot {
                messages: project(&decode_batch(&batch), &viewer),
                batch: seq,
            },
        )
    }

    /// Post `body` as `viewer`
    ///
    /// An empty body is checked first: under [`EmptyBodyPolicy::Ignore`] it
    /// returns [`PostOutcome::Ignored`] without touching the store.
    ///
    /// # Errors
    ///
    /// `EmptyBody` (only under [`EmptyBodyPolicy::Reject`]), `EmptyName` or
    /// `InvalidName` for a room scope that names no room,
    /// `Unauthenticated` if the viewer has no user id, `WriteFailed` if the
    /// write fails. A failed profile lookup is not an error.
    pub async fn post_message(
        &self,
        body: &str,
        viewer: &ViewerContext,
    ) -> SyncResult<PostOutcome> {
        if body.is_empty() {
            return match self.config.empty_body {
                EmptyBodyPolicy::Ignore => {
                    debug!("Ignoring empty message");
                    Ok(PostOutcome::Ignored)
                }
                EmptyBodyPolicy::Reject => Err(SyncError::EmptyBody),
            };
        }
        if let MessageScope::Room(room) = &self.scope {
            validate_room_name(room)?;
        }
        let author_id = viewer.user_id().ok_or(SyncError::Unauthenticated)?;
        let author_name = self.profiles.display_name(author_id).await;

        let message = NewMessage {
            body: body.to_string(),
            author_id: author_id.to_string(),
            author_name,
            sent_at: self.clock.now_millis(),
        };
        let path = self
            .config
            .messages_path(&self.scope)
            .map_err(|e| SyncError::write_failed("Failed to send message", e))?;
        let fields = message
            .to_fields()
            .map_err(|e| SyncError::write_failed("Failed to send message", e))?;
        let id = self
            .store
            .add_document(&path, fields)
            .await
            .map_err(|e| SyncError::write_failed("Failed to send message", e))?;

        info!(id = %id, author = %author_id, scope = ?self.scope, "Message posted");
        Ok(PostOutcome::Posted(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use parley_store::{CollectionPath, InMemoryCollectionStore};

    fn message_log(store: &InMemoryCollectionStore, clock: Arc<ManualClock>) -> MessageLog {
        MessageLog::new(Arc::new(store.clone()), Arc::new(SyncConfig::default())).with_clock(clock)
    }

    #[tokio::test]
    async fn test_empty_body_is_ignored() {
        let store = InMemoryCollectionStore::new();
        let log = message_log(&store, Arc::new(ManualClock::new(0)));
        for viewer in [ViewerContext::anonymous(), ViewerContext::signed_in("u1")] {
            assert_eq!(log.post_message("", &viewer).await, Ok(PostOutcome::Ignored));
        }
        assert_eq!(store.reads(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_rejected_by_policy() {
        let store = InMemoryCollectionStore::new();
        let config = SyncConfig::default().empty_body(EmptyBodyPolicy::Reject);
        let log = MessageLog::new(Arc::new(store.clone()), Arc::new(config));
        assert_eq!(
            log.post_message("", &ViewerContext::anonymous()).await,
            Err(SyncError::EmptyBody)
        );
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated() {
        let store = InMemoryCollectionStore::new();
        let log = message_log(&store, Arc::new(ManualClock::new(0)));
        assert_eq!(
            log.post_message("hi", &ViewerContext::anonymous()).await,
            Err(SyncError::Unauthenticated)
        );
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_post_writes_wire_fields() {
        let store = InMemoryCollectionStore::new();
        let log = message_log(&store, Arc::new(ManualClock::new(77)));
        let outcome = log
            .post_message("hello", &ViewerContext::signed_in("u1"))
            .await
            .unwrap();
        let PostOutcome::Posted(id) = outcome else {
            panic!("expected a posted message");
        };

        let path = CollectionPath::new("messages").unwrap().doc(id.as_str()).unwrap();
        let doc = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(doc.get_str("message"), Some("hello"));
        assert_eq!(doc.get_str("sent_by"), Some("u1"));
        assert_eq!(doc.get_str("sent_by_name"), Some("Unknown"));
        assert_eq!(doc.get_i64("sent_on"), Some(77));
    }

    #[tokio::test]
    async fn test_write_failure() {
        let store = InMemoryCollectionStore::new();
        store.fail_writes(true);
        let log = message_log(&store, Arc::new(ManualClock::new(0)));
        let err = log
            .post_message("hi", &ViewerContext::signed_in("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn test_subscribe_orders_newest_first() {
        let store = InMemoryCollectionStore::new();
        let clock = Arc::new(ManualClock::new(1));
        let log = message_log(&store, Arc::clone(&clock));
        let viewer = ViewerContext::signed_in("u1");
        let mut sub = log.subscribe(viewer.clone());

        for body in ["one", "two", "three"] {
            log.post_message(body, &viewer).await.unwrap();
            clock.advance(1);
        }
        let snapshot = sub.wait_until(|s| s.len() == 3).await.unwrap();
        let bodies: Vec<&str> = snapshot.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["three", "two", "one"]);
        assert!(snapshot.messages.iter().all(|m| m.is_own_message));
        assert_eq!(snapshot.newest().map(|m| m.sent_at), Some(3));
    }
}
