//! User profile lookup and registration.

use std::sync::Arc;

use parley_store::{CollectionStore, DocumentPath, StoreResult};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::record::{ProfileRecord, fields};
use crate::viewer::ViewerContext;

/// Display names keyed by user id
pub struct ProfileDirectory {
    store: Arc<dyn CollectionStore>,
    config: Arc<SyncConfig>,
}

impl ProfileDirectory {
    /// Create a profile directory over `store`
    pub fn new(store: Arc<dyn CollectionStore>, config: Arc<SyncConfig>) -> Self {
        Self { store, config }
    }

    fn profile_path(&self, user_id: &str) -> StoreResult<DocumentPath> {
        self.config.users_path()?.doc(user_id)
    }

    /// Resolve the display name of `user_id`
    ///
    /// Never fails: a missing profile, a missing or non-string `username`,
    /// or a failed lookup all resolve to the configured unknown author name.
    pub async fn display_name(&self, user_id: &str) -> String {
        let lookup = match self.profile_path(user_id) {
            Ok(path) => self.store.get_document(&path).await,
            Err(e) => Err(e),
        };
        match lookup {
            Ok(Some(doc)) => match doc.get_str(fields::USERNAME) {
                Some(name) => name.to_string(),
                None => {
                    debug!(user_id = %user_id, "Profile has no username");
                    self.config.unknown_author.clone()
                }
            },
            Ok(None) => {
                debug!(user_id = %user_id, "No profile found");
                self.config.unknown_author.clone()
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile lookup failed, using fallback name");
                self.config.unknown_author.clone()
            }
        }
    }

    /// Store `username` (trimmed) as the viewer's display name
    pub async fn register(&self, viewer: &ViewerContext, username: &str) -> SyncResult<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SyncError::EmptyUsername);
        }
        let user_id = viewer.user_id().ok_or(SyncError::Unauthenticated)?;

        let path = self
            .profile_path(user_id)
            .map_err(|e| SyncError::write_failed("Failed to save profile", e))?;
        let record = ProfileRecord {
            username: username.to_string(),
        };
        let fields = record
            .to_fields()
            .map_err(|e| SyncError::write_failed("Failed to save profile", e))?;
        self.store
            .set_document(&path, fields)
            .await
            .map_err(|e| SyncError::write_failed("Failed to save profile", e))?;

        debug!(user_id = %user_id, username = %username, "Profile registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_store::{CollectionPath, Fields, InMemoryCollectionStore};
    use serde_json::json;

    fn profiles(store: &InMemoryCollectionStore) -> ProfileDirectory {
        ProfileDirectory::new(Arc::new(store.clone()), Arc::new(SyncConfig::default()))
    }

    #[tokio::test]
    async fn test_register_then_resolve() {
        let store = InMemoryCollectionStore::new();
        let dir = profiles(&store);
        dir.register(&ViewerContext::signed_in("u1"), " Ada ").await.unwrap();
        assert_eq!(dir.display_name("u1").await, "Ada");
    }

    #[tokio::test]
    async fn test_missing_profile_falls_back() {
        let store = InMemoryCollectionStore::new();
        assert_eq!(profiles(&store).display_name("ghost").await, "Unknown");
    }

    #[tokio::test]
    async fn test_non_string_username_falls_back() {
        let store = InMemoryCollectionStore::new();
        let path = CollectionPath::new("users").unwrap().doc("u1").unwrap();
        let mut fields = Fields::new();
        fields.insert("username".into(), json!(7));
        store.set_document(&path, fields).await.unwrap();
        assert_eq!(profiles(&store).display_name("u1").await, "Unknown");
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back() {
        let store = InMemoryCollectionStore::new();
        store.fail_reads(true);
        assert_eq!(profiles(&store).display_name("u1").await, "Unknown");
    }

    #[tokio::test]
    async fn test_register_errors() {
        let store = InMemoryCollectionStore::new();
        let dir = profiles(&store);
        assert_eq!(
            dir.register(&ViewerContext::signed_in("u1"), "  ").await,
            Err(SyncError::EmptyUsername)
        );
        assert_eq!(
            dir.register(&ViewerContext::anonymous(), "Ada").await,
            Err(SyncError::Unauthenticated)
        );
        assert_eq!(store.writes(), 0);

        store.fail_writes(true);
        assert!(matches!(
            dir.register(&ViewerContext::signed_in("u1"), "Ada").await,
            Err(SyncError::WriteFailed(_))
        ));
    }
}
