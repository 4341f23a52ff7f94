//! # Parley Store
//!
//! The remote collection store contract consumed by the Parley sync engine.
//!
//! The store is document oriented: documents live in collections, are
//! addressed by path, and carry a JSON field map. The contract offers point
//! reads, upserts, store-assigned inserts and live subscriptions that deliver
//! the complete matching document set on every change.
//!
//! ## Features
//!
//! - **CollectionStore trait**: Abstraction over any push-capable document store
//! - **InMemoryCollectionStore**: In-memory implementation for tests and demos,
//!   with fault injection
//! - **Paths**: Validated collection/document addressing with subcollections
//!
//! ## Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use parley_store::{CollectionPath, CollectionStore, InMemoryCollectionStore, OrderBy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryCollectionStore::new();
//!     let rooms = CollectionPath::new("chatRooms").unwrap();
//!
//!     let mut batches = store.subscribe_collection(&rooms, None).await.unwrap();
//!     store
//!         .set_document(&rooms.doc("general").unwrap(), Default::default())
//!         .await
//!         .unwrap();
//!
//!     while let Some(Ok(batch)) = batches.next().await {
//!         println!("{} rooms", batch.len());
//!     }
//! }
//! ```

pub mod document;
pub mod error;
pub mod memory;
pub mod path;

// Re-exports
pub use document::{Direction, Document, Fields, OrderBy, SnapshotBatch, to_fields};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryCollectionStore;
pub use path::{CollectionPath, DocumentId, DocumentPath};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

/// Live stream of full-snapshot batches.
///
/// An `Err` item reports a non-fatal fault of the subscription; the stream
/// keeps going afterwards. The stream ends only when it is dropped or the
/// backend shuts down.
pub type BatchStream = Pin<Box<dyn Stream<Item = StoreResult<SnapshotBatch>> + Send>>;

/// Trait for a remote document store with live subscriptions
///
/// Implementations must deliver batches of one subscription in the order the
/// store produced them. No ordering is promised across subscriptions.
/// Writes are per-document atomic; concurrent writes to the same path resolve
/// last-write-wins.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Open a live subscription over a collection
    ///
    /// The first batch is the current content of the collection. Every later
    /// change to the collection produces another complete batch.
    ///
    /// # Arguments
    ///
    /// * `collection` - The collection to watch
    /// * `order_by` - Optional ordering; documents without the field are excluded
    async fn subscribe_collection(
        &self,
        collection: &CollectionPath,
        order_by: Option<OrderBy>,
    ) -> StoreResult<BatchStream>;

    /// Read one document
    ///
    /// Returns `Ok(None)` when the document does not exist.
    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Write a document at a caller-chosen path
    ///
    /// Upsert semantics: an existing document is replaced wholesale.
    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Insert a document under a store-assigned id
    ///
    /// Returns the id the store chose.
    async fn add_document(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> StoreResult<DocumentId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the CollectionStore trait is object-safe
    fn _assert_object_safe(_: &dyn CollectionStore) {}

    #[tokio::test]
    async fn test_store_through_trait_object() {
        let store: std::sync::Arc<dyn CollectionStore> =
            std::sync::Arc::new(InMemoryCollectionStore::new());
        let rooms = CollectionPath::new("chatRooms").unwrap();
        let path = rooms.doc("general").unwrap();

        assert!(store.get_document(&path).await.unwrap().is_none());
        store.set_document(&path, Fields::new()).await.unwrap();
        assert!(store.get_document(&path).await.unwrap().is_some());
    }
}
