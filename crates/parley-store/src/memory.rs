//! In-memory store implementation
//!
//! This module provides an in-memory implementation of [`CollectionStore`],
//! suitable for testing, simulation and the demo binary. It can inject read,
//! write and subscription faults so callers can exercise their error paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::document::{Document, Fields, OrderBy, SnapshotBatch};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocumentId, DocumentPath};
use crate::{BatchStream, CollectionStore};

/// Default capacity of each collection's change notice channel
const DEFAULT_NOTICE_CAPACITY: usize = 256;

/// Notice sent to subscribers of a collection
#[derive(Debug, Clone)]
enum ChangeNotice {
    /// The collection changed; subscribers re-read the full set
    Changed,
    /// A fault to surface on every open subscription
    Fault(StoreError),
}

#[derive(Debug)]
struct Inner {
    /// Documents per collection, keyed by id
    collections: DashMap<CollectionPath, BTreeMap<DocumentId, Fields>>,
    /// Change notice channel per collection
    notifiers: DashMap<CollectionPath, broadcast::Sender<ChangeNotice>>,
    notice_capacity: usize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Inner {
    fn notifier(&self, collection: &CollectionPath) -> broadcast::Sender<ChangeNotice> {
        self.notifiers
            .entry(collection.clone())
            .or_insert_with(|| broadcast::channel(self.notice_capacity).0)
            .value()
            .clone()
    }

    fn notify(&self, collection: &CollectionPath, notice: ChangeNotice) {
        if let Some(tx) = self.notifiers.get(collection) {
            // No receivers is fine: nobody is subscribed yet
            let _ = tx.send(notice);
        }
    }

    fn snapshot(&self, collection: &CollectionPath, order_by: Option<&OrderBy>) -> SnapshotBatch {
        let mut documents = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if let Some(order) = order_by {
            documents.retain(|doc| order.matches(doc));
            documents.sort_by(|a, b| order.compare(a, b));
        }

        SnapshotBatch::new(collection.clone(), documents)
    }

    fn check_read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("injected read failure"));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("injected write failure"));
        }
        Ok(())
    }

    fn write(&self, collection: &CollectionPath, id: DocumentId, fields: Fields) {
        self.collections
            .entry(collection.clone())
            .or_default()
            .insert(id, fields);
        self.notify(collection, ChangeNotice::Changed);
    }
}

/// In-memory implementation of [`CollectionStore`]
///
/// Uses `DashMap` for concurrent access to collections and a broadcast
/// channel per collection to wake subscribers. Cloning the store yields
/// another handle onto the same data.
#[derive(Debug, Clone)]
pub struct InMemoryCollectionStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryCollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollectionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_notice_capacity(DEFAULT_NOTICE_CAPACITY)
    }

    /// Create with a custom change notice channel capacity
    ///
    /// A subscriber that falls behind by more than this many notices simply
    /// re-reads the full collection once it catches up.
    pub fn with_notice_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                collections: DashMap::new(),
                notifiers: DashMap::new(),
                notice_capacity: capacity.max(1),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Make every subsequent point read fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Deliver a fault to every open subscription of a collection
    pub fn inject_subscription_fault(&self, collection: &CollectionPath, error: StoreError) {
        debug!(collection = %collection, error = %error, "Injecting subscription fault");
        self.inner.notify(collection, ChangeNotice::Fault(error));
    }

    /// Number of point reads attempted so far
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of writes attempted so far (including failed ones)
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Number of documents currently stored in a collection
    pub fn document_count(&self, collection: &CollectionPath) -> usize {
        self.inner
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CollectionStore for InMemoryCollectionStore {
    async fn subscribe_collection(
        &self,
        collection: &CollectionPath,
        order_by: Option<OrderBy>,
    ) -> StoreResult<BatchStream> {
        trace!(collection = %collection, "Opening subscription");

        // Subscribe before the first read so no change can slip between them
        let mut rx = self.inner.notifier(collection).subscribe();
        let inner = Arc::clone(&self.inner);
        let collection = collection.clone();

        Ok(Box::pin(async_stream::stream! {
            yield Ok(inner.snapshot(&collection, order_by.as_ref()));
            loop {
                match rx.recv().await {
                    Ok(ChangeNotice::Changed) => {
                        yield Ok(inner.snapshot(&collection, order_by.as_ref()));
                    }
                    Ok(ChangeNotice::Fault(error)) => yield Err(error),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        trace!(collection = %collection, skipped, "Subscriber lagged, re-reading");
                        yield Ok(inner.snapshot(&collection, order_by.as_ref()));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.inner.check_read()?;
        trace!(path = %path, "Reading document");

        Ok(self
            .inner
            .collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()).cloned())
            .map(|fields| Document::new(path.id().clone(), fields)))
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.inner.check_write()?;
        trace!(path = %path, "Setting document");

        self.inner.write(path.collection(), path.id().clone(), fields);
        Ok(())
    }

    async fn add_document(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> StoreResult<DocumentId> {
        self.inner.check_write()?;

        let id = DocumentId::new(Uuid::now_v7().simple().to_string())?;
        trace!(collection = %collection, id = %id, "Adding document");

        self.inner.write(collection, id.clone(), fields);
        Ok(id)
    }
}
