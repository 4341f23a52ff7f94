//! Live snapshots fed by a store subscription.
//!
//! Each subscription runs as one spawned task. The task folds every batch it
//! receives into a fresh snapshot value and replaces the observed value
//! wholesale; observers never see a partially applied batch.
//!
//! Cancellation detaches the publishing half under a short lock that the
//! task must also hold to publish, so nothing is published once
//! [`Subscription::cancel`] has returned.

use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use parley_store::{BatchStream, SnapshotBatch, StoreResult};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::SyncError;

/// Publishing half of a subscription, owned by the shared slot
struct Publisher<T> {
    snapshots: watch::Sender<Arc<T>>,
    faults: broadcast::Sender<SyncError>,
}

struct Shared<T> {
    label: String,
    publisher: Mutex<Option<Publisher<T>>>,
    last_fault: Mutex<Option<SyncError>>,
    token: CancellationToken,
}

impl<T> Shared<T> {
    /// Replace the observed snapshot. Returns false once cancelled.
    fn publish(&self, snapshot: T) -> bool {
        let guard = self.publisher.lock();
        match guard.as_ref() {
            Some(publisher) => {
                publisher.snapshots.send_replace(Arc::new(snapshot));
                true
            }
            None => false,
        }
    }

    /// Report a non-fatal fault. Dropped silently once cancelled.
    fn report(&self, fault: SyncError) {
        let guard = self.publisher.lock();
        let Some(publisher) = guard.as_ref() else {
            return;
        };
        warn!(subscription = %self.label, error = %fault, "Subscription fault");
        *self.last_fault.lock() = Some(fault.clone());
        let _ = publisher.faults.send(fault);
    }

    /// Detach the publisher after the store side ended, so observers see the
    /// channels close.
    fn finish(&self) {
        if self.publisher.lock().take().is_some() {
            debug!(subscription = %self.label, "Subscription ended");
        }
    }

    fn cancel(&self) {
        let detached = self.publisher.lock().take();
        self.token.cancel();
        if detached.is_some() {
            debug!(subscription = %self.label, "Subscription cancelled");
        }
    }
}

/// Handle to a live, wholesale-replaced snapshot
///
/// Dropping the handle cancels the subscription.
pub struct Subscription<T> {
    snapshots: watch::Receiver<Arc<T>>,
    shared: Arc<Shared<T>>,
}

impl<T> Subscription<T> {
    /// The latest published snapshot
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// A fresh receiver over the snapshot channel
    pub fn watch(&self) -> watch::Receiver<Arc<T>> {
        self.snapshots.clone()
    }

    /// Wait for the next snapshot published after the last one seen
    ///
    /// Returns `None` once the subscription is cancelled or the store has
    /// ended it.
    pub async fn next_snapshot(&mut self) -> Option<Arc<T>> {
        self.snapshots.changed().await.ok()?;
        Some(Arc::clone(&self.snapshots.borrow_and_update()))
    }

    /// Wait until a snapshot satisfies `predicate`, checking the current one first
    pub async fn wait_until<P>(&mut self, mut predicate: P) -> Option<Arc<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .ok()
            .map(|snapshot| Arc::clone(&snapshot))
    }

    /// Receive faults reported after this call
    ///
    /// The receiver is closed immediately if the subscription was already
    /// cancelled.
    pub fn faults(&self) -> broadcast::Receiver<SyncError> {
        match self.shared.publisher.lock().as_ref() {
            Some(publisher) => publisher.faults.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// The most recent fault, if any was reported
    pub fn last_fault(&self) -> Option<SyncError> {
        self.shared.last_fault.lock().clone()
    }

    /// Stop the subscription. Idempotent.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }
}

impl<T: Send + Sync + 'static> Subscription<T> {
    /// Convert into a stream of snapshots, starting with the current one
    pub fn into_stream(self) -> impl Stream<Item = Arc<T>> + Send {
        async_stream::stream! {
            let mut subscription = self;
            let first = Arc::clone(&subscription.snapshots.borrow_and_update());
            yield first;
            while let Some(snapshot) = subscription.next_snapshot().await {
                yield snapshot;
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.shared.label)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Spawn the task driving one subscription
///
/// `open` resolves to the store's batch stream. `fold` turns the n-th batch
/// (counting from 1) into the next snapshot.
pub(crate) fn spawn_subscription<T, O, F>(
    label: impl Into<String>,
    open: O,
    initial: T,
    fault_capacity: usize,
    fold: F,
) -> Subscription<T>
where
    T: Send + Sync + 'static,
    O: Future<Output = StoreResult<BatchStream>> + Send + 'static,
    F: FnMut(u64, SnapshotBatch) -> T + Send + 'static,
{
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));
    let (fault_tx, _) = broadcast::channel(fault_capacity.max(1));
    let shared = Arc::new(Shared {
        label: label.into(),
        publisher: Mutex::new(Some(Publisher {
            snapshots: snapshot_tx,
            faults: fault_tx,
        })),
        last_fault: Mutex::new(None),
        token: CancellationToken::new(),
    });

    let task = Arc::clone(&shared);
    tokio::spawn(async move {
        drive(&task, open, fold).await;
        task.finish();
    });

    Subscription {
        snapshots: snapshot_rx,
        shared,
    }
}

/// Run one subscription until the store ends it or it is cancelled
async fn drive<T, O, F>(task: &Shared<T>, open: O, mut fold: F)
where
    O: Future<Output = StoreResult<BatchStream>>,
    F: FnMut(u64, SnapshotBatch) -> T,
{
    let token = task.token.clone();
    let mut batches = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        opened = open => match opened {
            Ok(batches) => batches,
            Err(e) => {
                task.report(SyncError::Subscription(e.to_string()));
                return;
            }
        },
    };
    debug!(subscription = %task.label, "Subscription opened");

    let mut seq: u64 = 0;
    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            item = batches.next() => item,
        };
        match item {
            Some(Ok(batch)) => {
                seq += 1;
                let documents = batch.len();
                if !task.publish(fold(seq, batch)) {
                    return;
                }
                trace!(subscription = %task.label, batch = seq, documents, "Snapshot published");
            }
            Some(Err(e)) => task.report(SyncError::Subscription(e.to_string())),
            None => {
                debug!(subscription = %task.label, "Store closed the subscription");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parley_store::{CollectionPath, StoreError};
    use tokio::sync::mpsc;

    fn batch(n: usize) -> SnapshotBatch {
        let collection = CollectionPath::new("things").unwrap();
        let documents = (0..n)
            .map(|i| {
                parley_store::Document::new(
                    parley_store::DocumentId::new(format!("d{i}")).unwrap(),
                    Default::default(),
                )
            })
            .collect();
        SnapshotBatch::new(collection, documents)
    }

    /// A subscription over a channel-fed batch stream, counting documents
    fn counting(
        rx: mpsc::UnboundedReceiver<StoreResult<SnapshotBatch>>,
    ) -> Subscription<usize> {
        let stream: BatchStream = Box::pin(async_stream::stream! {
            let mut rx = rx;
            while let Some(item) = rx.recv().await {
                yield item;
            }
        });
        spawn_subscription("test", async move { Ok(stream) }, 0, 8, |_, b| b.len())
    }

    #[tokio::test]
    async fn test_publishes_each_batch() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = counting(rx);
        assert_eq!(*sub.current(), 0);

        tx.send(Ok(batch(2))).unwrap();
        assert_eq!(*sub.next_snapshot().await.unwrap(), 2);
        tx.send(Ok(batch(5))).unwrap();
        assert_eq!(*sub.wait_until(|n| *n == 5).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_fault_keeps_last_snapshot() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = counting(rx);
        let mut faults = sub.faults();

        tx.send(Ok(batch(3))).unwrap();
        sub.wait_until(|n| *n == 3).await.unwrap();

        tx.send(Err(StoreError::unavailable("offline"))).unwrap();
        let fault = faults.recv().await.unwrap();
        assert!(matches!(fault, SyncError::Subscription(_)));
        assert_eq!(*sub.current(), 3);
        assert_eq!(sub.last_fault(), Some(fault));

        tx.send(Ok(batch(1))).unwrap();
        assert_eq!(*sub.wait_until(|n| *n == 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_publication() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = counting(rx);
        tx.send(Ok(batch(1))).unwrap();
        sub.wait_until(|n| *n == 1).await.unwrap();

        sub.cancel();
        sub.cancel();
        assert!(sub.is_cancelled());

        let _ = tx.send(Ok(batch(9)));
        assert!(sub.next_snapshot().await.is_none());
        assert_eq!(*sub.current(), 1);
    }

    #[tokio::test]
    async fn test_faults_after_cancel_is_closed() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let sub = counting(rx);
        sub.cancel();
        let mut faults = sub.faults();
        assert!(matches!(
            faults.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_open_failure_is_reported() {
        let mut sub: Subscription<usize> = spawn_subscription(
            "broken",
            async { Err(StoreError::permission_denied("things")) },
            0,
            8,
            |_, b| b.len(),
        );
        let ended = tokio::time::timeout(Duration::from_secs(1), sub.next_snapshot())
            .await
            .unwrap();
        assert!(ended.is_none());
        assert!(matches!(sub.last_fault(), Some(SyncError::Subscription(_))));
        assert_eq!(*sub.current(), 0);
        assert!(!sub.is_cancelled());
    }

    #[tokio::test]
    async fn test_closed_store_stream_ends_subscription() {
        let mut sub: Subscription<usize> = spawn_subscription(
            "ended",
            async { Ok(Box::pin(futures::stream::empty()) as BatchStream) },
            0,
            8,
            |_, b| b.len(),
        );
        let ended = tokio::time::timeout(Duration::from_secs(1), sub.next_snapshot())
            .await
            .unwrap();
        assert!(ended.is_none());
        assert!(sub.wait_until(|n| *n > 0).await.is_none());

        let mut faults = sub.faults();
        assert!(matches!(
            faults.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_last_batch_is_kept_when_store_ends() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = counting(rx);
        tx.send(Ok(batch(2))).unwrap();
        drop(tx);

        assert_eq!(*sub.wait_until(|n| *n == 2).await.unwrap(), 2);
        assert!(sub.next_snapshot().await.is_none());
        assert_eq!(*sub.current(), 2);
    }

    #[tokio::test]
    async fn test_into_stream_starts_with_current() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = counting(rx);
        let mut stream = Box::pin(sub.into_stream());
        assert_eq!(*stream.next().await.unwrap(), 0);
        tx.send(Ok(batch(4))).unwrap();
        assert_eq!(*stream.next().await.unwrap(), 4);
    }
}
