use std::sync::Arc;

use {
    tokio::{sync::broadcast::error::RecvError, task::JoinHandle},
    tracing::{debug, warn},
};

use wren_docstore::DocumentStore;

use crate::log::{ConversationKey, ConversationLog, MessageRecord};

/// A running feed task. Dropping it (or calling `cancel`) stops delivery.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Pushes full conversation snapshots to a sink whenever the underlying
/// message collection changes.
///
/// At most one subscription is live at a time; subscribing again replaces
/// the previous one. The sink always receives a complete, ordered snapshot,
/// never a delta, so a missed change signal at worst delays an update.
pub struct LiveFeed {
    store: Arc<dyn DocumentStore>,
    active: Option<Subscription>,
}

impl LiveFeed {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            active: None,
        }
    }

    /// Start streaming snapshots of `key`'s conversation into `sink`. The
    /// current snapshot is delivered first, then one per change signal.
    pub fn subscribe<F>(&mut self, key: ConversationKey, sink: F)
    where
        F: Fn(Vec<MessageRecord>) + Send + 'static,
    {
        // Take the change receiver before the initial read so nothing
        // written in between is missed.
        let mut changes = self.store.changes(&key.collection());
        let log = ConversationLog::new(self.store.clone(), key);
        let handle = tokio::spawn(async move {
            match log.snapshot().await {
                Ok(records) => sink(records),
                Err(error) => warn!(%error, "initial snapshot failed"),
            }
            loop {
                match changes.recv().await {
                    Ok(()) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => {
                        debug!("change channel closed; feed stopping");
                        return;
                    }
                }
                match log.snapshot().await {
                    Ok(records) => sink(records),
                    Err(error) => warn!(%error, "snapshot refresh failed"),
                }
            }
        });
        self.active = Some(Subscription { handle });
    }

    /// Stop the current subscription, if any.
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.active.take() {
            subscription.cancel();
        }
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use {
        tokio::{sync::mpsc, time::timeout},
        wren_common::Role,
        wren_docstore::MemoryDocumentStore,
    };

    use super::*;

    const TICK: Duration = Duration::from_secs(1);

    fn setup() -> (
        Arc<MemoryDocumentStore>,
        ConversationLog,
        LiveFeed,
        mpsc::UnboundedReceiver<Vec<MessageRecord>>,
        mpsc::UnboundedSender<Vec<MessageRecord>>,
    ) {
        let backend = Arc::new(MemoryDocumentStore::new());
        let key = ConversationKey::default_chat("u1");
        let log = ConversationLog::new(backend.clone(), key);
        let feed = LiveFeed::new(backend.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        (backend, log, feed, rx, tx)
    }

    #[tokio::test]
    async fn initial_snapshot_is_delivered_on_subscribe() {
        let (_, log, mut feed, mut rx, tx) = setup();
        log.append(Role::User, "already here").await.unwrap();

        feed.subscribe(ConversationKey::default_chat("u1"), move |records| {
            let _ = tx.send(records);
        });

        let records = timeout(TICK, rx.recv()).await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "already here");
    }

    #[tokio::test]
    async fn appends_trigger_fresh_snapshots() {
        let (_, log, mut feed, mut rx, tx) = setup();
        feed.subscribe(ConversationKey::default_chat("u1"), move |records| {
            let _ = tx.send(records);
        });
        assert!(timeout(TICK, rx.recv()).await.unwrap().unwrap().is_empty());

        log.append(Role::User, "Hello").await.unwrap();
        let records = timeout(TICK, rx.recv()).await.unwrap().unwrap();
        assert_eq!(records.len(), 1);

        log.append(Role::Assistant, "Hi there").await.unwrap();
        let records = timeout(TICK, rx.recv()).await.unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let (_, log, mut feed, mut rx, tx) = setup();
        feed.subscribe(ConversationKey::default_chat("u1"), move |records| {
            let _ = tx.send(records);
        });
        let _ = timeout(TICK, rx.recv()).await.unwrap().unwrap();

        feed.unsubscribe();
        assert!(!feed.is_subscribed());
        log.append(Role::User, "unseen").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn resubscribe_replaces_the_previous_feed() {
        let (_, log, mut feed, mut rx_old, tx_old) = setup();
        feed.subscribe(ConversationKey::default_chat("u1"), move |records| {
            let _ = tx_old.send(records);
        });
        let _ = timeout(TICK, rx_old.recv()).await.unwrap().unwrap();

        let (tx_new, mut rx_new) = mpsc::unbounded_channel();
        feed.subscribe(ConversationKey::default_chat("u1"), move |records| {
            let _ = tx_new.send(records);
        });
        let _ = timeout(TICK, rx_new.recv()).await.unwrap().unwrap();

        log.append(Role::User, "after swap").await.unwrap();
        let records = timeout(TICK, rx_new.recv()).await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        // The old task was aborted; at most the snapshot delivered before
        // the swap is still buffered.
        tokio::time::sleep(Duration::from_millis(50)).await;
        while let Ok(records) = rx_old.try_recv() {
            assert!(records.is_empty());
        }
    }

    #[tokio::test]
    async fn write_between_subscribe_and_first_snapshot_is_not_lost() {
        let (_, log, mut feed, mut rx, tx) = setup();
        feed.subscribe(ConversationKey::default_chat("u1"), move |records| {
            let _ = tx.send(records);
        });
        log.append(Role::User, "racing").await.unwrap();

        // Either the initial snapshot already contains the write or the
        // change signal forces a second snapshot that does.
        let mut latest = timeout(TICK, rx.recv()).await.unwrap().unwrap();
        if latest.is_empty() {
            latest = timeout(TICK, rx.recv()).await.unwrap().unwrap();
        }
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].content, "racing");
    }
}
