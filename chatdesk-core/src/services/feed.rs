// File: chatdesk-core/src/services/feed.rs

use tokio::sync::{mpsc, watch};

use chatdesk_common::models::store::Document;
use chatdesk_common::traits::{CancelHandle, StoreWatch};

type MapFn<T> = Box<dyn Fn(Vec<Document>) -> T + Send + Sync>;

/// One live subscription as handed to the view layer: raw store deliveries
/// mapped into domain values, with an explicit, idempotent teardown.
///
/// `recv` returns `None` once the feed is unsubscribed, even if deliveries
/// are still queued behind the cancellation.
pub struct LiveFeed<T> {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
    cancel: CancelHandle,
    cancel_rx: watch::Receiver<bool>,
    map: MapFn<T>,
}

impl<T> LiveFeed<T> {
    pub(crate) fn new(watch: StoreWatch, map: MapFn<T>) -> Self {
        let cancel_rx = watch.cancel.watch();
        Self {
            rx: watch.rx,
            cancel: watch.cancel,
            cancel_rx,
            map,
        }
    }

    /// Feed used when opening the live query failed: delivers the mapping of
    /// an empty result set exactly once, then ends. Dependent views leave
    /// their loading state instead of hanging.
    pub(crate) fn empty(map: MapFn<T>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Vec::new());
        let cancel = CancelHandle::new();
        let cancel_rx = cancel.watch();
        Self {
            rx,
            cancel,
            cancel_rx,
            map,
        }
    }

    /// Next delivery, or `None` when the feed ended or was unsubscribed.
    pub async fn recv(&mut self) -> Option<T> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let Self {
            rx,
            cancel_rx,
            map,
            ..
        } = self;
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => None,
            docs = rx.recv() => docs.map(|d| (map)(d)),
        }
    }

    /// Stop all further deliveries. Safe to call any number of times, from
    /// any holder of the handle.
    pub fn unsubscribe(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_feed_delivers_once_then_ends() {
        let mut feed: LiveFeed<usize> = LiveFeed::empty(Box::new(|docs| docs.len()));
        assert_eq!(feed.recv().await, Some(0));
        assert_eq!(feed.recv().await, None);
    }

    #[tokio::test]
    async fn recv_returns_none_after_unsubscribe() {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelHandle::new();
        let mut feed: LiveFeed<usize> = LiveFeed::new(
            StoreWatch { rx, cancel },
            Box::new(|docs| docs.len()),
        );

        // A queued delivery must not surface once the feed is unsubscribed.
        let _ = tx.send(Vec::new());
        feed.unsubscribe();
        feed.unsubscribe();
        assert_eq!(feed.recv().await, None);
    }
}
