// File: chatdesk-common/src/traits/store_traits.rs

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::Error;
use crate::models::store::{Collection, Document, Fields, Query, WriteBatch};

/// Cancellation for one live query. Cloneable so the store can keep a copy
/// to prune dead watchers; `cancel` is idempotent.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// A receiver that wakes when `cancel` fires, for select loops.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One open live query: the store pushes the full current result set on
/// registration and again after every commit that touches the collection.
pub struct StoreWatch {
    pub rx: mpsc::UnboundedReceiver<Vec<Document>>,
    pub cancel: CancelHandle,
}

/// The realtime document database boundary. The hosted backend provides
/// persistence, fan-out, and atomic multi-document commits; everything above
/// this trait is view-model glue.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-shot read of everything matching the query.
    async fn get_all(&self, query: &Query) -> Result<Vec<Document>, Error>;

    /// Open a live query. Deliveries are full result sets, never deltas, and
    /// carry no global cross-document ordering guarantee.
    async fn watch(&self, query: &Query) -> Result<StoreWatch, Error>;

    /// Merge fields into a single existing document. Update-only: a missing
    /// document is `Error::NotFound`, not an upsert.
    async fn update(&self, collection: &Collection, doc_id: &str, fields: Fields)
        -> Result<(), Error>;

    /// Apply an atomic batch: every op commits together or none do.
    async fn commit(&self, batch: WriteBatch) -> Result<(), Error>;
}
