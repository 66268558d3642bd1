// File: chatdesk-core/src/store/memory.rs
//
// In-process implementation of the realtime document store boundary.
// Watchers get the full current result set on registration and after every
// commit that touches their collection, which is the same contract the
// hosted backend gives the console.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;
use uuid::Uuid;

use chatdesk_common::Error;
use chatdesk_common::models::store::{
    Collection, Document, FieldFilter, FieldValue, Fields, Query, SortDirection, WriteBatch,
    WriteOp,
};
use chatdesk_common::traits::{CancelHandle, DocumentStore, StoreWatch};

type Docs = BTreeMap<String, Map<String, Value>>;

struct Watcher {
    query: Query,
    tx: mpsc::UnboundedSender<Vec<Document>>,
    cancel: CancelHandle,
}

#[derive(Default)]
struct StoreInner {
    sessions: Docs,
    /// Message sub-collections keyed by parent session id.
    messages: HashMap<String, Docs>,
    typing: Docs,
    watchers: Vec<Watcher>,
}

impl StoreInner {
    fn docs(&self, collection: &Collection) -> Vec<Document> {
        let map: Option<&Docs> = match collection {
            Collection::Sessions => Some(&self.sessions),
            Collection::Messages { session_id } => self.messages.get(session_id),
            Collection::Typing => Some(&self.typing),
        };
        map.map(|docs| {
            docs.iter()
                .map(|(id, data)| Document::new(id.clone(), data.clone()))
                .collect()
        })
        .unwrap_or_default()
    }

    fn docs_mut(&mut self, collection: &Collection) -> &mut Docs {
        match collection {
            Collection::Sessions => &mut self.sessions,
            Collection::Messages { session_id } => {
                self.messages.entry(session_id.clone()).or_default()
            }
            Collection::Typing => &mut self.typing,
        }
    }

    fn contains(&self, collection: &Collection, doc_id: &str) -> bool {
        match collection {
            Collection::Sessions => self.sessions.contains_key(doc_id),
            Collection::Messages { session_id } => self
                .messages
                .get(session_id)
                .map(|m| m.contains_key(doc_id))
                .unwrap_or(false),
            Collection::Typing => self.typing.contains_key(doc_id),
        }
    }

    fn eval(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .docs(&query.collection)
            .into_iter()
            .filter(|doc| query.filters.iter().all(|f| filter_matches(f, &doc.data)))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            docs.sort_by(|a, b| {
                let ord = cmp_fields(a.data.get(field), b.data.get(field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        docs
    }

    /// Push fresh result sets to every live watcher whose collection was
    /// touched by a commit. Dead and cancelled watchers are pruned here.
    fn notify(&mut self, touched: &[Collection]) {
        self.watchers
            .retain(|w| !w.cancel.is_cancelled() && !w.tx.is_closed());

        let mut deliveries: Vec<(usize, Vec<Document>)> = Vec::new();
        for (idx, watcher) in self.watchers.iter().enumerate() {
            if touched.contains(&watcher.query.collection) {
                deliveries.push((idx, self.eval(&watcher.query)));
            }
        }
        for (idx, docs) in deliveries {
            let _ = self.watchers[idx].tx.send(docs);
        }
    }
}

fn filter_matches(filter: &FieldFilter, data: &Map<String, Value>) -> bool {
    match filter {
        FieldFilter::Eq { field, value } => data.get(field) == Some(value),
        // A document missing the field never matches `Ne`, same as the
        // hosted store's inequality filter.
        FieldFilter::Ne { field, value } => {
            data.get(field).map(|v| v != value).unwrap_or(false)
        }
    }
}

fn cmp_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => cmp_values(x, y),
    }
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        // RFC 3339 timestamps share a fixed width, so string order is
        // chronological order.
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn resolve_fields(fields: Fields, commit_time: &Value) -> Vec<(String, Value)> {
    fields
        .into_iter()
        .map(|(name, value)| {
            let resolved = match value {
                FieldValue::Value(v) => v,
                FieldValue::ServerTimestamp => commit_time.clone(),
            };
            (name, resolved)
        })
        .collect()
}

/// An embedded realtime store, used as the test backend and for local
/// development without the hosted database.
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self, query: &Query) -> Result<Vec<Document>, Error> {
        let inner = self.inner.lock().await;
        Ok(inner.eval(query))
    }

    async fn watch(&self, query: &Query) -> Result<StoreWatch, Error> {
        let mut inner = self.inner.lock().await;
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelHandle::new();

        // Initial snapshot goes out before the watcher can observe any
        // later commit.
        let _ = tx.send(inner.eval(query));
        debug!("watch opened on '{}'", query.collection.path());

        inner.watchers.push(Watcher {
            query: query.clone(),
            tx,
            cancel: cancel.clone(),
        });
        Ok(StoreWatch { rx, cancel })
    }

    async fn update(
        &self,
        collection: &Collection,
        doc_id: &str,
        fields: Fields,
    ) -> Result<(), Error> {
        let batch = WriteBatch::new().update(collection.clone(), doc_id, fields);
        self.commit(batch).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), Error> {
        if batch.is_empty() {
            return Err(Error::Validation("empty write batch".to_string()));
        }

        let mut inner = self.inner.lock().await;

        // Validate every update target up front so a failing op leaves the
        // whole batch unapplied.
        for op in &batch.ops {
            if let WriteOp::Update {
                collection, doc_id, ..
            } = op
            {
                if !inner.contains(collection, doc_id) {
                    return Err(Error::NotFound(format!(
                        "no document '{}' in '{}'",
                        doc_id,
                        collection.path()
                    )));
                }
            }
        }

        let commit_time = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true));
        let mut touched: Vec<Collection> = Vec::new();

        for op in batch.ops {
            match op {
                WriteOp::Insert { collection, fields } => {
                    let doc_id = Uuid::new_v4().to_string();
                    let resolved = resolve_fields(fields, &commit_time);
                    inner.docs_mut(&collection).insert(doc_id, resolved.into_iter().collect());
                    touched.push(collection);
                }
                WriteOp::Set {
                    collection,
                    doc_id,
                    fields,
                } => {
                    let resolved = resolve_fields(fields, &commit_time);
                    inner
                        .docs_mut(&collection)
                        .insert(doc_id, resolved.into_iter().collect());
                    touched.push(collection);
                }
                WriteOp::Update {
                    collection,
                    doc_id,
                    fields,
                } => {
                    let resolved = resolve_fields(fields, &commit_time);
                    if let Some(existing) = inner.docs_mut(&collection).get_mut(&doc_id) {
                        for (name, value) in resolved {
                            existing.insert(name, value);
                        }
                    }
                    touched.push(collection);
                }
            }
        }

        inner.notify(&touched);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdesk_common::models::store::SESSIONS_COLLECTION;

    fn session_fields(status: &str) -> Fields {
        vec![
            ("status".to_string(), status.into()),
            ("createdAt".to_string(), FieldValue::ServerTimestamp),
        ]
    }

    #[tokio::test]
    async fn set_then_get_all_round_trips() {
        let store = MemoryStore::new();
        store
            .commit(WriteBatch::new().set(Collection::Sessions, "s1", session_fields("open")))
            .await
            .unwrap();

        let docs = store
            .get_all(&Query::collection(Collection::Sessions))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "s1");
        assert_eq!(docs[0].get_str("status"), Some("open"));
        assert!(docs[0].get_timestamp("createdAt").is_some());
    }

    #[tokio::test]
    async fn update_missing_document_fails_whole_batch() {
        let store = MemoryStore::new();
        let batch = WriteBatch::new()
            .insert(
                Collection::Messages {
                    session_id: "s1".to_string(),
                },
                vec![("text".to_string(), "hi".into())],
            )
            .update(Collection::Sessions, "s1", session_fields("open"));

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // The insert must not have landed either.
        let msgs = store
            .get_all(&Query::collection(Collection::Messages {
                session_id: "s1".to_string(),
            }))
            .await
            .unwrap();
        assert!(msgs.is_empty());
    }

    #[tokio::test]
    async fn ne_filter_skips_documents_missing_the_field() {
        let store = MemoryStore::new();
        let coll = Collection::Messages {
            session_id: "s1".to_string(),
        };
        store
            .commit(
                WriteBatch::new()
                    .set(coll.clone(), "m1", vec![("sender".to_string(), "user".into())])
                    .set(coll.clone(), "m2", vec![("sender".to_string(), "admin".into())])
                    .set(coll.clone(), "m3", vec![("text".to_string(), "no sender".into())]),
            )
            .await
            .unwrap();

        let docs = store
            .get_all(&Query::collection(coll).where_ne("sender", "admin"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "m1");
    }

    #[tokio::test]
    async fn order_by_timestamp_ascending() {
        let store = MemoryStore::new();
        let coll = Collection::Messages {
            session_id: "s1".to_string(),
        };
        store
            .commit(
                WriteBatch::new()
                    .set(coll.clone(), "late", vec![(
                        "timestamp".to_string(),
                        "2026-08-26T12:00:01.000000Z".into(),
                    )])
                    .set(coll.clone(), "early", vec![(
                        "timestamp".to_string(),
                        "2026-08-26T12:00:00.000000Z".into(),
                    )]),
            )
            .await
            .unwrap();

        let docs = store
            .get_all(&Query::collection(coll).order_by_asc("timestamp"))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn watch_delivers_initial_snapshot_and_redeliveries() {
        let store = MemoryStore::new();
        let mut watch = store
            .watch(&Query::collection(Collection::Sessions))
            .await
            .unwrap();

        let initial = watch.rx.recv().await.unwrap();
        assert!(initial.is_empty());

        store
            .commit(WriteBatch::new().set(Collection::Sessions, "s1", session_fields("open")))
            .await
            .unwrap();

        let after = watch.rx.recv().await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, "s1");
    }

    #[tokio::test]
    async fn cancelled_watch_sees_nothing_after_cancel() {
        let store = MemoryStore::new();
        let mut watch = store
            .watch(&Query::collection(Collection::Sessions))
            .await
            .unwrap();
        let _ = watch.rx.recv().await.unwrap();

        watch.cancel.cancel();
        // Second cancel must be harmless.
        watch.cancel.cancel();

        store
            .commit(WriteBatch::new().set(Collection::Sessions, "s1", session_fields("open")))
            .await
            .unwrap();

        // The watcher was pruned on notify, so the channel closes without
        // delivering the commit.
        assert!(watch.rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn message_watchers_are_scoped_to_their_session() {
        let store = MemoryStore::new();
        let coll_a = Collection::Messages {
            session_id: "a".to_string(),
        };
        let coll_b = Collection::Messages {
            session_id: "b".to_string(),
        };
        let mut watch_a = store.watch(&Query::collection(coll_a)).await.unwrap();
        let _ = watch_a.rx.recv().await.unwrap();

        store
            .commit(WriteBatch::new().set(coll_b, "m1", vec![("text".to_string(), "hi".into())]))
            .await
            .unwrap();

        // Nothing should be queued for session a's watcher.
        assert!(watch_a.rx.try_recv().is_err());
    }

    #[test]
    fn collection_paths() {
        assert_eq!(Collection::Sessions.path(), SESSIONS_COLLECTION);
        assert_eq!(
            Collection::Messages {
                session_id: "s1".to_string()
            }
            .path(),
            "conversations/s1/messages"
        );
    }
}
