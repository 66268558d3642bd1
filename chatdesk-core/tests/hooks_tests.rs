// tests/hooks_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use tokio::time::{Duration, sleep};

use chatdesk_common::Error;
use chatdesk_common::models::chat::SessionStatus;
use chatdesk_common::models::store::{Collection, Document, Fields, Query, WriteBatch};
use chatdesk_common::traits::{DocumentStore, StoreWatch};
use chatdesk_core::hooks::{MessageThreadView, SessionListView, TypingView};
use chatdesk_core::{ChatConfig, ChatService, MemoryStore};

// ---------- A store whose mutations always fail ----------
struct ReadOnlyStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn get_all(&self, query: &Query) -> Result<Vec<Document>, Error> {
        self.inner.get_all(query).await
    }
    async fn watch(&self, query: &Query) -> Result<StoreWatch, Error> {
        self.inner.watch(query).await
    }
    async fn update(
        &self,
        _collection: &Collection,
        _doc_id: &str,
        _fields: Fields,
    ) -> Result<(), Error> {
        Err(Error::Store("permission denied".to_string()))
    }
    async fn commit(&self, _batch: WriteBatch) -> Result<(), Error> {
        Err(Error::Store("permission denied".to_string()))
    }
}

fn service(store: Arc<dyn DocumentStore>) -> Arc<ChatService> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Arc::new(ChatService::new(store, ChatConfig::default()))
}

/// Poll until `check` passes or the deadline runs out.
async fn wait_until<F: Fn() -> bool>(check: F, what: &str) {
    for _ in 0..100 {
        if check() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

#[tokio::test]
async fn session_list_leaves_loading_after_first_delivery() {
    let store = Arc::new(MemoryStore::new());
    store
        .commit(WriteBatch::new().set(Collection::Sessions, "s1", vec![(
            "status".to_string(),
            "open".into(),
        )]))
        .await
        .unwrap();

    let view = SessionListView::open(service(store.clone())).await;
    wait_until(|| !view.snapshot().loading, "session list delivery").await;

    let snap = view.snapshot();
    assert_eq!(snap.sessions.len(), 1);
    assert_eq!(snap.sessions[0].status, SessionStatus::Active);
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn session_list_mutation_failures_stay_local() {
    let store = Arc::new(ReadOnlyStore {
        inner: MemoryStore::new(),
    });
    let view = SessionListView::open(service(store)).await;
    wait_until(|| !view.snapshot().loading, "session list delivery").await;

    // Neither call may panic or propagate; both surface as local errors.
    view.update_status("s1", SessionStatus::Closed).await;
    assert_eq!(
        view.snapshot().error.as_deref(),
        Some("Failed to update session status")
    );

    view.mark_as_read("s1").await;
    assert_eq!(
        view.snapshot().error.as_deref(),
        Some("Failed to mark messages as read")
    );
}

#[tokio::test]
async fn closed_session_list_stops_tracking_the_store() {
    let store = Arc::new(MemoryStore::new());
    let view = SessionListView::open(service(store.clone())).await;
    wait_until(|| !view.snapshot().loading, "session list delivery").await;

    view.close();
    // Closing twice is fine.
    view.close();

    store
        .commit(WriteBatch::new().set(Collection::Sessions, "s1", vec![(
            "status".to_string(),
            "open".into(),
        )]))
        .await
        .unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(view.snapshot().sessions.is_empty());
}

#[tokio::test]
async fn message_thread_without_session_opens_nothing() {
    let store = Arc::new(MemoryStore::new());
    let view = MessageThreadView::open(service(store.clone()), None).await;

    let snap = view.snapshot();
    assert!(snap.messages.is_empty());
    assert!(!snap.loading);

    // Sending with no session selected is a silent no-op; nothing is
    // committed anywhere.
    view.send_message("hello").await.unwrap();
    let sessions = store
        .get_all(&Query::collection(Collection::Sessions))
        .await
        .unwrap();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn message_thread_send_trims_and_skips_empty_input() {
    let store = Arc::new(MemoryStore::new());
    store
        .commit(WriteBatch::new().set(Collection::Sessions, "s1", vec![(
            "status".to_string(),
            "waiting".into(),
        )]))
        .await
        .unwrap();

    let view = MessageThreadView::open(service(store.clone()), Some("s1")).await;
    wait_until(|| !view.snapshot().loading, "message delivery").await;

    // Whitespace-only input never reaches the store.
    view.send_message("   ").await.unwrap();
    let msgs = store
        .get_all(&Query::collection(Collection::Messages {
            session_id: "s1".to_string(),
        }))
        .await
        .unwrap();
    assert!(msgs.is_empty());

    view.send_message_as("  hello  ", "admin-007").await.unwrap();
    wait_until(|| view.snapshot().messages.len() == 1, "sent message").await;

    let snap = view.snapshot();
    assert_eq!(snap.messages[0].text, "hello");
    assert_eq!(snap.messages[0].session_id, "s1");
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn message_thread_send_failure_sets_error_and_returns_it() {
    let store = Arc::new(ReadOnlyStore {
        inner: MemoryStore::new(),
    });
    let view = MessageThreadView::open(service(store), Some("s1")).await;
    wait_until(|| !view.snapshot().loading, "message delivery").await;

    let res = view.send_message("hello").await;
    assert!(res.is_err(), "caller needs the failure to restore input");
    assert_eq!(
        view.snapshot().error.as_deref(),
        Some("Failed to send message")
    );
}

#[tokio::test]
async fn typing_lookup_applies_the_staleness_window() {
    let store = Arc::new(MemoryStore::new());
    let stamp = Utc::now();
    store
        .commit(WriteBatch::new().set(Collection::Typing, "s1_u1", vec![
            ("sessionId".to_string(), "s1".into()),
            ("userId".to_string(), "u1".into()),
            ("isTyping".to_string(), true.into()),
            (
                "timestamp".to_string(),
                stamp
                    .to_rfc3339_opts(SecondsFormat::Micros, true)
                    .into(),
            ),
        ]))
        .await
        .unwrap();

    let view = TypingView::open(service(store.clone())).await;
    wait_until(|| !view.indicators().is_empty(), "typing delivery").await;

    // Round-tripping through RFC 3339 keeps microsecond precision, so
    // compare against the indicator's own timestamp.
    let t = view.indicators()[0].timestamp;
    assert!(view.is_user_typing_at("s1", "u1", t + ChronoDuration::milliseconds(9_999)));
    assert!(!view.is_user_typing_at("s1", "u1", t + ChronoDuration::milliseconds(10_000)));

    // Wrong pair never matches.
    assert!(!view.is_user_typing_at("s1", "u2", t));
    assert!(!view.is_user_typing_at("s2", "u1", t));
}
