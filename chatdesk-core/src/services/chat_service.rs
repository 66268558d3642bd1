// File: chatdesk-core/src/services/chat_service.rs
//
// The sync adapter: converts raw store documents into domain entities on the
// way in, and issues mutations as atomic multi-document writes on the way
// out. Constructed once at startup and shared by `Arc`; every view gets the
// same instance injected instead of importing a global.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use chatdesk_common::Error;
use chatdesk_common::models::chat::{
    ChatSession, Message, MessageSender, SessionStats, SessionStatus, TypingIndicator,
};
use chatdesk_common::models::store::{Collection, Document, FieldValue, Query, WriteBatch};
use chatdesk_common::traits::DocumentStore;

use crate::config::ChatConfig;
use crate::services::feed::LiveFeed;
use crate::services::schema::{defaults, fields, typing_doc_id};

pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>, config: ChatConfig) -> Self {
        debug!("ChatService::new() called");
        Self { store, config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Live query over every conversation. Each delivery is the full current
    /// session set mapped to domain entities. If the store rejects the
    /// subscription, the feed still delivers one empty list so dependent
    /// views never hang in a loading state.
    pub async fn subscribe_to_sessions(&self) -> LiveFeed<Vec<ChatSession>> {
        let query = Query::collection(Collection::Sessions);
        debug!("subscribing to sessions on '{}'", query.collection.path());

        match self.store.watch(&query).await {
            Ok(watch) => LiveFeed::new(watch, Box::new(map_sessions)),
            Err(e) => {
                error!("error subscribing to sessions: {e}");
                LiveFeed::empty(Box::new(map_sessions))
            }
        }
    }

    /// Live query over one session's message thread, oldest first.
    pub async fn subscribe_to_messages(&self, session_id: &str) -> LiveFeed<Vec<Message>> {
        let query = Query::collection(Collection::Messages {
            session_id: session_id.to_string(),
        })
        .order_by_asc(fields::TIMESTAMP);
        debug!("subscribing to messages for session '{}'", session_id);

        let session_id = session_id.to_string();
        let map = Box::new(move |docs: Vec<Document>| map_messages(docs, &session_id));
        match self.store.watch(&query).await {
            Ok(watch) => LiveFeed::new(watch, map),
            Err(e) => {
                error!("error subscribing to messages: {e}");
                LiveFeed::empty(map)
            }
        }
    }

    /// Live query over indicators currently flagged as typing. Staleness is
    /// applied at lookup time by the view, not here.
    pub async fn subscribe_to_typing(&self) -> LiveFeed<Vec<TypingIndicator>> {
        let query = Query::collection(Collection::Typing).where_eq(fields::IS_TYPING, true);
        match self.store.watch(&query).await {
            Ok(watch) => LiveFeed::new(watch, Box::new(map_typing)),
            Err(e) => {
                error!("error subscribing to typing indicators: {e}");
                LiveFeed::empty(Box::new(map_typing))
            }
        }
    }

    /// Console reply: one atomic batch inserts the message into the
    /// session's sub-collection and refreshes the parent session's
    /// `lastMessage`, status, and update timestamp. Both land together or
    /// not at all. Callers trim and guard against empty input; the adapter
    /// only normalizes whitespace.
    pub async fn send_admin_message(
        &self,
        session_id: &str,
        text: &str,
        admin_id: &str,
    ) -> Result<(), Error> {
        let text = text.trim();
        debug!("sending admin message to session '{}'", session_id);

        let batch = WriteBatch::new()
            .insert(
                Collection::Messages {
                    session_id: session_id.to_string(),
                },
                vec![
                    (fields::SENDER.to_string(), defaults::SENDER_ADMIN.into()),
                    (fields::TEXT.to_string(), text.into()),
                    (fields::TIMESTAMP.to_string(), FieldValue::ServerTimestamp),
                    (fields::ADMIN_ID.to_string(), admin_id.into()),
                    (fields::IS_READ.to_string(), false.into()),
                ],
            )
            .update(
                Collection::Sessions,
                session_id,
                vec![
                    (fields::LAST_MESSAGE.to_string(), text.into()),
                    (
                        fields::STATUS.to_string(),
                        SessionStatus::Active.to_persisted().into(),
                    ),
                    (fields::UPDATED_AT.to_string(), FieldValue::ServerTimestamp),
                ],
            );

        self.store.commit(batch).await
    }

    /// Start a new conversation the same way the widget backend does.
    /// Returns the new session id.
    pub async fn create_session(
        &self,
        user_email: Option<&str>,
        user_name: Option<&str>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<String, Error> {
        let session_id = Uuid::new_v4().to_string();
        let mut doc = vec![
            (fields::CREATED_AT.to_string(), FieldValue::ServerTimestamp),
            (fields::LAST_MESSAGE.to_string(), "".into()),
            (
                fields::STATUS.to_string(),
                SessionStatus::Active.to_persisted().into(),
            ),
            (
                fields::USER_NAME.to_string(),
                user_name.unwrap_or(defaults::USER_NAME).into(),
            ),
            (
                fields::UNREAD_COUNT.to_string(),
                FieldValue::Value(Value::from(0u32)),
            ),
            (
                fields::METADATA.to_string(),
                FieldValue::Value(Value::Object(metadata.unwrap_or_default())),
            ),
        ];
        if let Some(email) = user_email {
            doc.push((fields::USER_EMAIL.to_string(), email.into()));
        }

        let batch = WriteBatch::new().set(Collection::Sessions, session_id.clone(), doc);
        self.store.commit(batch).await?;
        debug!("created session '{}'", session_id);
        Ok(session_id)
    }

    /// Writes the persisted status vocabulary (`active` becomes `open`) and
    /// bumps the session's update timestamp. Setting the same status twice
    /// is a safe no-op.
    pub async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<(), Error> {
        self.store
            .update(
                &Collection::Sessions,
                session_id,
                vec![
                    (fields::STATUS.to_string(), status.to_persisted().into()),
                    (fields::UPDATED_AT.to_string(), FieldValue::ServerTimestamp),
                ],
            )
            .await
    }

    /// Flips every unread non-admin message in the session to read and
    /// resets the session's unread counter, atomically. With nothing to
    /// flip this succeeds without committing anything, so it is idempotent
    /// and safe to race.
    pub async fn mark_messages_as_read(&self, session_id: &str) -> Result<(), Error> {
        debug!("marking messages as read for session '{}'", session_id);

        let unread = self
            .store
            .get_all(
                &Query::collection(Collection::Messages {
                    session_id: session_id.to_string(),
                })
                .where_eq(fields::IS_READ, false)
                .where_ne(fields::SENDER, defaults::SENDER_ADMIN),
            )
            .await?;

        if unread.is_empty() {
            debug!("no unread messages in session '{}'", session_id);
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        for doc in &unread {
            batch = batch.update(
                Collection::Messages {
                    session_id: session_id.to_string(),
                },
                doc.id.clone(),
                vec![(fields::IS_READ.to_string(), true.into())],
            );
        }
        batch = batch.update(
            Collection::Sessions,
            session_id,
            vec![(
                fields::UNREAD_COUNT.to_string(),
                FieldValue::Value(Value::from(0u32)),
            )],
        );

        self.store.commit(batch).await
    }

    /// Refreshes the typing state for a `(session, user)` pair. A `true`
    /// write carries the full tuple plus a fresh server timestamp; a `false`
    /// write only clears the flag. Update-only on purpose: the indicator
    /// document is created by the widget side, and a pair that has never
    /// typed surfaces `NotFound` here.
    pub async fn update_typing_indicator(
        &self,
        session_id: &str,
        user_id: &str,
        is_typing: bool,
    ) -> Result<(), Error> {
        let doc_id = typing_doc_id(session_id, user_id);
        let doc_fields = if is_typing {
            vec![
                (fields::SESSION_ID.to_string(), session_id.into()),
                (fields::USER_ID.to_string(), user_id.into()),
                (fields::IS_TYPING.to_string(), true.into()),
                (fields::TIMESTAMP.to_string(), FieldValue::ServerTimestamp),
            ]
        } else {
            vec![(fields::IS_TYPING.to_string(), false.into())]
        };
        self.store
            .update(&Collection::Typing, &doc_id, doc_fields)
            .await
    }

    /// One-shot tally for the dashboard header, over the exposed status
    /// vocabulary.
    pub async fn get_session_stats(&self) -> Result<SessionStats, Error> {
        let docs = self
            .store
            .get_all(&Query::collection(Collection::Sessions))
            .await?;

        let mut stats = SessionStats {
            total: docs.len(),
            ..Default::default()
        };
        for doc in &docs {
            match SessionStatus::from_persisted(doc.get_str(fields::STATUS)) {
                SessionStatus::Active => stats.active += 1,
                SessionStatus::Waiting => stats.waiting += 1,
                SessionStatus::Closed => stats.closed += 1,
            }
        }
        Ok(stats)
    }
}

fn map_sessions(docs: Vec<Document>) -> Vec<ChatSession> {
    docs.iter().map(map_session).collect()
}

fn map_session(doc: &Document) -> ChatSession {
    let last_activity = doc
        .get_timestamp(fields::UPDATED_AT)
        .or_else(|| doc.get_timestamp(fields::CREATED_AT))
        .unwrap_or_else(Utc::now);

    // The backing schema only keeps the last message as a raw string; the
    // sender is not tracked, so it reads as `user` even when the true last
    // message came from an admin or bot.
    let last_message = doc
        .get_str(fields::LAST_MESSAGE)
        .filter(|text| !text.is_empty())
        .map(|text| Message {
            id: defaults::LAST_MESSAGE_ID.to_string(),
            text: text.to_string(),
            timestamp: last_activity,
            sender: MessageSender::User,
            is_read: false,
            session_id: doc.id.clone(),
        });

    ChatSession {
        id: doc.id.clone(),
        // The document id doubles as the user id in the widget's schema.
        user_id: doc.id.clone(),
        user_name: Some(
            doc.get_str(fields::USER_NAME)
                .filter(|name| !name.is_empty())
                .unwrap_or(defaults::USER_NAME)
                .to_string(),
        ),
        user_email: doc.get_str(fields::USER_EMAIL).map(str::to_string),
        user_avatar: doc.get_str(fields::USER_AVATAR).map(str::to_string),
        last_activity,
        unread_count: doc.get_u64(fields::UNREAD_COUNT).unwrap_or(0) as u32,
        status: SessionStatus::from_persisted(doc.get_str(fields::STATUS)),
        metadata: doc
            .data
            .get(fields::METADATA)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        last_message,
    }
}

fn map_messages(docs: Vec<Document>, session_id: &str) -> Vec<Message> {
    docs.iter()
        .map(|doc| Message {
            id: doc.id.clone(),
            text: doc.get_str(fields::TEXT).unwrap_or_default().to_string(),
            sender: doc
                .get_str(fields::SENDER)
                .map(|s| MessageSender::from(s.to_string()))
                .unwrap_or(MessageSender::User),
            // A missing timestamp is the optimistic-local-write window; the
            // server stamp arrives with the next delivery.
            timestamp: doc.get_timestamp(fields::TIMESTAMP).unwrap_or_else(Utc::now),
            is_read: doc.get_bool(fields::IS_READ).unwrap_or(false),
            session_id: session_id.to_string(),
        })
        .collect()
}

fn map_typing(docs: Vec<Document>) -> Vec<TypingIndicator> {
    docs.iter()
        .map(|doc| TypingIndicator {
            session_id: doc
                .get_str(fields::SESSION_ID)
                .unwrap_or_default()
                .to_string(),
            user_id: doc.get_str(fields::USER_ID).unwrap_or_default().to_string(),
            is_typing: doc.get_bool(fields::IS_TYPING).unwrap_or(false),
            timestamp: doc.get_timestamp(fields::TIMESTAMP).unwrap_or_else(Utc::now),
        })
        .collect()
}
