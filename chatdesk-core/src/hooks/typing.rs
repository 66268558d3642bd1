// File: chatdesk-core/src/hooks/typing.rs

use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use chatdesk_common::models::chat::TypingIndicator;
use chatdesk_common::traits::CancelHandle;

use crate::services::chat_service::ChatService;

/// Holds the current typing indicator set and answers "is this user typing
/// right now" as a pure lookup with the staleness window applied.
pub struct TypingView {
    indicators: Arc<RwLock<Vec<TypingIndicator>>>,
    timeout_ms: i64,
    cancel: CancelHandle,
}

impl TypingView {
    pub async fn open(chat: Arc<ChatService>) -> Self {
        let indicators = Arc::new(RwLock::new(Vec::new()));
        let timeout_ms = chat.config().typing_timeout_ms;

        let mut feed = chat.subscribe_to_typing().await;
        let cancel = feed.cancel_handle();

        let task_indicators = indicators.clone();
        tokio::spawn(async move {
            while let Some(current) = feed.recv().await {
                *task_indicators.write() = current;
            }
        });

        Self {
            indicators,
            timeout_ms,
            cancel,
        }
    }

    pub fn indicators(&self) -> Vec<TypingIndicator> {
        self.indicators.read().clone()
    }

    pub fn is_user_typing(&self, session_id: &str, user_id: &str) -> bool {
        self.is_user_typing_at(session_id, user_id, Utc::now())
    }

    /// Time-injectable variant: an indicator counts only while its flag is
    /// set and its timestamp is within the staleness window, regardless of
    /// whether the store has cleared the flag yet.
    pub fn is_user_typing_at(
        &self,
        session_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> bool {
        self.indicators.read().iter().any(|ind| {
            ind.session_id == session_id
                && ind.user_id == user_id
                && ind.is_typing
                && ind.is_fresh(now, self.timeout_ms)
        })
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TypingView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
