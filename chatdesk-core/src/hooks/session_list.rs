// File: chatdesk-core/src/hooks/session_list.rs

use std::sync::Arc;
use parking_lot::RwLock;
use tracing::error;

use chatdesk_common::models::chat::{ChatSession, SessionStatus};
use chatdesk_common::traits::CancelHandle;

use crate::services::chat_service::ChatService;

#[derive(Debug, Clone, Default)]
pub struct SessionListState {
    pub sessions: Vec<ChatSession>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Backs the conversation list panel: a live session set plus local
/// loading/error flags. Mutation failures land in `error` and the log,
/// never in the presentation layer.
pub struct SessionListView {
    chat: Arc<ChatService>,
    state: Arc<RwLock<SessionListState>>,
    cancel: CancelHandle,
}

impl SessionListView {
    pub async fn open(chat: Arc<ChatService>) -> Self {
        let state = Arc::new(RwLock::new(SessionListState {
            sessions: Vec::new(),
            loading: true,
            error: None,
        }));

        let mut feed = chat.subscribe_to_sessions().await;
        let cancel = feed.cancel_handle();

        let task_state = state.clone();
        tokio::spawn(async move {
            while let Some(sessions) = feed.recv().await {
                let mut st = task_state.write();
                st.sessions = sessions;
                st.loading = false;
            }
        });

        Self { chat, state, cancel }
    }

    pub fn snapshot(&self) -> SessionListState {
        self.state.read().clone()
    }

    pub async fn update_status(&self, session_id: &str, status: SessionStatus) {
        if let Err(e) = self.chat.update_session_status(session_id, status).await {
            error!("Error updating session status: {:?}", e);
            self.state.write().error = Some("Failed to update session status".to_string());
        }
    }

    pub async fn mark_as_read(&self, session_id: &str) {
        if let Err(e) = self.chat.mark_messages_as_read(session_id).await {
            error!("Error marking messages as read: {:?}", e);
            self.state.write().error = Some("Failed to mark messages as read".to_string());
        }
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SessionListView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
