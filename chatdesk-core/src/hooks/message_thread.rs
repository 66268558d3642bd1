// File: chatdesk-core/src/hooks/message_thread.rs

use std::sync::Arc;
use parking_lot::RwLock;
use tracing::error;

use chatdesk_common::Error;
use chatdesk_common::models::chat::Message;
use chatdesk_common::traits::CancelHandle;

use crate::services::chat_service::ChatService;

#[derive(Debug, Clone, Default)]
pub struct MessageThreadState {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Backs the open conversation pane. With no session selected it exposes an
/// empty, non-loading thread and opens no subscription at all.
pub struct MessageThreadView {
    chat: Arc<ChatService>,
    session_id: Option<String>,
    state: Arc<RwLock<MessageThreadState>>,
    cancel: Option<CancelHandle>,
}

impl MessageThreadView {
    pub async fn open(chat: Arc<ChatService>, session_id: Option<&str>) -> Self {
        let Some(session_id) = session_id else {
            return Self {
                chat,
                session_id: None,
                state: Arc::new(RwLock::new(MessageThreadState::default())),
                cancel: None,
            };
        };

        let state = Arc::new(RwLock::new(MessageThreadState {
            messages: Vec::new(),
            loading: true,
            error: None,
        }));

        let mut feed = chat.subscribe_to_messages(session_id).await;
        let cancel = feed.cancel_handle();

        let task_state = state.clone();
        tokio::spawn(async move {
            while let Some(messages) = feed.recv().await {
                let mut st = task_state.write();
                st.messages = messages;
                st.loading = false;
            }
        });

        Self {
            chat,
            session_id: Some(session_id.to_string()),
            state,
            cancel: Some(cancel),
        }
    }

    pub fn snapshot(&self) -> MessageThreadState {
        self.state.read().clone()
    }

    /// Reply as the configured default admin.
    pub async fn send_message(&self, text: &str) -> Result<(), Error> {
        let admin_id = self.chat.config().default_admin_id.clone();
        self.send_message_as(text, &admin_id).await
    }

    /// Trims input and silently skips empty text or an absent session.
    /// Adapter failures set the local error and are returned to the caller
    /// so the composer can restore the input.
    pub async fn send_message_as(&self, text: &str, admin_id: &str) -> Result<(), Error> {
        let Some(session_id) = &self.session_id else {
            return Ok(());
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let text = clamp(text, self.chat.config().max_message_length);

        match self.chat.send_admin_message(session_id, text, admin_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Error sending message: {:?}", e);
                self.state.write().error = Some("Failed to send message".to_string());
                Err(e)
            }
        }
    }

    pub fn close(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }
}

impl Drop for MessageThreadView {
    fn drop(&mut self) {
        self.close();
    }
}

/// Truncate on a char boundary without allocating.
fn clamp(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
