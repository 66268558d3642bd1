// File: chatdesk-core/src/hooks/mod.rs
//
// Thin view-model state holders over the chat service's live feeds. Each
// view owns one forwarding task; dropping the view (or calling `close`)
// cancels the underlying subscription.

pub mod message_thread;
pub mod session_list;
pub mod typing;

pub use message_thread::{MessageThreadState, MessageThreadView};
pub use session_list::{SessionListState, SessionListView};
pub use typing::TypingView;
