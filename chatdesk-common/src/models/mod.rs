// File: chatdesk-common/src/models/mod.rs
pub mod chat;
pub mod store;

pub use chat::{
    ChatFilter, ChatSession, DateRange, Message, MessageSender, SessionStats, SessionStatus,
    StatusFilter, TypingIndicator,
};
pub use store::{
    Collection, Document, FieldFilter, FieldValue, Query, SortDirection, WriteBatch, WriteOp,
};
