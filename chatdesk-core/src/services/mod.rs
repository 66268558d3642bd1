// File: chatdesk-core/src/services/mod.rs

pub mod chat_service;
pub mod feed;
pub mod schema;

pub use chat_service::ChatService;
pub use feed::LiveFeed;
