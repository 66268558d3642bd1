// File: chatdesk-core/src/lib.rs

pub mod config;
pub mod hooks;
pub mod services;
pub mod store;

pub use chatdesk_common::Error;
pub use config::ChatConfig;
pub use services::chat_service::ChatService;
pub use store::memory::MemoryStore;
