// File: chatdesk-core/src/store/mod.rs

pub mod memory;

pub use memory::MemoryStore;
