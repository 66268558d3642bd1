// File: chatdesk-common/src/traits/mod.rs
pub mod store_traits;

pub use store_traits::{CancelHandle, DocumentStore, StoreWatch};
