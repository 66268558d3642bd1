// File: chatdesk-core/src/config.rs

use serde::Deserialize;

/// Console behavior knobs. Everything has a default so an empty config
/// deserializes to the stock dashboard behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Time in ms after which a typing indicator disappears.
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: i64,

    /// Admin id stamped on replies when the caller does not pass one.
    #[serde(default = "default_admin_id")]
    pub default_admin_id: String,

    /// Maximum characters per outgoing message; longer input is truncated
    /// at the view boundary before it reaches the store.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

fn default_typing_timeout_ms() -> i64 {
    10_000
}

fn default_admin_id() -> String {
    "admin-001".to_string()
}

fn default_max_message_length() -> usize {
    1_000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_timeout_ms: default_typing_timeout_ms(),
            default_admin_id: default_admin_id(),
            max_message_length: default_max_message_length(),
        }
    }
}
