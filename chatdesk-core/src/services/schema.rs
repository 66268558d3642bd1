// File: chatdesk-core/src/services/schema.rs
//
// Compatibility table for the externally-owned document schema. The widget
// backend writes these shapes; field names and fallback literals live here
// so schema drift stays a one-file change.

/// Raw field names as persisted.
pub mod fields {
    pub const USER_NAME: &str = "userName";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_AVATAR: &str = "userAvatar";
    pub const STATUS: &str = "status";
    pub const LAST_MESSAGE: &str = "lastMessage";
    pub const UNREAD_COUNT: &str = "unreadCount";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const METADATA: &str = "metadata";

    pub const TEXT: &str = "text";
    pub const SENDER: &str = "sender";
    pub const TIMESTAMP: &str = "timestamp";
    pub const IS_READ: &str = "isRead";
    pub const ADMIN_ID: &str = "adminId";

    pub const SESSION_ID: &str = "sessionId";
    pub const USER_ID: &str = "userId";
    pub const IS_TYPING: &str = "isTyping";
}

/// Fallbacks applied when the external writer left a field out.
pub mod defaults {
    /// Shown for sessions the widget created without a name.
    pub const USER_NAME: &str = "Anonymous User";

    /// Placeholder id for the message synthesized from a session's raw
    /// `lastMessage` string.
    pub const LAST_MESSAGE_ID: &str = "last-msg";

    /// Persisted sender value for console replies.
    pub const SENDER_ADMIN: &str = "admin";
}

/// Typing indicator documents are keyed by the `(session, user)` pair.
pub fn typing_doc_id(session_id: &str, user_id: &str) -> String {
    format!("{}_{}", session_id, user_id)
}
