// File: chatdesk-common/src/models/chat.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who authored a message. The chat widget writes `user` and `bot`;
/// console replies are always `admin`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Admin,
    Bot,
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSender::User => write!(f, "user"),
            MessageSender::Admin => write!(f, "admin"),
            MessageSender::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for MessageSender {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageSender::User),
            "admin" => Ok(MessageSender::Admin),
            "bot" => Ok(MessageSender::Bot),
            _ => Err(format!("Unknown sender: {}", s)),
        }
    }
}

impl From<String> for MessageSender {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(MessageSender::User)
    }
}

/// Session status as exposed to the console UI. The backing schema uses a
/// different, overlapping vocabulary; see `from_persisted` / `to_persisted`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Waiting,
    Closed,
}

impl SessionStatus {
    /// Collapses the persisted vocabulary onto the exposed one. Total over
    /// any input: an unrecognized or absent value reads as `Waiting`. The
    /// external widget backend writes `open` where the console shows `active`.
    pub fn from_persisted(raw: Option<&str>) -> Self {
        match raw {
            Some("open") => SessionStatus::Active,
            Some("waiting") => SessionStatus::Waiting,
            Some("closed") => SessionStatus::Closed,
            _ => SessionStatus::Waiting,
        }
    }

    /// Inverse direction used on writes. Asymmetric with `from_persisted` on
    /// purpose: four read-side cases collapse onto three write-side values.
    pub fn to_persisted(self) -> &'static str {
        match self {
            SessionStatus::Active => "open",
            SessionStatus::Waiting => "waiting",
            SessionStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Waiting => write!(f, "waiting"),
            SessionStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "waiting" => Ok(SessionStatus::Waiting),
            "closed" => Ok(SessionStatus::Closed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// A single chat message. Immutable once created except `is_read`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub sender: MessageSender,
    pub is_read: bool,
    pub session_id: String,
}

/// One customer conversation thread.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
    pub last_message: Option<Message>,
    pub last_activity: DateTime<Utc>,
    pub unread_count: u32,
    pub status: SessionStatus,
    pub metadata: Map<String, Value>,
}

/// Ephemeral typing state for one `(session, user)` pair. Last write wins.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TypingIndicator {
    pub session_id: String,
    pub user_id: String,
    pub is_typing: bool,
    pub timestamp: DateTime<Utc>,
}

impl TypingIndicator {
    /// An indicator goes stale once `now - timestamp >= timeout_ms`, no
    /// matter what the stored flag still says.
    pub fn is_fresh(&self, now: DateTime<Utc>, timeout_ms: i64) -> bool {
        now - self.timestamp < Duration::milliseconds(timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Active,
    Waiting,
    Closed,
    All,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Pure query description used by the session list UI. Never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChatFilter {
    pub status: Option<StatusFilter>,
    pub search_term: Option<String>,
    pub date_range: Option<DateRange>,
}

impl ChatFilter {
    pub fn matches(&self, session: &ChatSession) -> bool {
        match self.status {
            None | Some(StatusFilter::All) => {}
            Some(StatusFilter::Active) if session.status == SessionStatus::Active => {}
            Some(StatusFilter::Waiting) if session.status == SessionStatus::Waiting => {}
            Some(StatusFilter::Closed) if session.status == SessionStatus::Closed => {}
            Some(_) => return false,
        }

        if let Some(term) = &self.search_term {
            let term = term.to_lowercase();
            let name_hit = session
                .user_name
                .as_deref()
                .map(|n| n.to_lowercase().contains(&term))
                .unwrap_or(false);
            let email_hit = session
                .user_email
                .as_deref()
                .map(|e| e.to_lowercase().contains(&term))
                .unwrap_or(false);
            let msg_hit = session
                .last_message
                .as_ref()
                .map(|m| m.text.to_lowercase().contains(&term))
                .unwrap_or(false);
            if !(name_hit || email_hit || msg_hit) {
                return false;
            }
        }

        if let Some(range) = &self.date_range {
            if session.last_activity < range.start || session.last_activity > range.end {
                return false;
            }
        }

        true
    }
}

/// Dashboard summary counts, tallied over the exposed status vocabulary.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, Eq, PartialEq)]
pub struct SessionStats {
    pub total: usize,
    pub active: usize,
    pub waiting: usize,
    pub closed: usize,
}
