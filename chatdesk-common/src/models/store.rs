// File: chatdesk-common/src/models/store.rs
//
// Value types for the realtime document store boundary. The persisted shapes
// here belong to an external widget backend; this crate only describes them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Persisted collection names. These match what the external widget backend
/// already writes; changing them breaks compatibility with live data.
pub const SESSIONS_COLLECTION: &str = "conversations";
pub const MESSAGES_COLLECTION: &str = "messages";
pub const TYPING_COLLECTION: &str = "typingIndicators";

/// Addressable collections. Messages live in a sub-collection under their
/// parent session.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Collection {
    Sessions,
    Messages { session_id: String },
    Typing,
}

impl Collection {
    /// Slash path of the collection, for logs and diagnostics.
    pub fn path(&self) -> String {
        match self {
            Collection::Sessions => SESSIONS_COLLECTION.to_string(),
            Collection::Messages { session_id } => {
                format!("{}/{}/{}", SESSIONS_COLLECTION, session_id, MESSAGES_COLLECTION)
            }
            Collection::Typing => TYPING_COLLECTION.to_string(),
        }
    }
}

/// One raw document as delivered by the store: id plus an open field map.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.data.get(field).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.data.get(field).and_then(Value::as_u64)
    }

    /// Timestamps are persisted as RFC 3339 strings; anything unparsable
    /// reads as absent.
    pub fn get_timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get_str(field)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A field value in a write. `ServerTimestamp` resolves to a single
/// commit-time clock reading inside the store.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Value(Value),
    ServerTimestamp,
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Value(Value::String(s.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Value(Value::String(s))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Value(Value::Bool(b))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Server-side filters. `Ne` never matches a document missing the field,
/// same as the hosted store.
#[derive(Debug, Clone)]
pub enum FieldFilter {
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
}

/// A live or one-shot query against a single collection.
#[derive(Debug, Clone)]
pub struct Query {
    pub collection: Collection,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<(String, SortDirection)>,
}

impl Query {
    pub fn collection(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn where_ne(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter::Ne {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = Some((field.to_string(), SortDirection::Ascending));
        self
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some((field.to_string(), SortDirection::Descending));
        self
    }
}

pub type Fields = Vec<(String, FieldValue)>;

/// One operation inside an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create a new document with a store-assigned id.
    Insert { collection: Collection, fields: Fields },
    /// Create or replace the document with the given id.
    Set {
        collection: Collection,
        doc_id: String,
        fields: Fields,
    },
    /// Merge fields into an existing document. Fails if it does not exist.
    Update {
        collection: Collection,
        doc_id: String,
        fields: Fields,
    },
}

/// An all-or-nothing multi-document write.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, collection: Collection, fields: Fields) -> Self {
        self.ops.push(WriteOp::Insert { collection, fields });
        self
    }

    pub fn set(mut self, collection: Collection, doc_id: impl Into<String>, fields: Fields) -> Self {
        self.ops.push(WriteOp::Set {
            collection,
            doc_id: doc_id.into(),
            fields,
        });
        self
    }

    pub fn update(
        mut self,
        collection: Collection,
        doc_id: impl Into<String>,
        fields: Fields,
    ) -> Self {
        self.ops.push(WriteOp::Update {
            collection,
            doc_id: doc_id.into(),
            fields,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}
