//! Record - the stored shapes of rooms, messages and profiles.
//!
//! Field names are fixed: every client sharing a store reads and writes
//! the same documents.

use parley_store::{Document, DocumentId, Fields, StoreResult, to_fields};
use serde::{Deserialize, Serialize};

/// Document field names
pub mod fields {
    /// Room creation time (milliseconds)
    pub const CREATED_AT: &str = "createdAt";
    /// Message body
    pub const MESSAGE: &str = "message";
    /// Author user id
    pub const SENT_BY: &str = "sent_by";
    /// Author display name at send time
    pub const SENT_BY_NAME: &str = "sent_by_name";
    /// Send time (milliseconds); the message log is ordered on it
    pub const SENT_ON: &str = "sent_on";
    /// Profile display name
    pub const USERNAME: &str = "username";
}

/// Fields of a room document. The room name is the document id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// When the room document was (last) written, in milliseconds
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl RoomRecord {
    /// Encode as document fields
    pub fn to_fields(&self) -> StoreResult<Fields> {
        to_fields(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageFields {
    #[serde(rename = "message")]
    body: String,
    #[serde(rename = "sent_by")]
    author_id: String,
    #[serde(rename = "sent_by_name", default)]
    author_name: String,
    #[serde(rename = "sent_on")]
    sent_at: i64,
}

/// A message as held in the synchronized log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Store-assigned identifier
    pub id: DocumentId,
    /// Message text
    pub body: String,
    /// User id of the author
    pub author_id: String,
    /// Display name of the author when the message was sent
    pub author_name: String,
    /// When the message was sent (Unix timestamp in milliseconds)
    pub sent_at: i64,
}

impl StoredMessage {
    /// Decode a message document
    pub fn from_document(doc: &Document) -> StoreResult<Self> {
        let fields = doc.decode::<MessageFields>()?;
        Ok(Self {
            id: doc.id.clone(),
            body: fields.body,
            author_id: fields.author_id,
            author_name: fields.author_name,
            sent_at: fields.sent_at,
        })
    }
}

/// A message about to be written. The store assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Message text
    pub body: String,
    /// User id of the author
    pub author_id: String,
    /// Resolved display name of the author
    pub author_name: String,
    /// Send time (Unix timestamp in milliseconds)
    pub sent_at: i64,
}

impl NewMessage {
    /// Encode as document fields
    pub fn to_fields(&self) -> StoreResult<Fields> {
        to_fields(&MessageFields {
            body: self.body.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            sent_at: self.sent_at,
        })
    }
}

/// Fields of a user profile document. The user id is the document id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Display name
    pub username: String,
}

impl ProfileRecord {
    /// Encode as document fields
    pub fn to_fields(&self) -> StoreResult<Fields> {
        to_fields(self)
    }
}
