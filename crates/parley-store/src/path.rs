//! Collection and document addressing.
//!
//! Paths alternate collection and document segments, so a collection path
//! always has an odd number of segments (`chatRooms`,
//! `chatRooms/general/messages`) and a document path an even number.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Identifier of a document within its collection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a document id, rejecting empty ids and ids containing `/`
    pub fn new(id: impl Into<String>) -> StoreResult<Self> {
        let id = id.into();
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::invalid_path(id));
        }
        Ok(Self(id))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Path to a collection of documents
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Parse a collection path
    pub fn new(path: impl Into<String>) -> StoreResult<Self> {
        let path = path.into();
        let segments = path.split('/').collect::<Vec<_>>();
        if segments.iter().any(|s| s.is_empty()) || segments.len() % 2 == 0 {
            return Err(StoreError::invalid_path(path));
        }
        Ok(Self(path))
    }

    /// The path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address a document in this collection
    pub fn doc(&self, id: impl Into<String>) -> StoreResult<DocumentPath> {
        Ok(DocumentPath {
            collection: self.clone(),
            id: DocumentId::new(id)?,
        })
    }

    /// Address a subcollection nested under one of this collection's documents
    pub fn subcollection(&self, doc_id: &str, name: &str) -> StoreResult<CollectionPath> {
        let doc = DocumentId::new(doc_id)?;
        CollectionPath::new(format!("{}/{}/{}", self.0, doc, name))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path to a single document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: DocumentId,
}

impl DocumentPath {
    /// Collection the document lives in
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Id of the document
    pub fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
