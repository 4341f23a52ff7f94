//! The identity of whoever is looking at the synchronized data.

/// The currently authenticated caller, if any.
///
/// Only used to derive ownership of messages and to attribute new ones;
/// never persisted by the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewerContext {
    user_id: Option<String>,
}

impl ViewerContext {
    /// A signed-in viewer
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A viewer without a session
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// The resolvable user id; an empty id counts as none
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Whether the viewer has a resolvable user id
    pub fn is_signed_in(&self) -> bool {
        self.user_id().is_some()
    }

    /// Whether a record written by `author_id` belongs to this viewer
    pub fn owns(&self, author_id: &str) -> bool {
        self.user_id() == Some(author_id)
    }
}
