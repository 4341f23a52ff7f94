//! Per-viewer presentation of the message log.

use serde::{Deserialize, Serialize};

use crate::record::StoredMessage;
use crate::viewer::ViewerContext;

/// A message as shown to one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// Store-assigned message id
    pub id: String,
    /// Message text
    pub body: String,
    /// Author user id
    pub author_id: String,
    /// Author display name at send time
    pub author_name: String,
    /// Send time in milliseconds
    pub sent_at: i64,
    /// Whether the viewer wrote this message
    pub is_own_message: bool,
}

impl DisplayMessage {
    fn from_stored(message: &StoredMessage, viewer: &ViewerContext) -> Self {
        Self {
            id: message.id.to_string(),
            body: message.body.clone(),
            author_id: message.author_id.clone(),
            author_name: message.author_name.clone(),
            sent_at: message.sent_at,
            is_own_message: viewer.owns(&message.author_id),
        }
    }
}

/// Project an oldest-first message sequence for `viewer`
///
/// Marks the viewer's own messages and reverses to newest first. Pure: the
/// same inputs always give the same output.
pub fn project(messages: &[StoredMessage], viewer: &ViewerContext) -> Vec<DisplayMessage> {
    messages
        .iter()
        .rev()
        .map(|message| DisplayMessage::from_stored(message, viewer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_store::DocumentId;

    fn stored(id: &str, author: &str, sent_at: i64) -> StoredMessage {
        StoredMessage {
            id: DocumentId::new(id).unwrap(),
            body: format!("body {id}"),
            author_id: author.to_string(),
            author_name: author.to_uppercase(),
            sent_at,
        }
    }

    #[test]
    fn test_newest_first() {
        let log = vec![stored("a", "u1", 1), stored("b", "u2", 2), stored("c", "u1", 3)];
        let shown = project(&log, &ViewerContext::anonymous());
        let times: Vec<i64> = shown.iter().map(|m| m.sent_at).collect();
        assert_eq!(times, vec![3, 2, 1]);
    }

    #[test]
    fn test_ownership() {
        let log = vec![stored("a", "u1", 1), stored("b", "u2", 2)];
        let viewer = ViewerContext::signed_in("u1");
        for shown in project(&log, &viewer) {
            assert_eq!(shown.is_own_message, shown.author_id == "u1");
        }
    }

    #[test]
    fn test_anonymous_owns_nothing() {
        let log = vec![stored("a", "", 1), stored("b", "u2", 2)];
        let shown = project(&log, &ViewerContext::anonymous());
        assert!(shown.iter().all(|m| !m.is_own_message));
    }

    #[test]
    fn test_pure_and_reversible() {
        let log = vec![stored("a", "u1", 1), stored("b", "u2", 2), stored("c", "u3", 3)];
        let viewer = ViewerContext::signed_in("u2");
        let first = project(&log, &viewer);
        assert_eq!(first, project(&log, &viewer));

        let mut restored = first.clone();
        restored.reverse();
        let ids: Vec<&str> = restored.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_log() {
        assert!(project(&[], &ViewerContext::signed_in("u1")).is_empty());
    }
}
