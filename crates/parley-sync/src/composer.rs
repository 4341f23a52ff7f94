//! Pending message input.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::SyncResult;
use crate::messages::{MessageLog, PostOutcome};
use crate::viewer::ViewerContext;

/// Holds the draft being typed and posts it on submit
///
/// The draft is cleared only after a successful post, so a failed send can
/// be retried as-is.
pub struct Composer {
    log: Arc<MessageLog>,
    draft: watch::Sender<String>,
}

impl Composer {
    /// Create a composer posting into `log`
    pub fn new(log: Arc<MessageLog>) -> Self {
        Self {
            log,
            draft: watch::Sender::new(String::new()),
        }
    }

    /// Replace the draft
    pub fn set_draft(&self, text: impl Into<String>) {
        self.draft.send_replace(text.into());
    }

    /// The current draft
    pub fn draft(&self) -> String {
        self.draft.borrow().clone()
    }

    /// Observe draft changes
    pub fn watch_draft(&self) -> watch::Receiver<String> {
        self.draft.subscribe()
    }

    /// Post the current draft as `viewer`
    pub async fn submit(&self, viewer: &ViewerContext) -> SyncResult<PostOutcome> {
        let body = self.draft();
        let outcome = self.log.post_message(&body, viewer).await?;
        if outcome.is_posted() {
            self.draft.send_replace(String::new());
        }
        Ok(outcome)
    }
}
