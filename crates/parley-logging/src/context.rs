//! Viewer context injection
//!
//! Thread-local storage for the identity of the viewer a piece of work runs
//! on behalf of. [`ViewerContextGuard::span`] turns it into a `viewer` span
//! whose fields appear on every event logged inside it.

use std::cell::RefCell;

use uuid::Uuid;

/// Viewer context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContextData {
    /// The viewer's user id
    pub viewer_id: String,
    /// Unique id of this client session
    pub session_id: Uuid,
}

thread_local! {
    static VIEWER_CONTEXT: RefCell<Option<ViewerContextData>> = const { RefCell::new(None) };
}

/// RAII guard for viewer context
///
/// Sets the viewer for the current thread and restores the previous one
/// (if any) on drop.
///
/// # Example
///
/// ```ignore
/// use parley_logging::ViewerContextGuard;
///
/// let guard = ViewerContextGuard::new("ada");
///
/// // Logged with viewer_id = "ada" and the session id
/// guard.span().in_scope(|| tracing::info!("Posting"));
/// ```
pub struct ViewerContextGuard {
    data: ViewerContextData,
    previous: Option<ViewerContextData>,
}

impl ViewerContextGuard {
    /// Set the viewer for the current scope with a fresh session id
    pub fn new(viewer_id: impl Into<String>) -> Self {
        Self::with_session_id(viewer_id, Uuid::new_v4())
    }

    /// Set the viewer for the current scope with a known session id
    pub fn with_session_id(viewer_id: impl Into<String>, session_id: Uuid) -> Self {
        let next = ViewerContextData {
            viewer_id: viewer_id.into(),
            session_id,
        };
        let previous = VIEWER_CONTEXT.with(|ctx| ctx.borrow_mut().replace(next.clone()));
        Self {
            data: next,
            previous,
        }
    }

    /// The context this guard installed
    pub fn data(&self) -> &ViewerContextData {
        &self.data
    }

    /// A `viewer` span recording this guard's viewer and session
    ///
    /// Instrument async work with it; the thread-local context does not
    /// follow a task across threads, the span does.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "viewer",
            viewer_id = %self.data.viewer_id,
            session_id = %self.data.session_id
        )
    }

    /// Get the current viewer context (if any)
    pub fn current() -> Option<ViewerContextData> {
        VIEWER_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current viewer id (if set)
    pub fn current_viewer_id() -> Option<String> {
        Self::current().map(|ctx| ctx.viewer_id)
    }
}

impl Drop for ViewerContextGuard {
    fn drop(&mut self) {
        VIEWER_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block with a viewer context set
///
/// # Example
///
/// ```ignore
/// with_viewer_context!("ada", {
///     tracing::info!("Posting");
/// });
/// ```
#[macro_export]
macro_rules! with_viewer_context {
    ($viewer:expr, $body:block) => {{
        let _guard = $crate::context::ViewerContextGuard::new($viewer);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_context_guard() {
        assert!(ViewerContextGuard::current().is_none());
        {
            let _guard = ViewerContextGuard::new("ada");
            assert_eq!(ViewerContextGuard::current_viewer_id(), Some("ada".to_string()));
        }
        assert!(ViewerContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        {
            let _ada = ViewerContextGuard::new("ada");
            {
                let _bo = ViewerContextGuard::new("bo");
                assert_eq!(ViewerContextGuard::current_viewer_id(), Some("bo".to_string()));
            }
            // Restored after the inner guard drops
            assert_eq!(ViewerContextGuard::current_viewer_id(), Some("ada".to_string()));
        }
        assert!(ViewerContextGuard::current_viewer_id().is_none());
    }

    #[test]
    fn test_with_session_id() {
        let session = Uuid::new_v4();
        let _guard = ViewerContextGuard::with_session_id("ada", session);
        assert_eq!(ViewerContextGuard::current().unwrap().session_id, session);
    }

    #[test]
    fn test_span_names_viewer() {
        let guard = ViewerContextGuard::new("ada");
        assert_eq!(guard.data().viewer_id, "ada");
        let span = guard.span();
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "viewer");
            assert!(metadata.fields().field("viewer_id").is_some());
        }
    }

    #[test]
    fn test_macro_scopes_context() {
        let seen = with_viewer_context!("cy", { ViewerContextGuard::current_viewer_id() });
        assert_eq!(seen, Some("cy".to_string()));
        assert!(ViewerContextGuard::current().is_none());
    }
}
