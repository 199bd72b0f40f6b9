//! Seams to the presentation layer.
//!
//! Rendering, routing, form widgets, and PDF layout are outside the
//! sync engine; the engine only ever touches them through these traits.
//! The [`testing`] module provides recording implementations.
//!
//! [`testing`]: crate::testing

use crate::error::ClientError;

/// Severity of a transient user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient notification surface (toast/snackbar).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Navigation target within the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Session(i64),
    Document { session_id: i64, document_id: i64 },
}

impl Route {
    /// Path form of the route, for navigation primitives that take one.
    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/dashboard".to_string(),
            Route::Session(id) => format!("/sessions/{}", id),
            Route::Document {
                session_id,
                document_id,
            } => format!("/sessions/{}/documents/{}", session_id, document_id),
        }
    }
}

/// Navigation primitive.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Document export collaborator (e.g. the PDF writer). The layout
/// algorithm is not part of the engine.
pub trait DocumentExporter: Send + Sync {
    fn export(&self, title: &str, content: &str) -> Result<(), ClientError>;
}

/// Origin of an editor content-change callback.
///
/// Editors fire the same callback for user keystrokes and for
/// programmatic content loads; autosave only honors the former.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    User,
    Api,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_paths() {
        assert_eq!(Route::Dashboard.path(), "/dashboard");
        assert_eq!(Route::Session(7).path(), "/sessions/7");
        assert_eq!(
            Route::Document {
                session_id: 7,
                document_id: 3
            }
            .path(),
            "/sessions/7/documents/3"
        );
    }
}
