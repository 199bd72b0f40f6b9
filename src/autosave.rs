//! Debounced autosave for an open document.
//!
//! The coordinator buffers local edit content and persists it after a
//! quiet period. A content-change callback is honored only when all of
//! these hold: the change came from user input (editors fire the same
//! callback for programmatic loads), the initial-load guard has already
//! cleared, no historical version preview is active, and the caller has
//! edit capability. Preview mode forces read-only behavior even for
//! EDIT users; the two gates combine by logical OR.
//!
//! A persist is skipped when the buffer is byte-identical to the last
//! known server content. Our own persisted content coming back as a
//! `documentUpdated` delta is recognized by comparison against what we
//! last sent and must not reset the buffer, or it would clobber
//! keystrokes typed after the persist fired.

use crate::connection::Connection;
use crate::store::Store;
use crate::surface::ChangeSource;
use cowrite_protocol::{ClientRequest, Document, Membership};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Quiet period between the last keystroke and the persist request.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(700);

struct AutosaveState {
    buffer: String,
    server_content: String,
    last_persisted: Option<String>,
    initial_load: bool,
    previewing: bool,
    timer: Option<JoinHandle<()>>,
}

/// Debounced writer for one open document.
pub struct AutosaveCoordinator {
    document_id: i64,
    conn: Arc<Connection>,
    membership: Store<Option<Membership>>,
    state: Arc<Mutex<AutosaveState>>,
    quiet_period: Duration,
}

impl AutosaveCoordinator {
    pub fn new(
        conn: Arc<Connection>,
        membership: Store<Option<Membership>>,
        document_id: i64,
        quiet_period: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            document_id,
            conn,
            membership,
            state: Arc::new(Mutex::new(AutosaveState {
                buffer: String::new(),
                server_content: String::new(),
                last_persisted: None,
                initial_load: true,
                previewing: false,
                timer: None,
            })),
            quiet_period,
        })
    }

    /// Fold a server-side document update into the coordinator.
    ///
    /// An echo of our own persist only advances the known server
    /// content. Anything else is an external change: the buffer is
    /// reset and the initial-load guard set, because loading the new
    /// content into the editor will fire one programmatic change
    /// callback.
    pub fn apply_remote(&self, doc: &Document) {
        let mut state = self.state.lock().expect("autosave lock poisoned");
        if state.last_persisted.as_deref() == Some(doc.content.as_str()) {
            debug!(document_id = self.document_id, "own persist echoed back");
            state.server_content = doc.content.clone();
            state.last_persisted = None;
            return;
        }
        state.buffer = doc.content.clone();
        state.server_content = doc.content.clone();
        state.last_persisted = None;
        state.initial_load = true;
    }

    /// Enter or leave historical-version preview. While previewing, no
    /// edit is honored regardless of permission.
    pub fn set_previewing(&self, previewing: bool) {
        let mut state = self.state.lock().expect("autosave lock poisoned");
        state.previewing = previewing;
    }

    /// Whether the document must currently render read-only.
    pub fn read_only(&self) -> bool {
        let previewing = self
            .state
            .lock()
            .expect("autosave lock poisoned")
            .previewing;
        previewing || !self.can_edit()
    }

    /// Editor content-change callback.
    pub fn on_editor_change(&self, content: &str, source: ChangeSource) {
        {
            let mut state = self.state.lock().expect("autosave lock poisoned");
            if state.initial_load {
                // Artifact of programmatically loading content into the
                // editor, not a user edit.
                state.initial_load = false;
                return;
            }
            if source != ChangeSource::User {
                return;
            }
            if state.previewing {
                return;
            }
            if !self.can_edit() {
                return;
            }
            // Update the buffer immediately for responsive display.
            state.buffer = content.to_string();
        }
        self.schedule_persist();
    }

    /// Whether a debounced persist is currently scheduled.
    pub fn has_pending_persist(&self) -> bool {
        self.state
            .lock()
            .expect("autosave lock poisoned")
            .timer
            .is_some()
    }

    /// Cancel any scheduled persist. Called on view teardown; also runs
    /// on drop.
    pub fn teardown(&self) {
        let timer = self
            .state
            .lock()
            .expect("autosave lock poisoned")
            .timer
            .take();
        if let Some(timer) = timer {
            timer.abort();
        }
    }

    fn can_edit(&self) -> bool {
        self.membership
            .get()
            .map(|m| m.permission.capability().edit)
            .unwrap_or(false)
    }

    fn schedule_persist(&self) {
        let state = self.state.clone();
        let conn = self.conn.clone();
        let membership = self.membership.clone();
        let document_id = self.document_id;
        let quiet_period = self.quiet_period;

        let task = tokio::spawn(async move {
            sleep(quiet_period).await;
            let request = {
                let mut state = state.lock().expect("autosave lock poisoned");
                state.timer = None;
                // Permission may have been revoked while we slept.
                let can_edit = membership
                    .get()
                    .map(|m| m.permission.capability().edit)
                    .unwrap_or(false);
                if !can_edit || state.previewing {
                    return;
                }
                if state.buffer == state.server_content
                    || state.last_persisted.as_deref() == Some(state.buffer.as_str())
                {
                    return;
                }
                state.last_persisted = Some(state.buffer.clone());
                ClientRequest::ChangeContentAndSaveDocument {
                    document_id,
                    new_content: state.buffer.clone(),
                }
            };
            if let Err(e) = conn.send(request) {
                warn!(document_id, "autosave persist failed: {}", e);
            }
        });

        let previous = self
            .state
            .lock()
            .expect("autosave lock poisoned")
            .timer
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for AutosaveCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
