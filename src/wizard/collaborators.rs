//! Boundary collaborators the wizard calls out to.
//!
//! The wizard is single-threaded; shared recorders use `Rc<RefCell<_>>` so a
//! host can keep a handle after boxing the collaborator into the wizard.

use std::{cell::RefCell, fmt, rc::Rc};

use super::values::FileRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    DraftSaved,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::DraftSaved => "draft-saved",
        };
        f.write_str(label)
    }
}

/// Redirect target after a successful submission.
pub trait Router {
    fn navigate(&mut self, path: &str);
}

/// Fire-and-forget feedback (sounds, toasts).
pub trait Notifier {
    fn notify(&mut self, kind: NotificationKind);
}

/// Supplies opaque file handles in response to a user selection.
pub trait FilePicker {
    fn pick(&mut self, hint: &str) -> Option<FileRef>;
}

/// Router that remembers every destination it was asked for.
#[derive(Debug, Clone, Default)]
pub struct RecordingRouter {
    visits: Rc<RefCell<Vec<String>>>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.borrow().clone()
    }
}

impl Router for RecordingRouter {
    fn navigate(&mut self, path: &str) {
        self.visits.borrow_mut().push(path.to_string());
    }
}

/// Notifier that remembers every signal it received.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    signals: Rc<RefCell<Vec<NotificationKind>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<NotificationKind> {
        self.signals.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, kind: NotificationKind) {
        self.signals.borrow_mut().push(kind);
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, kind: NotificationKind) {
        tracing::debug!(%kind, "notification");
    }
}

/// Router that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRouter;

impl Router for LogRouter {
    fn navigate(&mut self, path: &str) {
        tracing::info!(path, "navigation requested");
    }
}
