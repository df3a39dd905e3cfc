//! Observable notifications emitted by controllers.
//!
//! The UI layer subscribes and renders toasts; this crate only guarantees that every
//! success and failure produces exactly one message on the channel.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    /// Endpoint of the resource that emitted it.
    pub resource: &'static str,
    pub message: String,
}

/// Fan-out channel of [`Notification`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn emit(&self, level: NotificationLevel, resource: &'static str, message: impl Into<String>) {
        // No subscribers is fine.
        let _ = self.sender.send(Notification {
            level,
            resource,
            message: message.into(),
        });
    }

    pub fn success(&self, resource: &'static str, message: impl Into<String>) {
        self.emit(NotificationLevel::Success, resource, message);
    }

    pub fn info(&self, resource: &'static str, message: impl Into<String>) {
        self.emit(NotificationLevel::Info, resource, message);
    }

    pub fn warning(&self, resource: &'static str, message: impl Into<String>) {
        self.emit(NotificationLevel::Warning, resource, message);
    }

    pub fn error(&self, resource: &'static str, message: impl Into<String>) {
        self.emit(NotificationLevel::Error, resource, message);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
