use std::sync::Mutex;

use serde::Serialize;

/// Entry point the user is sent to once the session cannot be recovered
pub const LOGIN_PATH: &str = "/login";

/// User-facing side effects of the request pipeline
pub trait SessionEvents: Send + Sync {
    /// The refresh flow failed; the user must log in again
    fn session_expired(&self);

    /// A request was rejected with a message meant for the user
    fn notify_error(&self, message: &str);
}

/// Reports events through `tracing` only
pub struct LoggingEvents;

impl SessionEvents for LoggingEvents {
    fn session_expired(&self) {
        tracing::warn!(redirect = LOGIN_PATH, "Session expired");
    }

    fn notify_error(&self, message: &str) {
        tracing::warn!(message = %message, "Request rejected");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionExpired { redirect: String },
    Error { message: String },
}

/// Queues events until the UI collects them
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued event, oldest first
    pub fn drain(&self) -> Vec<SessionEvent> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *events)
    }

    fn push(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl SessionEvents for RecordingEvents {
    fn session_expired(&self) {
        LoggingEvents.session_expired();
        self.push(SessionEvent::SessionExpired {
            redirect: LOGIN_PATH.to_string(),
        });
    }

    fn notify_error(&self, message: &str) {
        LoggingEvents.notify_error(message);
        self.push(SessionEvent::Error {
            message: message.to_string(),
        });
    }
}
