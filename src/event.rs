//! Worker events — the core produces these, foreground listeners consume them.

use crate::ipc::JsonlWriter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happened to a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// An occurrence matured and a notification was raised.
    Triggered,
    /// The user pushed a due occurrence forward.
    Snoozed,
    /// The user completed the reminder (retired or rescheduled).
    Completed,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Triggered => write!(f, "triggered"),
            Self::Snoozed => write!(f, "snoozed"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// One broadcast record, appended to `.minder/events.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerEvent {
    /// Unique identifier for this event.
    pub id: String,

    /// What happened.
    pub kind: EventKind,

    /// The reminder this event is about.
    pub reminder_id: String,

    /// Reminder title, so listeners can render without a store lookup.
    pub title: String,

    /// When the event was produced.
    pub timestamp: DateTime<Utc>,

    /// Optional free-form detail (e.g. "snoozed 5 minutes").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl WorkerEvent {
    /// Create a new event stamped to now.
    pub fn new(kind: EventKind, reminder_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            reminder_id: reminder_id.into(),
            title: title.into(),
            timestamp: Utc::now(),
            detail: None,
        }
    }

    /// Attach a detail line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Append events to the broadcast file. Fire-and-forget: failures are logged
/// and swallowed — a listener that misses an event re-reads the store anyway.
pub fn broadcast(path: &Path, events: &[WorkerEvent]) {
    if events.is_empty() {
        return;
    }
    let writer = JsonlWriter::<WorkerEvent>::new(path);
    for event in events {
        if let Err(e) = writer.append(event) {
            eprintln!("[event] failed to broadcast {}: {e}", event.kind);
        }
    }
}
