//! Form lifecycle events for observability.
//!
//! Every state change in the engine emits a [`FormEvent`] on a
//! [`tokio::sync::broadcast`] channel so the rendering layer (or loggers and
//! tests) can react to query resolutions and action progress without polling
//! snapshots.

use serde::{Deserialize, Serialize};

/// Events emitted while a form runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FormEvent {
    QueryStarted,
    QueryResolved {
        selection_key: String,
        replaced_form_data: bool,
    },
    QueryFailed {
        error: String,
    },
    FormDataUpdated {
        fields: Vec<String>,
    },
    ValidationCompleted {
        fields: Vec<String>,
        message_count: usize,
    },
    ActionStarted {
        action: String,
    },
    ActionSucceeded {
        action: String,
    },
    ActionFailed {
        action: String,
        error: String,
    },
}

/// Fan-out handle for [`FormEvent`]s.
///
/// Emission is fire-and-forget: the engine never waits on observers, and an
/// event with nobody listening simply disappears. Slow observers that fall
/// behind the channel capacity see a lag error on their receiver, not
/// engine back-pressure.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<FormEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast one event; a send with no receivers is not an error.
    pub fn emit(&self, event: FormEvent) {
        let _ = self.sender.send(event);
    }

    /// Open a receiver that observes every event emitted from now on.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FormEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
