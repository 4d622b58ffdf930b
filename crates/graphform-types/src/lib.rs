//! Shared types and errors for the graphform orchestration engine.
//!
//! This crate provides the foundational types used across all other graphform
//! crates:
//! - `FormError` — unified error taxonomy
//! - `FormData` — the form's field/value state with merge-patch semantics
//! - `SubmitEvent` — the triggering-event collaborator handed to lifecycle hooks

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Unified error type for all graphform subsystems.
///
/// Structural and configuration errors are loud: they are returned at engine
/// construction time and never caught internally. Execution errors are
/// captured into form state and never escape the engine boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FormError {
    // === Document Errors ===
    #[error("invalid document structure: {0}")]
    Structure(String),

    // === Configuration Errors ===
    #[error("invalid form configuration: {0}")]
    Config(String),

    // === Execution Errors ===
    #[error("GraphQL execution failed: {message}")]
    Graph {
        message: String,
        errors: Vec<serde_json::Value>,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

impl FormError {
    /// Returns `true` for errors raised at setup time (malformed documents,
    /// bad configuration) rather than during execution.
    pub fn is_setup(&self) -> bool {
        matches!(self, FormError::Structure(_) | FormError::Config(_))
    }

    /// JSON representation used when an error is recorded into per-action
    /// error state. GraphQL server errors keep their error list so error
    /// hooks can inspect `extensions`.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            FormError::Graph { message, errors } => serde_json::json!({
                "message": message,
                "errors": errors,
            }),
            other => serde_json::json!({ "message": other.to_string() }),
        }
    }
}

/// A convenience alias for `Result<T, FormError>`.
pub type Result<T> = std::result::Result<T, FormError>;

/// Alias for the JSON object map used throughout the engine.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// FormData
// ---------------------------------------------------------------------------

/// The form's current field values.
///
/// Mutated only through shallow merge-patch (`merge`) or wholesale
/// replacement when a query result resolves. Field order is preserved by the
/// underlying `serde_json::Map`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(JsonMap);

impl FormData {
    pub fn new() -> Self {
        Self(JsonMap::new())
    }

    /// Build form data from a JSON value. Returns `None` for anything that is
    /// not a JSON object.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        value.as_object().map(|map| Self(map.clone()))
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: serde_json::Value) {
        self.0.insert(field.into(), value);
    }

    /// Shallow merge-patch: every entry of `change` overwrites the entry of
    /// the same name; all other fields are left untouched.
    pub fn merge(&mut self, change: &JsonMap) {
        for (field, value) in change {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn into_map(self) -> JsonMap {
        self.0
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<JsonMap> for FormData {
    fn from(map: JsonMap) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// SubmitEvent
// ---------------------------------------------------------------------------

/// The event that triggered a submission.
///
/// The engine calls [`prevent_default`](SubmitEvent::prevent_default) at the
/// start of every submit so the host surface (e.g. a native form submit) does
/// not also act on it. Shared as `Arc` so lifecycle hooks running after an
/// await point can still inspect it.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: AtomicBool,
}

impl SubmitEvent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
