//! The form state machine.
//!
//! [`FormEngine`] owns form data, per-action progress, per-action error
//! state, and the orchestration of validation, hooks, and mutation execution.
//! Rendering layers read [`FormSnapshot`]s (or subscribe to events) and call
//! the entry points; nothing here draws anything.
//!
//! Per action the states are Idle → Submitting → (Succeeded | Failed) → Idle.
//! Differently-named actions may be in flight concurrently; re-submitting an
//! action that is already Submitting is not blocked here — callers that need
//! at-most-one-in-flight must disable the invoking control while the
//! action's progress flag is set.

use std::collections::HashMap;
use std::sync::Arc;

use futures_core::Stream;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use graphform_ast::introspect;
use graphform_types::{FormData, FormError, JsonMap, Result, SubmitEvent};
use graphform_validate::{Messages, Validator};

use crate::client::{GraphClient, MutationRequest, QueryRequest};
use crate::config::{ConfigLayer, FormConfig};
use crate::events::{EventEmitter, FormEvent};
use crate::hooks::{HookArgs, HookPayload, LifecycleEvent};
use crate::registry::ActionRegistry;
use crate::variables::build_variables;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct FormState {
    form_data: FormData,
    progress: HashMap<String, bool>,
    mutation_errors: HashMap<String, Value>,
    query_data: Option<Value>,
    query_loading: bool,
    query_error: Option<FormError>,
}

struct EngineShared {
    config: FormConfig,
    registry: ActionRegistry,
    query_key: Option<String>,
}

/// Read-only view of the form exposed to the rendering layer and to hooks.
#[derive(Debug, Clone, Default)]
pub struct FormSnapshot {
    pub form_data: FormData,
    pub messages: Messages,
    pub progress: HashMap<String, bool>,
    pub mutation_errors: HashMap<String, Value>,
    pub query_data: Option<Value>,
    pub query_loading: bool,
    pub query_error: Option<FormError>,
    pub actions: Vec<String>,
    pub submit_action: String,
}

impl FormSnapshot {
    pub fn in_progress(&self, action: &str) -> bool {
        self.progress.get(action).copied().unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// FormEngine
// ---------------------------------------------------------------------------

pub struct FormEngine {
    client: Arc<dyn GraphClient>,
    validator: Arc<Validator>,
    events: EventEmitter,
    shared: RwLock<EngineShared>,
    state: RwLock<FormState>,
}

impl FormEngine {
    /// Resolve the configuration layers and build the engine.
    ///
    /// Structural problems — a mutation with no field selection, a query
    /// with no derivable selection key, a hook naming an unknown action —
    /// fail here, loudly, before anything runs.
    pub fn new(client: Arc<dyn GraphClient>, layers: &[ConfigLayer]) -> Result<Self> {
        let config = FormConfig::resolve(layers);
        let registry = ActionRegistry::build(&config)?;
        config.hooks.validate(&registry.names())?;
        let query_key = match &config.query {
            Some(query) => Some(introspect::selection_key(query)?.to_owned()),
            None => None,
        };
        let validator = Arc::new(Validator::new(config.rules.clone()));
        let state = FormState {
            form_data: config.data.clone(),
            ..FormState::default()
        };
        Ok(Self {
            client,
            validator,
            events: EventEmitter::default(),
            shared: RwLock::new(EngineShared {
                config,
                registry,
                query_key,
            }),
            state: RwLock::new(state),
        })
    }

    /// Re-resolve configuration. The action registry is an explicit cache
    /// keyed by the identity of its inputs: it is rebuilt only when the
    /// mutation documents or producers changed identity. Validation rules
    /// are fixed at construction and are not swapped here.
    pub async fn reconfigure(&self, layers: &[ConfigLayer]) -> Result<()> {
        let config = FormConfig::resolve(layers);
        let mut shared = self.shared.write().await;

        let rebuilt = if shared.registry.is_stale(&config) {
            Some(ActionRegistry::build(&config)?)
        } else {
            None
        };
        let names = match &rebuilt {
            Some(registry) => registry.names(),
            None => shared.registry.names(),
        };
        config.hooks.validate(&names)?;
        let query_key = match &config.query {
            Some(query) => Some(introspect::selection_key(query)?.to_owned()),
            None => None,
        };

        if let Some(registry) = rebuilt {
            shared.registry = registry;
        }
        shared.query_key = query_key;
        shared.config = config;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Form data and validation
    // -----------------------------------------------------------------------

    /// Merge-patch `change` into the form data, then validate just the
    /// changed fields. The merge is unconditional; validation is advisory
    /// and never blocks it. Changed fields with no configured rules are not
    /// an error. Returns the message state after validation.
    pub async fn update_form_data(&self, change: JsonMap) -> Messages {
        let fields: Vec<String> = change.keys().cloned().collect();
        {
            let mut state = self.state.write().await;
            state.form_data.merge(&change);
        }
        self.events.emit(FormEvent::FormDataUpdated {
            fields: fields.clone(),
        });

        match self.validator.validate(&change).await {
            Ok(messages) => {
                self.events.emit(FormEvent::ValidationCompleted {
                    fields,
                    message_count: messages.len(),
                });
                messages
            }
            // No rules configured for the changed fields: swallowed.
            Err(_) => self.validator.messages().await,
        }
    }

    pub async fn form_data(&self) -> FormData {
        self.state.read().await.form_data.clone()
    }

    /// Replace the form data wholesale, bypassing merge and validation.
    pub async fn set_form_data(&self, data: FormData) {
        self.state.write().await.form_data = data;
    }

    pub async fn messages(&self) -> Messages {
        self.validator.messages().await
    }

    pub fn validator(&self) -> Arc<Validator> {
        self.validator.clone()
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Submit a named action.
    ///
    /// For a registered action this runs the full sequence: variables from
    /// the current form data, mutation execution, success/error hooks, and
    /// progress/error bookkeeping. Execution failures are captured into
    /// state and never returned as errors. For an unregistered name the
    /// `Run` hook fires directly with no network effect.
    ///
    /// Returns the `Run` hook's result on a completed success chain.
    pub async fn submit(&self, action: &str, event: Arc<SubmitEvent>) -> Option<Value> {
        event.prevent_default();

        let (entry, transform, hooks) = {
            let shared = self.shared.read().await;
            (
                shared.registry.get(action).cloned(),
                shared.config.to_mutation_variable.clone(),
                shared.config.hooks.clone(),
            )
        };

        let Some(entry) = entry else {
            // Client-side action: no mutation, no progress or error state.
            let args = self
                .hook_args(action, event.clone(), HookPayload::None)
                .await;
            return hooks
                .trigger(&LifecycleEvent::Run(action.to_string()), args, None)
                .await;
        };

        {
            let mut state = self.state.write().await;
            state.progress.insert(action.to_string(), true);
            // A new submission clears every action's prior error, not just
            // its own. An unrelated in-flight action's displayed error
            // disappears here.
            state.mutation_errors.clear();
        }
        self.events.emit(FormEvent::ActionStarted {
            action: action.to_string(),
        });

        let form_data = self.state.read().await.form_data.clone();
        let raw_values = entry.variables.produce(&form_data).await;
        let variables = build_variables(&entry.mutation, &raw_values, &transform);
        let request = MutationRequest {
            document: entry.mutation.clone(),
            variables,
            options: entry.options.clone(),
            cache_update: entry.cache_update.clone(),
        };

        match self.client.mutate(request).await {
            Ok(response) => {
                let args = self
                    .hook_args(action, event.clone(), HookPayload::Response(response.clone()))
                    .await;
                let effective = hooks
                    .trigger(
                        &LifecycleEvent::Success(action.to_string()),
                        args,
                        Some(response),
                    )
                    .await;
                self.state
                    .write()
                    .await
                    .progress
                    .insert(action.to_string(), false);
                self.events.emit(FormEvent::ActionSucceeded {
                    action: action.to_string(),
                });
                match effective {
                    Some(response) => {
                        let args = self
                            .hook_args(action, event.clone(), HookPayload::Response(response))
                            .await;
                        hooks
                            .trigger(&LifecycleEvent::Run(action.to_string()), args, None)
                            .await
                    }
                    // The success hook vetoed the continuation.
                    None => None,
                }
            }
            Err(error) => {
                self.state
                    .write()
                    .await
                    .progress
                    .insert(action.to_string(), false);
                self.events.emit(FormEvent::ActionFailed {
                    action: action.to_string(),
                    error: error.to_string(),
                });
                let default = Some(error.to_value());
                let args = self
                    .hook_args(action, event.clone(), HookPayload::Failure(error))
                    .await;
                if let Some(recorded) = hooks
                    .trigger(&LifecycleEvent::Error(action.to_string()), args, default)
                    .await
                {
                    tracing::error!(action, recorded = %recorded, "mutation failed");
                    self.state
                        .write()
                        .await
                        .mutation_errors
                        .insert(action.to_string(), recorded);
                }
                None
            }
        }
    }

    /// Submit the configured default action.
    pub async fn on_submit(&self, event: Arc<SubmitEvent>) -> Option<Value> {
        let action = self.shared.read().await.config.submit_action.clone();
        self.submit(&action, event).await
    }

    // -----------------------------------------------------------------------
    // Query-driven initialization
    // -----------------------------------------------------------------------

    /// Execute the configured query and fold its data into the form.
    ///
    /// On data: validation state resets and, when the selection key is
    /// present in the response, the form data is *replaced* with the
    /// transformed sub-object. An absent key leaves the form untouched.
    /// Callers re-invoke this for every resolution they care about.
    pub async fn load(&self) {
        let (query, variables, fetch_policy, key, to_form_data) = {
            let shared = self.shared.read().await;
            (
                shared.config.query.clone(),
                shared.config.query_variables.clone(),
                shared.config.fetch_policy,
                shared.query_key.clone(),
                shared.config.to_form_data.clone(),
            )
        };
        let (Some(query), Some(key)) = (query, key) else {
            // No query configured: loading stays false and the form data is
            // never overwritten by query resolution.
            return;
        };

        {
            let mut state = self.state.write().await;
            state.query_loading = true;
            state.query_error = None;
        }
        self.events.emit(FormEvent::QueryStarted);

        let request = QueryRequest {
            document: query,
            variables,
            fetch_policy,
        };
        match self.client.query(request).await {
            Ok(data) => {
                self.validator.reset().await;
                // Key presence is judged on the raw response; the transform
                // only shapes the replacement, it cannot invent the key.
                let replacement = match data.get(&key) {
                    Some(_) => {
                        let transformed = (to_form_data)(&data, &key);
                        transformed.get(&key).and_then(FormData::from_value)
                    }
                    None => None,
                };
                let replaced = replacement.is_some();
                {
                    let mut state = self.state.write().await;
                    if let Some(form_data) = replacement {
                        state.form_data = form_data;
                    }
                    state.query_data = Some(data);
                    state.query_loading = false;
                }
                tracing::debug!(selection_key = %key, replaced, "query resolved");
                self.events.emit(FormEvent::QueryResolved {
                    selection_key: key,
                    replaced_form_data: replaced,
                });
            }
            Err(error) => {
                tracing::warn!(error = %error, "query failed");
                {
                    let mut state = self.state.write().await;
                    state.query_error = Some(error.clone());
                    state.query_loading = false;
                }
                self.events.emit(FormEvent::QueryFailed {
                    error: error.to_string(),
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Exposed state
    // -----------------------------------------------------------------------

    pub async fn progress(&self, action: &str) -> bool {
        self.state
            .read()
            .await
            .progress
            .get(action)
            .copied()
            .unwrap_or(false)
    }

    pub async fn mutation_errors(&self) -> HashMap<String, Value> {
        self.state.read().await.mutation_errors.clone()
    }

    pub async fn set_mutation_errors(&self, errors: HashMap<String, Value>) {
        self.state.write().await.mutation_errors = errors;
    }

    pub async fn query_loading(&self) -> bool {
        self.state.read().await.query_loading
    }

    pub async fn query_data(&self) -> Option<Value> {
        self.state.read().await.query_data.clone()
    }

    pub async fn query_error(&self) -> Option<FormError> {
        self.state.read().await.query_error.clone()
    }

    /// Registered action names, sorted.
    pub async fn actions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.read().await.registry.names().into_iter().collect();
        names.sort();
        names
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        let state = self.state.read().await.clone();
        let shared = self.shared.read().await;
        let mut actions: Vec<String> = shared.registry.names().into_iter().collect();
        actions.sort();
        FormSnapshot {
            form_data: state.form_data,
            messages: self.validator.messages().await,
            progress: state.progress,
            mutation_errors: state.mutation_errors,
            query_data: state.query_data,
            query_loading: state.query_loading,
            query_error: state.query_error,
            actions,
            submit_action: shared.config.submit_action.clone(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// The event feed as a [`Stream`]. Items arrive as `Result`s because a
    /// receiver that falls behind the broadcast capacity observes a lag
    /// error instead of the skipped events.
    pub fn event_stream(
        &self,
    ) -> impl Stream<Item = std::result::Result<FormEvent, BroadcastStreamRecvError>> + Send + Unpin
    {
        BroadcastStream::new(self.events.subscribe())
    }

    async fn hook_args(
        &self,
        action: &str,
        event: Arc<SubmitEvent>,
        payload: HookPayload,
    ) -> HookArgs {
        HookArgs {
            action: action.to_string(),
            event,
            payload,
            form: self.snapshot().await,
            validator: self.validator.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
