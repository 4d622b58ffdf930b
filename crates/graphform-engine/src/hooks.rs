//! Lifecycle hook trait, closure adapter, and hook registry.
//!
//! Hooks are registered against enumerated [`LifecycleEvent`] tags rather
//! than resolved by name mangling at call time, and the registry is validated
//! when the engine is configured.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use graphform_types::{FormError, Result, SubmitEvent};
use graphform_validate::Validator;

use crate::form::FormSnapshot;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// The three hook points of one action's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The action's main continuation: fires after a successful mutation (or
    /// directly, for client-side actions with no registered mutation).
    Run(String),
    /// Fires on mutation success, before `Run`. May veto or replace the
    /// response the `Run` hook sees.
    Success(String),
    /// Fires on mutation failure. Its return value, if any, is recorded as
    /// the action's error state.
    Error(String),
}

impl LifecycleEvent {
    pub fn action(&self) -> &str {
        match self {
            LifecycleEvent::Run(name)
            | LifecycleEvent::Success(name)
            | LifecycleEvent::Error(name) => name,
        }
    }
}

// ---------------------------------------------------------------------------
// FormHook trait
// ---------------------------------------------------------------------------

/// The payload a hook receives: the mutation response, the failure, or
/// nothing (client-side actions).
#[derive(Debug, Clone)]
pub enum HookPayload {
    None,
    Response(Value),
    Failure(FormError),
}

impl HookPayload {
    pub fn response(&self) -> Option<&Value> {
        match self {
            HookPayload::Response(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FormError> {
        match self {
            HookPayload::Failure(error) => Some(error),
            _ => None,
        }
    }
}

/// Arguments handed to every hook invocation.
///
/// The snapshot is taken at trigger time, so a `Success` hook still observes
/// its action's progress flag set. The validator handle lets hooks feed
/// server-side validation results back into the form's messages.
#[derive(Clone)]
pub struct HookArgs {
    pub action: String,
    pub event: Arc<SubmitEvent>,
    pub payload: HookPayload,
    pub form: FormSnapshot,
    pub validator: Arc<Validator>,
}

#[async_trait]
pub trait FormHook: Send + Sync {
    /// Handle a lifecycle event. The meaning of the return value depends on
    /// the hook point; see [`LifecycleEvent`].
    async fn call(&self, args: HookArgs) -> Option<Value>;
}

struct FnHook<F>(F);

#[async_trait]
impl<F> FormHook for FnHook<F>
where
    F: Fn(HookArgs) -> Option<Value> + Send + Sync,
{
    async fn call(&self, args: HookArgs) -> Option<Value> {
        (self.0)(args)
    }
}

/// Wrap a plain closure as a hook.
pub fn hook_fn<F>(handler: F) -> Arc<dyn FormHook>
where
    F: Fn(HookArgs) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(FnHook(handler))
}

// ---------------------------------------------------------------------------
// HookRegistry
// ---------------------------------------------------------------------------

/// Explicit map from lifecycle event to handler.
#[derive(Clone, Default)]
pub struct HookRegistry {
    handlers: HashMap<LifecycleEvent, Arc<dyn FormHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, event: LifecycleEvent, hook: Arc<dyn FormHook>) {
        self.handlers.insert(event, hook);
    }

    /// Fold another registry's handlers over this one; the other registry's
    /// registrations win on conflict. Used by configuration layering.
    pub fn merge(&mut self, other: &HookRegistry) {
        for (event, hook) in &other.handlers {
            self.handlers.insert(event.clone(), hook.clone());
        }
    }

    pub fn has(&self, event: &LifecycleEvent) -> bool {
        self.handlers.contains_key(event)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Configuration-time check: `Success` and `Error` hooks can only fire
    /// for registered actions, so a registration naming anything else is a
    /// configuration error. `Run` hooks may name client-side actions with no
    /// mutation behind them.
    pub fn validate(&self, registered_actions: &HashSet<String>) -> Result<()> {
        for event in self.handlers.keys() {
            match event {
                LifecycleEvent::Run(_) => {}
                LifecycleEvent::Success(name) | LifecycleEvent::Error(name) => {
                    if !registered_actions.contains(name) {
                        return Err(FormError::Config(format!(
                            "hook registered for unknown action '{name}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Invoke the handler for `event` with `args`, or return `default`
    /// unchanged when none is registered.
    pub async fn trigger(
        &self,
        event: &LifecycleEvent,
        args: HookArgs,
        default: Option<Value>,
    ) -> Option<Value> {
        match self.handlers.get(event) {
            Some(hook) => hook.call(args).await,
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(action: &str, payload: HookPayload) -> HookArgs {
        HookArgs {
            action: action.to_string(),
            event: SubmitEvent::new(),
            payload,
            form: FormSnapshot::default(),
            validator: Arc::new(Validator::new(Default::default())),
        }
    }

    #[tokio::test]
    async fn trigger_returns_default_without_handler() {
        let registry = HookRegistry::new();
        let result = registry
            .trigger(
                &LifecycleEvent::Success("save".into()),
                args("save", HookPayload::Response(json!({"ok": true}))),
                Some(json!({"ok": true})),
            )
            .await;
        assert_eq!(result, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn trigger_invokes_registered_handler() {
        let mut registry = HookRegistry::new();
        registry.on(
            LifecycleEvent::Success("save".into()),
            hook_fn(|args| {
                let response = args.payload.response()?.clone();
                Some(json!({ "wrapped": response }))
            }),
        );

        let result = registry
            .trigger(
                &LifecycleEvent::Success("save".into()),
                args("save", HookPayload::Response(json!(1))),
                Some(json!(1)),
            )
            .await;
        assert_eq!(result, Some(json!({"wrapped": 1})));
    }

    #[tokio::test]
    async fn merge_prefers_later_registrations() {
        let mut base = HookRegistry::new();
        base.on(LifecycleEvent::Run("save".into()), hook_fn(|_| Some(json!("base"))));
        let mut layer = HookRegistry::new();
        layer.on(LifecycleEvent::Run("save".into()), hook_fn(|_| Some(json!("layer"))));

        base.merge(&layer);
        let result = base
            .trigger(
                &LifecycleEvent::Run("save".into()),
                args("save", HookPayload::None),
                None,
            )
            .await;
        assert_eq!(result, Some(json!("layer")));
    }

    #[test]
    fn validate_rejects_hooks_for_unknown_actions() {
        let mut registry = HookRegistry::new();
        registry.on(LifecycleEvent::Error("rename".into()), hook_fn(|_| None));

        let known: HashSet<String> = ["save".to_string()].into_iter().collect();
        assert!(matches!(
            registry.validate(&known),
            Err(FormError::Config(_))
        ));
    }

    #[test]
    fn validate_allows_run_hooks_for_client_side_actions() {
        let mut registry = HookRegistry::new();
        registry.on(LifecycleEvent::Run("preview".into()), hook_fn(|_| None));

        let known: HashSet<String> = ["save".to_string()].into_iter().collect();
        assert!(registry.validate(&known).is_ok());
    }
}
