//! Bridging server-side validation failures back into form messages.
//!
//! GraphQL servers commonly reject bad input with errors carrying
//! `extensions.code == "BAD_USER_INPUT"` and a `extensions.validator` array
//! of per-field results. [`server_validation_hook`] builds an `Error`
//! lifecycle hook that folds those results into the form's validation
//! messages and swallows the mutation error; anything else passes through to
//! be recorded as usual.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use graphform_types::FormError;
use graphform_validate::Messages;

use crate::hooks::{FormHook, HookArgs, HookPayload};

/// Per-result message overrides, keyed by the result's `type` tag: either a
/// direct map or a resolver over the whole result object.
#[derive(Clone, Default)]
pub enum PayloadOverrides {
    #[default]
    None,
    Map(HashMap<String, Value>),
    Resolver(Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>),
}

impl PayloadOverrides {
    fn apply(&self, result: &Value) -> Option<Value> {
        match self {
            PayloadOverrides::None => None,
            PayloadOverrides::Map(map) => result
                .get("type")
                .and_then(Value::as_str)
                .and_then(|ty| map.get(ty).cloned()),
            PayloadOverrides::Resolver(resolve) => resolve(result),
        }
    }
}

/// Build an `Error` lifecycle hook translating BAD_USER_INPUT server errors
/// into validation messages.
pub fn server_validation_hook(overrides: PayloadOverrides) -> Arc<dyn FormHook> {
    Arc::new(ServerValidationHook { overrides })
}

struct ServerValidationHook {
    overrides: PayloadOverrides,
}

impl ServerValidationHook {
    fn message_for(&self, field: &str, result: &Value) -> String {
        if let Some(payload) = self.overrides.apply(result) {
            if let Some(text) = payload.as_str() {
                return text.to_string();
            }
        }
        result
            .get("message")
            .or_else(|| result.get("payload"))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| {
                let ty = result.get("type").and_then(Value::as_str).unwrap_or("value");
                format!("{field} failed the {ty} check")
            })
    }
}

#[async_trait]
impl FormHook for ServerValidationHook {
    async fn call(&self, args: HookArgs) -> Option<Value> {
        let HookPayload::Failure(error) = &args.payload else {
            return None;
        };
        let FormError::Graph { errors, .. } = error else {
            // Not a GraphQL server error: record it as usual.
            return Some(error.to_value());
        };

        let mut messages = Messages::new();
        for server_error in errors {
            let extensions = &server_error["extensions"];
            if extensions["code"] != "BAD_USER_INPUT" {
                continue;
            }
            let Some(results) = extensions["validator"].as_array() else {
                continue;
            };
            for result in results {
                let Some(field) = result.get("field").and_then(Value::as_str) else {
                    continue;
                };
                let message = self.message_for(field, result);
                messages.entry(field.to_string()).or_default().push(message);
            }
        }

        if messages.is_empty() {
            return Some(error.to_value());
        }
        tracing::debug!(fields = messages.len(), "applied server validation results");
        args.validator.apply(messages).await;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormSnapshot;
    use graphform_types::SubmitEvent;
    use graphform_validate::{RuleSet, Validator};
    use serde_json::json;

    fn args_for(error: FormError) -> HookArgs {
        HookArgs {
            action: "save".into(),
            event: SubmitEvent::new(),
            payload: HookPayload::Failure(error),
            form: FormSnapshot::default(),
            validator: Arc::new(Validator::new(RuleSet::new())),
        }
    }

    fn bad_input_error() -> FormError {
        FormError::Graph {
            message: "bad input".into(),
            errors: vec![json!({
                "extensions": {
                    "code": "BAD_USER_INPUT",
                    "validator": [
                        {"field": "email", "type": "unique", "message": "email is taken"},
                        {"field": "name", "type": "required"},
                    ],
                }
            })],
        }
    }

    #[tokio::test]
    async fn bad_user_input_becomes_messages_and_is_swallowed() {
        let hook = server_validation_hook(PayloadOverrides::None);
        let args = args_for(bad_input_error());
        let validator = args.validator.clone();

        let recorded = hook.call(args).await;
        assert_eq!(recorded, None);

        let messages = validator.messages().await;
        assert_eq!(messages["email"], vec!["email is taken".to_string()]);
        assert_eq!(messages["name"], vec!["name failed the required check".to_string()]);
    }

    #[tokio::test]
    async fn overrides_replace_result_messages_by_type() {
        let mut map = HashMap::new();
        map.insert("unique".to_string(), json!("already registered"));
        let hook = server_validation_hook(PayloadOverrides::Map(map));
        let args = args_for(bad_input_error());
        let validator = args.validator.clone();

        hook.call(args).await;
        assert_eq!(
            validator.messages().await["email"],
            vec!["already registered".to_string()]
        );
    }

    #[tokio::test]
    async fn unrelated_errors_pass_through_for_recording() {
        let hook = server_validation_hook(PayloadOverrides::None);

        let transport = args_for(FormError::Transport("offline".into()));
        let recorded = hook.call(transport).await;
        assert_eq!(recorded, Some(json!({"message": "transport error: offline"})));

        let graph = args_for(FormError::Graph {
            message: "internal".into(),
            errors: vec![json!({"extensions": {"code": "INTERNAL"}})],
        });
        let recorded = hook.call(graph).await;
        assert!(recorded.is_some());
    }
}
