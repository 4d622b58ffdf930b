//! Declarative field validation for graphform.
//!
//! A [`Validator`] is built from a [`RuleSet`] and owns the current
//! [`Messages`]. Validation is advisory: the form engine merges data first
//! and validates after, and it swallows the [`ValidatorError::NoMatchingRules`]
//! kind when none of the changed fields carry rules.

pub mod rules;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

pub use rules::{Rule, RuleSet};

/// Field name → failure messages for that field.
pub type Messages = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidatorError {
    /// None of the validated fields have rules configured. The engine treats
    /// this as ignorable rather than a form error.
    #[error("no validation rules apply to the given fields")]
    NoMatchingRules,
}

impl ValidatorError {
    pub fn is_ignorable(&self) -> bool {
        matches!(self, ValidatorError::NoMatchingRules)
    }
}

/// Async validator over a declarative rule set.
///
/// Message state lives behind a `tokio` lock so the engine and lifecycle
/// hooks can share one handle across await points.
pub struct Validator {
    rules: RuleSet,
    messages: Arc<RwLock<Messages>>,
}

impl Validator {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            messages: Arc::new(RwLock::new(Messages::new())),
        }
    }

    /// Validate just the given fields against their configured rules and fold
    /// the outcome into the stored messages: failing fields get their message
    /// list replaced, passing fields get their stale messages cleared.
    ///
    /// Returns the full message snapshot after the update, or
    /// [`ValidatorError::NoMatchingRules`] when no validated field has rules.
    pub async fn validate(
        &self,
        partial: &serde_json::Map<String, Value>,
    ) -> Result<Messages, ValidatorError> {
        let mut checked = 0usize;
        let mut messages = self.messages.write().await;
        for (field, value) in partial {
            let Some(rules) = self.rules.rules_for(field) else {
                continue;
            };
            checked += 1;
            let failures: Vec<String> = rules
                .iter()
                .filter_map(|rule| rule.check(field, Some(value)))
                .collect();
            if failures.is_empty() {
                messages.remove(field);
            } else {
                messages.insert(field.clone(), failures);
            }
        }
        if checked == 0 {
            return Err(ValidatorError::NoMatchingRules);
        }
        tracing::debug!(fields = checked, "validated changed fields");
        Ok(messages.clone())
    }

    /// Merge externally-produced messages (e.g. server-side validation
    /// results) into the stored state.
    pub async fn apply(&self, external: Messages) {
        let mut messages = self.messages.write().await;
        for (field, failures) in external {
            messages.insert(field, failures);
        }
    }

    /// Clear all messages. Called when fresh query data replaces the form.
    pub async fn reset(&self) {
        self.messages.write().await.clear();
    }

    pub async fn messages(&self) -> Messages {
        self.messages.read().await.clone()
    }

    pub async fn is_valid(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn rules() -> RuleSet {
        RuleSet::new()
            .field("name", vec![Rule::Required, Rule::MinLength(2)])
            .field("age", vec![Rule::Range { min: Some(0.0), max: Some(130.0) }])
    }

    #[tokio::test]
    async fn validate_records_and_clears_messages() {
        let validator = Validator::new(rules());

        let messages = validator.validate(&map(json!({"name": ""}))).await.unwrap();
        assert_eq!(messages["name"].len(), 2);

        let messages = validator
            .validate(&map(json!({"name": "Ada"})))
            .await
            .unwrap();
        assert!(messages.is_empty());
        assert!(validator.is_valid().await);
    }

    #[tokio::test]
    async fn validate_only_touches_changed_fields() {
        let validator = Validator::new(rules());
        validator.validate(&map(json!({"name": ""}))).await.unwrap();

        // A later change to another field leaves name's messages in place.
        let messages = validator.validate(&map(json!({"age": 200}))).await.unwrap();
        assert!(messages.contains_key("name"));
        assert!(messages.contains_key("age"));
    }

    #[tokio::test]
    async fn unconfigured_fields_yield_no_matching_rules() {
        let validator = Validator::new(rules());
        let err = validator
            .validate(&map(json!({"nickname": "x"})))
            .await
            .unwrap_err();
        assert!(err.is_ignorable());
        assert!(matches!(err, ValidatorError::NoMatchingRules));
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let validator = Validator::new(rules());
        validator.validate(&map(json!({"name": ""}))).await.unwrap();
        validator.reset().await;
        assert!(validator.messages().await.is_empty());
    }

    #[tokio::test]
    async fn apply_merges_external_messages() {
        let validator = Validator::new(rules());
        let mut external = Messages::new();
        external.insert("email".into(), vec!["email is taken".into()]);
        validator.apply(external).await;
        assert_eq!(
            validator.messages().await["email"],
            vec!["email is taken".to_string()]
        );
    }
}
