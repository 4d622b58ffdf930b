//! Declarative per-field validation rules.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

/// A single declarative check applied to one field value.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Fails when the value is absent, null, or an empty string.
    Required,
    MinLength(usize),
    MaxLength(usize),
    /// Fails when a string value does not match the pattern.
    Pattern(Regex),
    /// Fails when the value is not one of the allowed literals.
    OneOf(Vec<Value>),
    /// Numeric bounds, inclusive.
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl Rule {
    /// Check a field value. Returns a failure message, or `None` when the
    /// rule passes. Every rule except `Required` passes on an absent value;
    /// presence is `Required`'s concern alone.
    pub fn check(&self, field: &str, value: Option<&Value>) -> Option<String> {
        match self {
            Rule::Required => match value {
                None | Some(Value::Null) => Some(format!("{field} is required")),
                Some(Value::String(s)) if s.is_empty() => Some(format!("{field} is required")),
                _ => None,
            },
            Rule::MinLength(min) => match value {
                Some(Value::String(s)) if s.chars().count() < *min => {
                    Some(format!("{field} must be at least {min} characters"))
                }
                _ => None,
            },
            Rule::MaxLength(max) => match value {
                Some(Value::String(s)) if s.chars().count() > *max => {
                    Some(format!("{field} must be at most {max} characters"))
                }
                _ => None,
            },
            Rule::Pattern(pattern) => match value {
                Some(Value::String(s)) if !pattern.is_match(s) => {
                    Some(format!("{field} has an invalid format"))
                }
                _ => None,
            },
            Rule::OneOf(allowed) => match value {
                Some(v) if !allowed.contains(v) => {
                    Some(format!("{field} is not an allowed value"))
                }
                _ => None,
            },
            Rule::Range { min, max } => {
                let number = value.and_then(Value::as_f64)?;
                if min.is_some_and(|m| number < m) {
                    return Some(format!("{field} is below the minimum"));
                }
                if max.is_some_and(|m| number > m) {
                    return Some(format!("{field} is above the maximum"));
                }
                None
            }
        }
    }
}

/// Rules keyed by field name. Fields without an entry have no rules; the
/// validator reports that case with its ignorable error kind.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, Vec<Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.rules.insert(name.into(), rules);
        self
    }

    pub fn rules_for(&self, field: &str) -> Option<&[Rule]> {
        self.rules.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
