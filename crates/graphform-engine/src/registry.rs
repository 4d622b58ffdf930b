//! Action registry: logical action name → mutation, variables producer,
//! execution options, and cache-update target.
//!
//! The registry is an explicit cache over the configuration: each entry
//! closes over the producer and options current at build time, so it carries
//! an identity fingerprint of its inputs and is rebuilt only when that
//! fingerprint changes.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use graphform_ast::{introspect, Document};
use graphform_types::Result;

use crate::client::{CacheUpdate, MutationOptions};
use crate::config::FormConfig;
use crate::variables::{FormDataProducer, ProduceVariables};

/// One named submit-capable operation.
#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub mutation: Arc<Document>,
    pub variables: Arc<dyn ProduceVariables>,
    pub options: MutationOptions,
    pub cache_update: Option<CacheUpdate>,
}

pub struct ActionRegistry {
    actions: HashMap<String, Action>,
    submit_action: String,
    fingerprint: u64,
}

impl ActionRegistry {
    /// Build the registry from a resolved configuration.
    ///
    /// Resolves each mutation's cache-update target by its field name. A
    /// mutation with no field selection is a structure error and fails here,
    /// at setup time.
    pub fn build(config: &FormConfig) -> Result<Self> {
        let mut actions = HashMap::new();
        for (name, mutation) in &config.mutations {
            let field_name = introspect::field_name(mutation)?;
            let cache_update = config.cache_updates.resolve(field_name);
            let variables = config
                .mutations_variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| Arc::new(FormDataProducer));
            let options = config
                .mutations_options
                .get(name)
                .cloned()
                .unwrap_or_default();
            actions.insert(
                name.clone(),
                Action {
                    name: name.clone(),
                    mutation: mutation.clone(),
                    variables,
                    options,
                    cache_update,
                },
            );
        }
        Ok(Self {
            actions,
            submit_action: config.submit_action.clone(),
            fingerprint: config_fingerprint(config),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn names(&self) -> HashSet<String> {
        self.actions.keys().cloned().collect()
    }

    pub fn submit_action(&self) -> &str {
        &self.submit_action
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// True when `config`'s identity no longer matches the inputs this
    /// registry was built from.
    pub fn is_stale(&self, config: &FormConfig) -> bool {
        self.fingerprint != config_fingerprint(config)
    }
}

/// Identity key of the configuration inputs the registry closes over:
/// the `Arc` pointer identities of each mutation document and producer,
/// plus the submit action name. Structural equality is deliberately not
/// used; replacing a document with an equal one still invalidates.
pub fn config_fingerprint(config: &FormConfig) -> u64 {
    let mut names: Vec<&String> = config.mutations.keys().collect();
    names.sort();

    let mut hasher = DefaultHasher::new();
    config.submit_action.hash(&mut hasher);
    for name in names {
        name.hash(&mut hasher);
        (Arc::as_ptr(&config.mutations[name]) as usize).hash(&mut hasher);
        if let Some(producer) = config.mutations_variables.get(name) {
            (Arc::as_ptr(producer) as *const () as usize).hash(&mut hasher);
        }
    }
    hasher.finish()
}
