//! Layered form configuration.
//!
//! Configuration arrives in layers — built-in defaults, then ambient
//! (provider-level) configuration, then call-site configuration — and
//! [`FormConfig::resolve`] folds them key-by-key with later layers winning.
//! The precedence is explicit; no layer is merged by accident of ordering
//! elsewhere.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use graphform_ast::Document;
use graphform_types::{FormData, JsonMap};
use graphform_validate::RuleSet;

use crate::client::{CacheUpdates, FetchPolicy, MutationOptions};
use crate::hooks::{FormHook, HookRegistry, LifecycleEvent};
use crate::variables::{identity_transform, ProduceVariables, VariableTransform};

/// Transform applied to a resolved query response before its selection key's
/// sub-object replaces the form data: `(response, selection key) -> response`.
pub type FormDataTransform = Arc<dyn Fn(&Value, &str) -> Value + Send + Sync>;

/// The default response transform: identity.
pub fn identity_form_data() -> FormDataTransform {
    Arc::new(|response, _key| response.clone())
}

/// Default name of the implicit submit action.
pub const DEFAULT_SUBMIT_ACTION: &str = "submit";

// ---------------------------------------------------------------------------
// ConfigLayer
// ---------------------------------------------------------------------------

/// One configuration layer. Every option is absent unless set; resolution
/// fills the gaps from earlier layers, then from defaults.
#[derive(Clone, Default)]
pub struct ConfigLayer {
    data: Option<FormData>,
    rules: Option<RuleSet>,
    query: Option<Arc<Document>>,
    query_variables: Option<JsonMap>,
    fetch_policy: Option<FetchPolicy>,
    mutation: Option<Arc<Document>>,
    mutation_variables: Option<Arc<dyn ProduceVariables>>,
    mutations: HashMap<String, Arc<Document>>,
    mutations_variables: HashMap<String, Arc<dyn ProduceVariables>>,
    mutations_options: HashMap<String, MutationOptions>,
    submit_action: Option<String>,
    to_form_data: Option<FormDataTransform>,
    to_mutation_variable: Option<VariableTransform>,
    cache_updates: Option<CacheUpdates>,
    hooks: HookRegistry,
}

impl ConfigLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial form data.
    pub fn data(mut self, data: FormData) -> Self {
        self.data = Some(data);
        self
    }

    /// Declarative validation rules.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Query document driving initial form data.
    pub fn query(mut self, query: Arc<Document>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn query_variables(mut self, variables: JsonMap) -> Self {
        self.query_variables = Some(variables);
        self
    }

    pub fn fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = Some(policy);
        self
    }

    /// Single-action shorthand: one mutation registered under the submit
    /// action name. When set, it supersedes the multi-action maps entirely.
    pub fn mutation(mut self, mutation: Arc<Document>) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Variables producer for the single-action shorthand.
    pub fn mutation_variables(mut self, producer: Arc<dyn ProduceVariables>) -> Self {
        self.mutation_variables = Some(producer);
        self
    }

    /// Register one named mutation (multi-action form).
    pub fn mutation_named(mut self, name: impl Into<String>, mutation: Arc<Document>) -> Self {
        self.mutations.insert(name.into(), mutation);
        self
    }

    pub fn mutation_variables_named(
        mut self,
        name: impl Into<String>,
        producer: Arc<dyn ProduceVariables>,
    ) -> Self {
        self.mutations_variables.insert(name.into(), producer);
        self
    }

    pub fn mutation_options_named(
        mut self,
        name: impl Into<String>,
        options: MutationOptions,
    ) -> Self {
        self.mutations_options.insert(name.into(), options);
        self
    }

    pub fn submit_action(mut self, name: impl Into<String>) -> Self {
        self.submit_action = Some(name.into());
        self
    }

    pub fn to_form_data(mut self, transform: FormDataTransform) -> Self {
        self.to_form_data = Some(transform);
        self
    }

    pub fn to_mutation_variable(mut self, transform: VariableTransform) -> Self {
        self.to_mutation_variable = Some(transform);
        self
    }

    pub fn cache_updates(mut self, updates: CacheUpdates) -> Self {
        self.cache_updates = Some(updates);
        self
    }

    /// Register a lifecycle hook.
    pub fn on(mut self, event: LifecycleEvent, hook: Arc<dyn FormHook>) -> Self {
        self.hooks.on(event, hook);
        self
    }
}

// ---------------------------------------------------------------------------
// FormConfig
// ---------------------------------------------------------------------------

/// Fully-resolved configuration: every option has a value.
#[derive(Clone)]
pub struct FormConfig {
    pub data: FormData,
    pub rules: RuleSet,
    pub query: Option<Arc<Document>>,
    pub query_variables: JsonMap,
    pub fetch_policy: FetchPolicy,
    pub mutations: HashMap<String, Arc<Document>>,
    pub mutations_variables: HashMap<String, Arc<dyn ProduceVariables>>,
    pub mutations_options: HashMap<String, MutationOptions>,
    pub submit_action: String,
    pub to_form_data: FormDataTransform,
    pub to_mutation_variable: VariableTransform,
    pub cache_updates: CacheUpdates,
    pub hooks: HookRegistry,
}

impl FormConfig {
    /// Fold configuration layers into a resolved config.
    ///
    /// Precedence, lowest to highest: built-in defaults, then each layer in
    /// slice order. Scalar options are overridden whole; the named mutation /
    /// producer / options maps and the hook registry are merged key-by-key.
    /// After folding, the single-mutation shorthand (if any layer set one)
    /// replaces the multi-action maps with a single entry under the submit
    /// action name.
    pub fn resolve(layers: &[ConfigLayer]) -> FormConfig {
        let mut data = None;
        let mut rules = None;
        let mut query = None;
        let mut query_variables = None;
        let mut fetch_policy = None;
        let mut mutation = None;
        let mut mutation_variables = None;
        let mut mutations: HashMap<String, Arc<Document>> = HashMap::new();
        let mut mutations_variables: HashMap<String, Arc<dyn ProduceVariables>> = HashMap::new();
        let mut mutations_options: HashMap<String, MutationOptions> = HashMap::new();
        let mut submit_action = None;
        let mut to_form_data = None;
        let mut to_mutation_variable = None;
        let mut cache_updates = None;
        let mut hooks = HookRegistry::new();

        for layer in layers {
            data = layer.data.clone().or(data);
            rules = layer.rules.clone().or(rules);
            query = layer.query.clone().or(query);
            query_variables = layer.query_variables.clone().or(query_variables);
            fetch_policy = layer.fetch_policy.or(fetch_policy);
            mutation = layer.mutation.clone().or(mutation);
            mutation_variables = layer.mutation_variables.clone().or(mutation_variables);
            mutations.extend(layer.mutations.clone());
            mutations_variables.extend(layer.mutations_variables.clone());
            mutations_options.extend(layer.mutations_options.clone());
            submit_action = layer.submit_action.clone().or(submit_action);
            to_form_data = layer.to_form_data.clone().or(to_form_data);
            to_mutation_variable = layer.to_mutation_variable.clone().or(to_mutation_variable);
            cache_updates = layer.cache_updates.clone().or(cache_updates);
            hooks.merge(&layer.hooks);
        }

        let submit_action = submit_action.unwrap_or_else(|| DEFAULT_SUBMIT_ACTION.to_string());

        // Exactly one action shape is active: a single mutation supersedes
        // the multi-action maps.
        if let Some(mutation) = mutation {
            mutations = HashMap::from([(submit_action.clone(), mutation)]);
            mutations_variables = match mutation_variables {
                Some(producer) => HashMap::from([(submit_action.clone(), producer)]),
                None => HashMap::new(),
            };
        }

        FormConfig {
            data: data.unwrap_or_default(),
            rules: rules.unwrap_or_default(),
            query,
            query_variables: query_variables.unwrap_or_default(),
            fetch_policy: fetch_policy.unwrap_or_default(),
            mutations,
            mutations_variables,
            mutations_options,
            submit_action,
            to_form_data: to_form_data.unwrap_or_else(identity_form_data),
            to_mutation_variable: to_mutation_variable.unwrap_or_else(identity_transform),
            cache_updates: cache_updates.unwrap_or_default(),
            hooks,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self::resolve(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphform_ast::builder::{field, mutation, query};
    use serde_json::json;

    fn doc_mutation(name: &str) -> Arc<Document> {
        Arc::new(mutation().field(field(name)).build())
    }

    #[test]
    fn defaults_apply_with_no_layers() {
        let config = FormConfig::default();
        assert!(config.data.is_empty());
        assert!(config.query.is_none());
        assert_eq!(config.fetch_policy, FetchPolicy::NetworkOnly);
        assert_eq!(config.submit_action, "submit");
        assert!(config.mutations.is_empty());
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn later_layers_override_key_by_key() {
        let provider = ConfigLayer::new()
            .fetch_policy(FetchPolicy::CacheFirst)
            .submit_action("save")
            .data(FormData::from_value(&json!({"name": "provider"})).unwrap());
        let local = ConfigLayer::new()
            .data(FormData::from_value(&json!({"name": "local"})).unwrap());

        let config = FormConfig::resolve(&[provider, local]);
        // Local data wins; provider's untouched keys survive.
        assert_eq!(config.data.get("name"), Some(&json!("local")));
        assert_eq!(config.fetch_policy, FetchPolicy::CacheFirst);
        assert_eq!(config.submit_action, "save");
    }

    #[test]
    fn named_mutation_maps_merge_across_layers() {
        let provider = ConfigLayer::new().mutation_named("save", doc_mutation("updateUser"));
        let local = ConfigLayer::new()
            .mutation_named("remove", doc_mutation("deleteUser"))
            .mutation_named("save", doc_mutation("saveUser"));

        let config = FormConfig::resolve(&[provider, local]);
        assert_eq!(config.mutations.len(), 2);
        let save_field = graphform_ast::introspect::field_name(&config.mutations["save"]).unwrap();
        assert_eq!(save_field, "saveUser");
    }

    #[test]
    fn single_mutation_shorthand_supersedes_multi_action_maps() {
        let layer = ConfigLayer::new()
            .mutation_named("save", doc_mutation("updateUser"))
            .mutation_named("remove", doc_mutation("deleteUser"))
            .mutation(doc_mutation("replaceUser"))
            .submit_action("save");

        let config = FormConfig::resolve(&[layer]);
        assert_eq!(config.mutations.len(), 1);
        let save_field = graphform_ast::introspect::field_name(&config.mutations["save"]).unwrap();
        assert_eq!(save_field, "replaceUser");
    }

    #[test]
    fn query_layer_survives_unrelated_local_overrides() {
        let q = Arc::new(query().field(field("getUser")).build());
        let provider = ConfigLayer::new().query(q.clone());
        let local = ConfigLayer::new().submit_action("save");

        let config = FormConfig::resolve(&[provider, local]);
        assert!(Arc::ptr_eq(config.query.as_ref().unwrap(), &q));
    }
}
