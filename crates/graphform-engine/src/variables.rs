//! Variable coercion pipeline.
//!
//! Input variables for a mutation are never listed by the caller: they are
//! read off the mutation document's own variable definitions. Form fields not
//! declared as variables are excluded; declared variables missing from the
//! raw values fall back to the declaration's default value, then to the
//! transform.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use graphform_ast::{introspect, Document};
use graphform_types::{FormData, JsonMap};

/// Caller-supplied coercion from a raw form value to a mutation input value:
/// `(value, declared type name, variable name) -> coerced value`.
///
/// `None` in means the raw value was unset and the declaration had no
/// default; `None` out omits the variable from the request.
pub type VariableTransform = Arc<dyn Fn(Option<&Value>, &str, &str) -> Option<Value> + Send + Sync>;

/// The default transform: pass raw values through unchanged, omit unset ones.
pub fn identity_transform() -> VariableTransform {
    Arc::new(|value, _ty, _name| value.cloned())
}

/// Produces the raw values an action feeds into [`build_variables`].
#[async_trait]
pub trait ProduceVariables: Send + Sync {
    async fn produce(&self, data: &FormData) -> JsonMap;
}

/// The default producer: the current form data itself.
pub struct FormDataProducer;

#[async_trait]
impl ProduceVariables for FormDataProducer {
    async fn produce(&self, data: &FormData) -> JsonMap {
        data.as_map().clone()
    }
}

struct FnProducer<F>(F);

#[async_trait]
impl<F> ProduceVariables for FnProducer<F>
where
    F: Fn(&FormData) -> JsonMap + Send + Sync,
{
    async fn produce(&self, data: &FormData) -> JsonMap {
        (self.0)(data)
    }
}

/// Wrap a plain closure as a variables producer.
pub fn producer_fn<F>(produce: F) -> Arc<dyn ProduceVariables>
where
    F: Fn(&FormData) -> JsonMap + Send + Sync + 'static,
{
    Arc::new(FnProducer(produce))
}

/// Map raw values onto the mutation's declared variables.
///
/// For every variable definition, in declaration order: look up the raw value
/// by variable name, fall back to the declaration's default value, run the
/// transform, and keep `Some` results. Never fails; a panicking transform
/// propagates to the submit caller.
pub fn build_variables(
    mutation: &Document,
    raw_values: &JsonMap,
    transform: &VariableTransform,
) -> JsonMap {
    let definitions =
        introspect::variable_definitions(introspect::operation_definition(mutation));
    let mut variables = JsonMap::new();
    for definition in definitions {
        let declared = introspect::variable_type(definition);
        let raw = raw_values
            .get(&definition.name)
            .or(definition.default_value.as_ref());
        if let Some(value) = transform(raw, declared, &definition.name) {
            variables.insert(definition.name.clone(), value);
        }
    }
    variables
}
