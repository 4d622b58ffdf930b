//! GraphQL client collaborator trait and request/directive types.
//!
//! The engine never talks to a network: it hands fully-prepared requests to a
//! caller-supplied [`GraphClient`] and consumes the resolved JSON. The
//! [`StaticClient`] implementation serves canned responses and records every
//! request, for tests and offline demos.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

use graphform_ast::{introspect, Document};
use graphform_types::{FormError, JsonMap, Result};

/// Strategy governing whether a query reads from cache, network, or both.
/// Opaque to the engine; passed through to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    CacheFirst,
    CacheAndNetwork,
    #[default]
    NetworkOnly,
    CacheOnly,
}

/// A collaborator-specific directive describing how to merge a mutation's
/// response into the client's local cache. The engine only routes it to the
/// right mutation; its content is opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheUpdate(pub Value);

/// Configured cache-update targets, keyed by mutation field name: either a
/// direct map or a resolver function.
#[derive(Clone, Default)]
pub enum CacheUpdates {
    #[default]
    None,
    Map(HashMap<String, CacheUpdate>),
    Resolver(Arc<dyn Fn(&str) -> Option<CacheUpdate> + Send + Sync>),
}

impl CacheUpdates {
    pub fn resolve(&self, field_name: &str) -> Option<CacheUpdate> {
        match self {
            CacheUpdates::None => None,
            CacheUpdates::Map(map) => map.get(field_name).cloned(),
            CacheUpdates::Resolver(resolve) => resolve(field_name),
        }
    }
}

impl fmt::Debug for CacheUpdates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheUpdates::None => f.write_str("CacheUpdates::None"),
            CacheUpdates::Map(map) => f.debug_tuple("CacheUpdates::Map").field(map).finish(),
            CacheUpdates::Resolver(_) => f.write_str("CacheUpdates::Resolver(..)"),
        }
    }
}

/// Collaborator-specific execution options attached to one action's mutation,
/// passed through to the client untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOptions(pub JsonMap);

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub document: Arc<Document>,
    pub variables: JsonMap,
    pub fetch_policy: FetchPolicy,
}

#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub document: Arc<Document>,
    pub variables: JsonMap,
    pub options: MutationOptions,
    pub cache_update: Option<CacheUpdate>,
}

/// The external GraphQL execution client.
///
/// Implementations own transport, caching, and parsing concerns; the engine
/// owns nothing past the request boundary.
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn query(&self, request: QueryRequest) -> Result<Value>;
    async fn mutate(&self, request: MutationRequest) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// StaticClient
// ---------------------------------------------------------------------------

/// A canned-response client that records every request it receives.
///
/// Mutations are keyed by their document's top-level field name, so one
/// client can serve a multi-action form.
#[derive(Default)]
pub struct StaticClient {
    query_result: Mutex<Option<Result<Value>>>,
    mutation_results: Mutex<HashMap<String, Result<Value>>>,
    query_requests: Mutex<Vec<QueryRequest>>,
    mutation_requests: Mutex<Vec<MutationRequest>>,
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(self, result: Result<Value>) -> Self {
        *self.query_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_mutation(self, field_name: impl Into<String>, result: Result<Value>) -> Self {
        self.mutation_results
            .lock()
            .unwrap()
            .insert(field_name.into(), result);
        self
    }

    /// Every mutation request received so far, in order.
    pub fn mutation_requests(&self) -> Vec<MutationRequest> {
        self.mutation_requests.lock().unwrap().clone()
    }

    pub fn query_requests(&self) -> Vec<QueryRequest> {
        self.query_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphClient for StaticClient {
    async fn query(&self, request: QueryRequest) -> Result<Value> {
        self.query_requests.lock().unwrap().push(request);
        self.query_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(FormError::Transport("no canned query response".into())))
    }

    async fn mutate(&self, request: MutationRequest) -> Result<Value> {
        let field = introspect::field_name(&request.document)?.to_owned();
        self.mutation_requests.lock().unwrap().push(request);
        self.mutation_results
            .lock()
            .unwrap()
            .get(&field)
            .cloned()
            .unwrap_or_else(|| {
                Err(FormError::Transport(format!(
                    "no canned response for mutation field '{field}'"
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphform_ast::builder::{field, mutation, query};
    use serde_json::json;

    #[test]
    fn cache_updates_resolve_by_field_name() {
        let mut map = HashMap::new();
        map.insert("updateUser".to_string(), CacheUpdate(json!({"evict": "User"})));
        let updates = CacheUpdates::Map(map);
        assert_eq!(
            updates.resolve("updateUser"),
            Some(CacheUpdate(json!({"evict": "User"})))
        );
        assert_eq!(updates.resolve("deleteUser"), None);
        assert_eq!(CacheUpdates::None.resolve("updateUser"), None);

        let resolver = CacheUpdates::Resolver(Arc::new(|name| {
            Some(CacheUpdate(json!({ "refetch": name })))
        }));
        assert_eq!(
            resolver.resolve("deleteUser"),
            Some(CacheUpdate(json!({"refetch": "deleteUser"})))
        );
    }

    #[tokio::test]
    async fn static_client_serves_and_records() {
        let client = StaticClient::new()
            .with_query(Ok(json!({"getUser": {"name": "Bob"}})))
            .with_mutation("updateUser", Ok(json!({"updateUser": {"id": "1"}})));

        let doc = Arc::new(query().field(field("getUser").select("name")).build());
        let data = client
            .query(QueryRequest {
                document: doc,
                variables: JsonMap::new(),
                fetch_policy: FetchPolicy::default(),
            })
            .await
            .unwrap();
        assert_eq!(data["getUser"]["name"], json!("Bob"));

        let doc = Arc::new(mutation().field(field("updateUser")).build());
        let response = client
            .mutate(MutationRequest {
                document: doc,
                variables: JsonMap::new(),
                options: MutationOptions::default(),
                cache_update: None,
            })
            .await
            .unwrap();
        assert_eq!(response["updateUser"]["id"], json!("1"));
        assert_eq!(client.mutation_requests().len(), 1);
        assert_eq!(client.query_requests().len(), 1);
    }

    #[tokio::test]
    async fn static_client_fails_unconfigured_mutations() {
        let client = StaticClient::new();
        let doc = Arc::new(mutation().field(field("deleteUser")).build());
        let err = client
            .mutate(MutationRequest {
                document: doc,
                variables: JsonMap::new(),
                options: MutationOptions::default(),
                cache_update: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::Transport(_)));
    }

    #[test]
    fn fetch_policy_defaults_to_network_only() {
        assert_eq!(FetchPolicy::default(), FetchPolicy::NetworkOnly);
    }
}
