//! Form orchestration engine: binds a form's lifecycle to a GraphQL API.
//!
//! This crate implements the core graphform runner: layered configuration,
//! the action registry derived from mutation documents, variable coercion,
//! lifecycle hook dispatch, query-driven initialization, and the
//! [`FormEngine`] state machine the rendering layer talks to.

pub mod client;
pub mod config;
pub mod events;
pub mod form;
pub mod hooks;
pub mod registry;
pub mod server_errors;
pub mod variables;

pub use client::{
    CacheUpdate, CacheUpdates, FetchPolicy, GraphClient, MutationOptions, MutationRequest,
    QueryRequest, StaticClient,
};
pub use config::{identity_form_data, ConfigLayer, FormConfig, FormDataTransform, DEFAULT_SUBMIT_ACTION};
pub use events::{EventEmitter, FormEvent};
pub use form::{FormEngine, FormSnapshot};
pub use hooks::{hook_fn, FormHook, HookArgs, HookPayload, HookRegistry, LifecycleEvent};
pub use registry::{config_fingerprint, Action, ActionRegistry};
pub use server_errors::{server_validation_hook, PayloadOverrides};
pub use variables::{
    build_variables, identity_transform, producer_fn, FormDataProducer, ProduceVariables,
    VariableTransform,
};
