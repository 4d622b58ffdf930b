//! Typed GraphQL document model and introspection for graphform.
//!
//! Represents parsed query/mutation documents as an explicit AST
//! ([`Document`], [`OperationDefinition`], [`Selection`], [`VariableDefinition`],
//! [`TypeRef`]) and provides the pure tree-walks the form engine uses to
//! derive behavior from a document's own structure.
//!
//! # Example
//! ```
//! use graphform_ast::{builder, introspect, TypeRef};
//!
//! let doc = builder::mutation()
//!     .variable("id", TypeRef::named("ID").non_null())
//!     .field(builder::field("updateUser").alias("user").arg_var("id", "id"))
//!     .build();
//! assert_eq!(introspect::selection_key(&doc).unwrap(), "user");
//! assert_eq!(introspect::field_name(&doc).unwrap(), "updateUser");
//! ```

pub mod ast;
pub mod builder;
pub mod introspect;

pub use ast::*;
