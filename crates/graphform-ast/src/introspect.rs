//! Pure tree-walks over a [`Document`] used to synthesize form behavior:
//! selection keys for response targeting, variable definitions for input
//! coercion, and field names for cache-update resolution.

use graphform_types::{FormError, Result};

use crate::ast::{Definition, Document, Field, OperationDefinition, Selection, VariableDefinition};

/// First operation-kind definition of the document, if any.
pub fn operation_definition(document: &Document) -> Option<&OperationDefinition> {
    document.definitions.iter().find_map(|def| match def {
        Definition::Operation(op) => Some(op),
        Definition::Fragment(_) => None,
    })
}

/// First field-kind selection in the operation's top-level selection set.
pub fn field_selection(definition: Option<&OperationDefinition>) -> Option<&Field> {
    definition?
        .selection_set
        .selections
        .iter()
        .find_map(|sel| match sel {
            Selection::Field(field) => Some(field),
            _ => None,
        })
}

/// The response key of the document's top-level field: alias if present,
/// otherwise the field name.
///
/// This is a hard stop: without a key no form data can be derived from a
/// response, so an empty or operation-less document is a structure error.
pub fn selection_key(document: &Document) -> Result<&str> {
    let field = field_selection(operation_definition(document)).ok_or_else(|| {
        FormError::Structure("unable to determine selection key from document structure".into())
    })?;
    Ok(field.response_key())
}

/// The *name* (never the alias) of the document's top-level field. Cache
/// updates are keyed by the schema field, not the caller's alias.
pub fn field_name(document: &Document) -> Result<&str> {
    let field = field_selection(operation_definition(document)).ok_or_else(|| {
        FormError::Structure("unable to determine field name from document structure".into())
    })?;
    Ok(&field.name)
}

/// All variable definitions declared on the operation, in declaration order.
/// Empty when the definition is absent.
pub fn variable_definitions(definition: Option<&OperationDefinition>) -> &[VariableDefinition] {
    definition.map_or(&[], |def| def.variable_definitions.as_slice())
}

/// The innermost named type of a variable declaration.
pub fn variable_type(definition: &VariableDefinition) -> &str {
    definition.ty.named_type()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SelectionSet, TypeRef};
    use crate::builder::{field, mutation, query};

    #[test]
    fn selection_key_uses_field_name() {
        let doc = query().field(field("getUser").select("name")).build();
        assert_eq!(selection_key(&doc).unwrap(), "getUser");
    }

    #[test]
    fn selection_key_prefers_alias() {
        let doc = query()
            .field(field("getUser").alias("user").select("name"))
            .build();
        assert_eq!(selection_key(&doc).unwrap(), "user");
    }

    #[test]
    fn field_name_ignores_alias() {
        let doc = mutation()
            .field(field("updateUser").alias("user"))
            .build();
        assert_eq!(field_name(&doc).unwrap(), "updateUser");
    }

    #[test]
    fn selection_key_fails_without_operation_definition() {
        let doc = Document { definitions: vec![] };
        match selection_key(&doc) {
            Err(FormError::Structure(msg)) => {
                assert!(msg.contains("selection key"), "unexpected message: {msg}");
            }
            other => panic!("expected Structure error, got: {other:?}"),
        }
    }

    #[test]
    fn selection_key_fails_on_empty_selection_set() {
        let doc = query().build();
        assert!(matches!(selection_key(&doc), Err(FormError::Structure(_))));
    }

    #[test]
    fn selection_key_skips_fragment_spreads() {
        let doc = Document {
            definitions: vec![Definition::Operation(OperationDefinition {
                operation: crate::ast::OperationKind::Query,
                name: None,
                variable_definitions: vec![],
                selection_set: SelectionSet {
                    selections: vec![
                        Selection::FragmentSpread {
                            name: "userFields".into(),
                        },
                        Selection::Field(field("getUser").build()),
                    ],
                },
            })],
        };
        assert_eq!(selection_key(&doc).unwrap(), "getUser");
    }

    #[test]
    fn variable_definitions_preserve_declaration_order() {
        let doc = mutation()
            .variable("id", TypeRef::named("ID").non_null())
            .variable("input", TypeRef::named("UserInput"))
            .field(field("updateUser"))
            .build();
        let defs = variable_definitions(operation_definition(&doc));
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["id", "input"]);
    }

    #[test]
    fn variable_type_unwraps_nested_decorations() {
        // [ID!]! unwraps to ID
        let ty = TypeRef::named("ID").non_null().list().non_null();
        assert_eq!(ty.named_type(), "ID");
        // Idempotent: unwrapping an already-named type is a no-op.
        assert_eq!(TypeRef::named(ty.named_type()).named_type(), "ID");
    }
}
