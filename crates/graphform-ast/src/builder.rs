//! Programmatic document construction.
//!
//! Parsing GraphQL source is out of scope for this workspace; hosts either
//! hand the engine documents from their own tooling or assemble them here.

use crate::ast::{
    Argument, ArgumentValue, Definition, Document, Field, OperationDefinition, OperationKind,
    Selection, SelectionSet, TypeRef, VariableDefinition,
};

/// Start a query document.
pub fn query() -> OperationBuilder {
    OperationBuilder::new(OperationKind::Query)
}

/// Start a mutation document.
pub fn mutation() -> OperationBuilder {
    OperationBuilder::new(OperationKind::Mutation)
}

/// Start a field selection.
pub fn field(name: impl Into<String>) -> FieldBuilder {
    FieldBuilder {
        alias: None,
        name: name.into(),
        arguments: Vec::new(),
        selections: Vec::new(),
    }
}

pub struct OperationBuilder {
    operation: OperationKind,
    name: Option<String>,
    variable_definitions: Vec<VariableDefinition>,
    selections: Vec<Selection>,
}

impl OperationBuilder {
    fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            name: None,
            variable_definitions: Vec::new(),
            selections: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.variable_definitions.push(VariableDefinition {
            name: name.into(),
            ty,
            default_value: None,
        });
        self
    }

    pub fn variable_with_default(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        default_value: serde_json::Value,
    ) -> Self {
        self.variable_definitions.push(VariableDefinition {
            name: name.into(),
            ty,
            default_value: Some(default_value),
        });
        self
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.selections.push(Selection::Field(field.build()));
        self
    }

    pub fn build(self) -> Document {
        Document {
            definitions: vec![Definition::Operation(OperationDefinition {
                operation: self.operation,
                name: self.name,
                variable_definitions: self.variable_definitions,
                selection_set: SelectionSet {
                    selections: self.selections,
                },
            })],
        }
    }
}

pub struct FieldBuilder {
    alias: Option<String>,
    name: String,
    arguments: Vec<Argument>,
    selections: Vec<Selection>,
}

impl FieldBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Pass a declared operation variable as an argument: `field(name: $var)`.
    pub fn arg_var(mut self, name: impl Into<String>, variable: impl Into<String>) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value: ArgumentValue::Variable(variable.into()),
        });
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value: ArgumentValue::Literal(value),
        });
        self
    }

    /// Select a leaf sub-field.
    pub fn select(mut self, name: impl Into<String>) -> Self {
        self.selections.push(Selection::Field(field(name).build()));
        self
    }

    /// Select a nested sub-field built separately.
    pub fn select_field(mut self, field: FieldBuilder) -> Self {
        self.selections.push(Selection::Field(field.build()));
        self
    }

    pub fn build(self) -> Field {
        Field {
            alias: self.alias,
            name: self.name,
            arguments: self.arguments,
            selection_set: if self.selections.is_empty() {
                None
            } else {
                Some(SelectionSet {
                    selections: self.selections,
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_mutation_with_variables_and_arguments() {
        let doc = mutation()
            .name("UpdateUser")
            .variable("id", TypeRef::named("ID").non_null())
            .variable_with_default("role", TypeRef::named("Role"), json!("member"))
            .field(
                field("updateUser")
                    .arg_var("id", "id")
                    .arg("audit", json!(true))
                    .select("id")
                    .select("name"),
            )
            .build();

        let op = match &doc.definitions[0] {
            Definition::Operation(op) => op,
            other => panic!("expected operation, got {other:?}"),
        };
        assert_eq!(op.operation, OperationKind::Mutation);
        assert_eq!(op.name.as_deref(), Some("UpdateUser"));
        assert_eq!(op.variable_definitions.len(), 2);
        assert_eq!(op.variable_definitions[1].default_value, Some(json!("member")));

        let field = match &op.selection_set.selections[0] {
            Selection::Field(f) => f,
            other => panic!("expected field, got {other:?}"),
        };
        assert_eq!(field.name, "updateUser");
        assert_eq!(field.arguments.len(), 2);
        assert_eq!(
            field.arguments[0].value,
            ArgumentValue::Variable("id".into())
        );
        assert_eq!(
            field.selection_set.as_ref().unwrap().selections.len(),
            2
        );
    }

    #[test]
    fn leaf_field_has_no_selection_set() {
        let f = field("name").build();
        assert!(f.selection_set.is_none());
        assert_eq!(f.response_key(), "name");
    }
}
