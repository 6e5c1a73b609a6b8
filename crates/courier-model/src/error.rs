//! Error types for schema definition and message validation.

use crate::kind::TypeKind;

/// Defect in a schema definition. Fatal at construction time, never
/// recovered automatically.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DefinitionError {
    #[error("cyclic type reference while resolving `{context}`")]
    CyclicReference { context: String },

    #[error("field key 0 is reserved: {type_name}.{field}")]
    ReservedKey { type_name: String, field: String },

    #[error("duplicate field key {key} in {type_name}")]
    DuplicateKey { key: u16, type_name: String },

    #[error("duplicate field name `{name}` in {type_name}")]
    DuplicateFieldName { name: String, type_name: String },

    #[error("duplicate enum value {value} in {enum_name}")]
    DuplicateEnumValue { value: i32, enum_name: String },

    #[error("duplicate enum member `{name}` in {enum_name}")]
    DuplicateEnumName { name: String, enum_name: String },
}

/// Invalid message content, surfaced by builder mutation and
/// [`build`](crate::MessageBuilder::build). Recoverable by the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields in {type_name}: {}", missing.join(", "))]
    MissingRequired {
        type_name: String,
        missing: Vec<String>,
    },

    #[error("union {type_name} must have exactly one field set, found {found}")]
    UnionCardinality { type_name: String, found: usize },

    #[error("cannot assign {found} value to {type_name}.{field} declared as {expected}")]
    WrongKind {
        type_name: String,
        field: String,
        expected: TypeKind,
        found: TypeKind,
    },

    #[error("{type_name}.{field} is not a message field")]
    NotAMessage { type_name: String, field: String },

    #[error("{type_name}.{field} is not a container field (declared {expected})")]
    NotAContainer {
        type_name: String,
        field: String,
        expected: TypeKind,
    },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
