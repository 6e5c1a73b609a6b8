//! Typed encode/decode failures.

use std::io;

use courier_model::{DefinitionError, TypeKind, ValidationError};

/// A structural violation while decoding. Carries the offending token or
/// wire detail plus a human-readable context phrase; a failed decode of any
/// sub-value aborts the whole top-level decode without leaking partial
/// state.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input while {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unexpected token `{token}` while {context}")]
    UnexpectedToken {
        token: String,
        context: &'static str,
    },

    #[error("`{token}` is not a valid {expected} value")]
    InvalidLiteral { token: String, expected: &'static str },

    #[error("not a valid field name: `{name}` in {type_name}")]
    UnknownField { name: String, type_name: String },

    #[error("`{name}` is not a member of {enum_name}")]
    UnknownEnumName { name: String, enum_name: String },

    #[error("{value} is not a member value of {enum_name}")]
    UnknownEnumValue { value: i32, enum_name: String },

    #[error("expected quoted literal for {kind} map key, got `{token}`")]
    UnquotedStringKey { kind: TypeKind, token: String },

    #[error("unknown wire kind tag {tag:#04x}")]
    UnknownWireKind { tag: u8 },

    #[error("field {field} declared as {expected}, wire carries {found}")]
    WireKindMismatch {
        field: String,
        expected: TypeKind,
        found: TypeKind,
    },

    #[error("invalid utf-8 while {context}")]
    InvalidUtf8 { context: &'static str },

    #[error("truncated input while {context}")]
    Truncated { context: &'static str },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// An encode-side failure. Invalid messages are unrepresentable once built,
/// so in practice this surfaces sink I/O problems and unresolvable schema
/// references.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
