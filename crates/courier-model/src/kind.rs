//! Canonical type kind definitions.
//!
//! Every descriptor, value and wire token maps back to one of these kinds.
//! The discriminants double as the binary codec's wire tags; 0 is reserved
//! as the field-list terminator and is never a valid kind.

/// Semantic type kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum TypeKind {
    Bool = 1,
    Byte = 2,
    I16 = 3,
    I32 = 4,
    I64 = 5,
    Double = 6,
    String = 7,
    Binary = 8,
    Enum = 9,
    List = 10,
    Set = 11,
    Map = 12,
    /// Record with independent named fields.
    Struct = 13,
    /// Tagged choice - exactly one field present at a time.
    Union = 14,
    /// Struct variant used for error payloads.
    Exception = 15,
}

impl TypeKind {
    /// Convert from raw discriminant.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Bool),
            2 => Some(Self::Byte),
            3 => Some(Self::I16),
            4 => Some(Self::I32),
            5 => Some(Self::I64),
            6 => Some(Self::Double),
            7 => Some(Self::String),
            8 => Some(Self::Binary),
            9 => Some(Self::Enum),
            10 => Some(Self::List),
            11 => Some(Self::Set),
            12 => Some(Self::Map),
            13 => Some(Self::Struct),
            14 => Some(Self::Union),
            15 => Some(Self::Exception),
            _ => None,
        }
    }

    /// Whether this is a fixed-width scalar kind (bool through double).
    ///
    /// These are the kinds whose `Default`-tier fields get a materialized
    /// default value in a fresh builder.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Byte | Self::I16 | Self::I32 | Self::I64 | Self::Double
        )
    }

    /// Whether this is an integral numeric kind.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::I16 | Self::I32 | Self::I64)
    }

    /// Whether this is a container kind (list, set, map).
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }

    /// Whether this is a message kind (struct, union, exception).
    ///
    /// Message kinds share one descriptor shape and are wire-compatible
    /// with each other.
    pub fn is_message(self) -> bool {
        matches!(self, Self::Struct | Self::Union | Self::Exception)
    }

    /// Lower-case display name, matching the schema language keywords.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Enum => "enum",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Exception => "exception",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
