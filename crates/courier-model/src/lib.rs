//! Reflective type model for Courier messages.
//!
//! This crate contains:
//! - Type descriptors (`TypeKind`, `TypeDescriptor`, enum/struct/container descriptors)
//! - Lazy descriptor providers used to break schema reference cycles
//! - The generic value model (`Value`, discipline-aware sets and maps)
//! - The message/builder protocol (`Message`, `MessageBuilder`)
//!
//! Descriptors and messages are immutable and freely shareable across threads.
//! Builders are transient single-writer staging objects, consumed once by
//! [`MessageBuilder::build`].

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod kind;
pub mod message;
pub mod provider;
pub mod value;

#[cfg(test)]
mod test_support;


// Re-export commonly used items at crate root
pub use builder::MessageBuilder;
pub use descriptor::{
    CollectionOrder, EnumDescriptor, Field, ListDescriptor, MapDescriptor, MessageVariant,
    Requirement, SetDescriptor, StructDescriptor, TypeDescriptor,
};
pub use error::{DefinitionError, ValidationError};
pub use kind::TypeKind;
pub use message::Message;
pub use provider::DescriptorProvider;
pub use value::{EnumValue, MapValue, SetValue, Value};
