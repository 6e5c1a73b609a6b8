//! Compact big-endian binary format.
//!
//! A message is a sequence of `(kind, key, value)` field entries closed by
//! a single `0x00` byte; kind tags reuse the [`TypeKind`] discriminants, so
//! `0` is free to terminate the field list. Values are self-describing
//! enough to skip: unknown keys are passed over structurally and dropped,
//! which is what makes schema evolution work in both directions.

use std::io::{Read, Write};
use std::sync::Arc;

use courier_model::{
    EnumValue, MapValue, Message, SetValue, StructDescriptor, TypeDescriptor, TypeKind, Value,
};

use crate::codec::Codec;
use crate::error::{DecodeError, EncodeError};

/// The binary codec. Stateless; one shared instance serves any number of
/// concurrent calls.
#[derive(Clone, Copy, Default, Debug)]
pub struct BinaryCodec;

impl BinaryCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for BinaryCodec {
    fn serialize(&self, out: &mut dyn Write, message: &Message) -> Result<usize, EncodeError> {
        let mut buffer = Vec::new();
        encode_message(&mut buffer, message)?;
        out.write_all(&buffer)?;
        Ok(buffer.len())
    }

    fn deserialize(
        &self,
        input: &mut dyn Read,
        descriptor: &Arc<StructDescriptor>,
    ) -> Result<Message, DecodeError> {
        decode_message(input, descriptor)
    }
}

fn encode_message(out: &mut Vec<u8>, message: &Message) -> Result<(), EncodeError> {
    let descriptor = message.descriptor();
    for (position, field) in descriptor.fields().iter().enumerate() {
        let Some(value) = message.stored_at(position) else {
            continue;
        };
        out.push(value.kind() as u8);
        out.extend_from_slice(&field.key().to_be_bytes());
        encode_value(out, value)?;
    }
    out.push(0);
    Ok(())
}

fn encode_value(out: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Bool(v) => out.push(u8::from(*v)),
        Value::Byte(v) => out.push(*v as u8),
        Value::I16(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::I32(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::I64(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Double(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
        Value::String(v) => encode_blob(out, v.as_bytes()),
        Value::Binary(v) => encode_blob(out, v),
        Value::Enum(v) => out.extend_from_slice(&v.value().to_be_bytes()),
        Value::List(items) => {
            encode_sequence(out, items.len(), items.iter())?;
        }
        Value::Set(set) => {
            encode_sequence(out, set.len(), set.iter())?;
        }
        Value::Map(map) => {
            let (key_tag, value_tag) = map
                .iter()
                .next()
                .map(|(k, v)| (k.kind() as u8, v.kind() as u8))
                .unwrap_or((TypeKind::Bool as u8, TypeKind::Bool as u8));
            out.push(key_tag);
            out.push(value_tag);
            out.extend_from_slice(&(map.len() as u32).to_be_bytes());
            for (key, value) in map.iter() {
                encode_value(out, key)?;
                encode_value(out, value)?;
            }
        }
        Value::Message(message) => encode_message(out, message)?,
    }
    Ok(())
}

fn encode_blob(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn encode_sequence<'a>(
    out: &mut Vec<u8>,
    len: usize,
    items: impl Iterator<Item = &'a Value>,
) -> Result<(), EncodeError> {
    let mut items = items.peekable();
    // Placeholder tag for empty containers; readers skip the check at count 0.
    let tag = items
        .peek()
        .map(|v| v.kind() as u8)
        .unwrap_or(TypeKind::Bool as u8);
    out.push(tag);
    out.extend_from_slice(&(len as u32).to_be_bytes());
    for item in items {
        encode_value(out, item)?;
    }
    Ok(())
}

fn decode_message(
    input: &mut dyn Read,
    descriptor: &Arc<StructDescriptor>,
) -> Result<Message, DecodeError> {
    let mut builder = descriptor.builder();
    loop {
        let tag = read_u8(input, "reading field kind")?;
        if tag == 0 {
            break;
        }
        let wire_kind = TypeKind::from_u8(tag).ok_or(DecodeError::UnknownWireKind { tag })?;
        let key = u16::from_be_bytes(read_array(input, "reading field key")?);
        match descriptor.field_by_key(key) {
            Some(field) => {
                let declared = field.descriptor()?;
                if !wire_compatible(wire_kind, declared.kind()) {
                    return Err(DecodeError::WireKindMismatch {
                        field: format!("{}.{}", descriptor.qualified_name(), field.name()),
                        expected: declared.kind(),
                        found: wire_kind,
                    });
                }
                let value = decode_value(input, wire_kind, &declared)?;
                builder.set(key, value)?;
            }
            None => skip_value(input, wire_kind)?,
        }
    }
    Ok(builder.build()?)
}

/// A wire kind satisfies a declared kind when they are equal; the message
/// family (struct, union, exception) is interchangeable on the wire.
fn wire_compatible(wire: TypeKind, declared: TypeKind) -> bool {
    wire == declared || (wire.is_message() && declared.is_message())
}

fn decode_value(
    input: &mut dyn Read,
    wire_kind: TypeKind,
    declared: &TypeDescriptor,
) -> Result<Value, DecodeError> {
    match declared {
        TypeDescriptor::Bool => Ok(Value::Bool(read_u8(input, "reading bool")? != 0)),
        TypeDescriptor::Byte => Ok(Value::Byte(read_u8(input, "reading byte")? as i8)),
        TypeDescriptor::I16 => Ok(Value::I16(i16::from_be_bytes(read_array(
            input,
            "reading i16",
        )?))),
        TypeDescriptor::I32 => Ok(Value::I32(i32::from_be_bytes(read_array(
            input,
            "reading i32",
        )?))),
        TypeDescriptor::I64 => Ok(Value::I64(i64::from_be_bytes(read_array(
            input,
            "reading i64",
        )?))),
        TypeDescriptor::Double => Ok(Value::Double(f64::from_bits(u64::from_be_bytes(
            read_array(input, "reading double")?,
        )))),
        TypeDescriptor::String => {
            let bytes = read_blob(input, "reading string")?;
            String::from_utf8(bytes)
                .map(Value::String)
                .map_err(|_| DecodeError::InvalidUtf8 {
                    context: "reading string",
                })
        }
        TypeDescriptor::Binary => Ok(Value::Binary(read_blob(input, "reading binary")?)),
        TypeDescriptor::Enum(descriptor) => {
            let value = i32::from_be_bytes(read_array(input, "reading enum")?);
            EnumValue::from_value(descriptor, value)
                .map(Value::Enum)
                .ok_or(DecodeError::UnknownEnumValue {
                    value,
                    enum_name: descriptor.qualified_name(),
                })
        }
        TypeDescriptor::List(list) => {
            let item = list.item()?;
            let (item_kind, count) = read_sequence_header(input, &item, "reading list header")?;
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                items.push(decode_value(input, item_kind, &item)?);
            }
            Ok(Value::List(items))
        }
        TypeDescriptor::Set(set) => {
            let item = set.item()?;
            let (item_kind, count) = read_sequence_header(input, &item, "reading set header")?;
            let mut items = SetValue::new(set.order());
            for _ in 0..count {
                items.insert(decode_value(input, item_kind, &item)?);
            }
            Ok(Value::Set(items))
        }
        TypeDescriptor::Map(map) => {
            let key = map.key()?;
            let value = map.value()?;
            let key_kind = read_element_kind(input, "reading map key kind")?;
            let value_kind = read_element_kind(input, "reading map value kind")?;
            let count = u32::from_be_bytes(read_array(input, "reading map length")?);
            if count > 0 {
                check_element_kind(key_kind, &key, "reading map key kind")?;
                check_element_kind(value_kind, &value, "reading map value kind")?;
            }
            let mut entries = MapValue::new(map.order());
            for _ in 0..count {
                let entry_key = decode_value(input, key_kind, &key)?;
                let entry_value = decode_value(input, value_kind, &value)?;
                entries.insert(entry_key, entry_value);
            }
            Ok(Value::Map(entries))
        }
        TypeDescriptor::Message(child) => Ok(Value::Message(decode_message(input, child)?)),
    }
    .map(|value| {
        debug_assert!(wire_compatible(wire_kind, value.kind()));
        value
    })
}

fn read_sequence_header(
    input: &mut dyn Read,
    item: &TypeDescriptor,
    context: &'static str,
) -> Result<(TypeKind, usize), DecodeError> {
    let item_kind = read_element_kind(input, context)?;
    let count = u32::from_be_bytes(read_array(input, context)?);
    // An empty container carries a placeholder element tag; the tag only has
    // to match the declared kind when elements follow.
    if count > 0 {
        check_element_kind(item_kind, item, context)?;
    }
    Ok((item_kind, count as usize))
}

fn read_element_kind(
    input: &mut dyn Read,
    context: &'static str,
) -> Result<TypeKind, DecodeError> {
    let tag = read_u8(input, context)?;
    TypeKind::from_u8(tag).ok_or(DecodeError::UnknownWireKind { tag })
}

fn check_element_kind(
    found: TypeKind,
    declared: &TypeDescriptor,
    context: &'static str,
) -> Result<(), DecodeError> {
    if wire_compatible(found, declared.kind()) {
        Ok(())
    } else {
        Err(DecodeError::WireKindMismatch {
            field: context.to_owned(),
            expected: declared.kind(),
            found,
        })
    }
}

/// Pass over one value of the given wire kind without materializing it.
fn skip_value(input: &mut dyn Read, kind: TypeKind) -> Result<(), DecodeError> {
    match kind {
        TypeKind::Bool | TypeKind::Byte => skip_bytes(input, 1),
        TypeKind::I16 => skip_bytes(input, 2),
        TypeKind::I32 | TypeKind::Enum => skip_bytes(input, 4),
        TypeKind::I64 | TypeKind::Double => skip_bytes(input, 8),
        TypeKind::String | TypeKind::Binary => {
            let len = u32::from_be_bytes(read_array(input, "skipping blob")?);
            skip_bytes(input, len as usize)
        }
        TypeKind::List | TypeKind::Set => {
            let tag = read_u8(input, "skipping sequence")?;
            let item = TypeKind::from_u8(tag).ok_or(DecodeError::UnknownWireKind { tag })?;
            let count = u32::from_be_bytes(read_array(input, "skipping sequence")?);
            for _ in 0..count {
                skip_value(input, item)?;
            }
            Ok(())
        }
        TypeKind::Map => {
            let key_tag = read_u8(input, "skipping map")?;
            let key = TypeKind::from_u8(key_tag)
                .ok_or(DecodeError::UnknownWireKind { tag: key_tag })?;
            let value_tag = read_u8(input, "skipping map")?;
            let value = TypeKind::from_u8(value_tag)
                .ok_or(DecodeError::UnknownWireKind { tag: value_tag })?;
            let count = u32::from_be_bytes(read_array(input, "skipping map")?);
            for _ in 0..count {
                skip_value(input, key)?;
                skip_value(input, value)?;
            }
            Ok(())
        }
        TypeKind::Struct | TypeKind::Union | TypeKind::Exception => loop {
            let tag = read_u8(input, "skipping message")?;
            if tag == 0 {
                return Ok(());
            }
            let field = TypeKind::from_u8(tag).ok_or(DecodeError::UnknownWireKind { tag })?;
            skip_bytes(input, 2)?;
            skip_value(input, field)?;
        },
    }
}

fn skip_bytes(input: &mut dyn Read, len: usize) -> Result<(), DecodeError> {
    let copied = std::io::copy(&mut input.take(len as u64), &mut std::io::sink())
        .map_err(DecodeError::Io)?;
    if copied as usize != len {
        return Err(DecodeError::Truncated {
            context: "skipping value",
        });
    }
    Ok(())
}

fn read_blob(input: &mut dyn Read, context: &'static str) -> Result<Vec<u8>, DecodeError> {
    let len = u32::from_be_bytes(read_array(input, context)?) as usize;
    let mut bytes = vec![0; len];
    read_exact(input, &mut bytes, context)?;
    Ok(bytes)
}

fn read_u8(input: &mut dyn Read, context: &'static str) -> Result<u8, DecodeError> {
    let mut byte = [0u8; 1];
    read_exact(input, &mut byte, context)?;
    Ok(byte[0])
}

fn read_array<const N: usize>(
    input: &mut dyn Read,
    context: &'static str,
) -> Result<[u8; N], DecodeError> {
    let mut bytes = [0u8; N];
    read_exact(input, &mut bytes, context)?;
    Ok(bytes)
}

fn read_exact(
    input: &mut dyn Read,
    buffer: &mut [u8],
    context: &'static str,
) -> Result<(), DecodeError> {
    input.read_exact(buffer).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => DecodeError::Truncated { context },
        _ => DecodeError::Io(e),
    })
}
