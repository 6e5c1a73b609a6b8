//! Recursive-descent value reader shared by the text formats.
//!
//! One token and the *current* descriptor node drive every step; there is
//! no intermediate untyped tree. The JSON and pretty codecs both decode
//! through here.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use courier_model::{
    EnumDescriptor, EnumValue, MapValue, Message, SetValue, StructDescriptor, TypeDescriptor,
    TypeKind, Value,
};

use super::lexer::{Token, TokenKind, Tokenizer, unquote};
use crate::error::DecodeError;

/// Decode one message from the token stream; the opening brace is read
/// here.
pub(crate) fn read_message(
    tokens: &mut Tokenizer<'_>,
    descriptor: &Arc<StructDescriptor>,
) -> Result<Message, DecodeError> {
    let open = tokens.expect("parsing message start")?;
    if open.kind != TokenKind::BraceOpen {
        return Err(DecodeError::UnexpectedToken {
            token: open.text.to_owned(),
            context: "parsing message start",
        });
    }
    read_fields(tokens, descriptor)
}

/// Decode the field list of a message; the opening brace has already been
/// consumed.
fn read_fields(
    tokens: &mut Tokenizer<'_>,
    descriptor: &Arc<StructDescriptor>,
) -> Result<Message, DecodeError> {
    let mut builder = descriptor.builder();
    let mut token = tokens.expect("parsing message field")?;
    while token.kind != TokenKind::BraceClose {
        let name = match token.kind {
            TokenKind::Identifier => token.text.to_owned(),
            TokenKind::String => unquote(token.text)?,
            _ => {
                return Err(DecodeError::UnexpectedToken {
                    token: token.text.to_owned(),
                    context: "parsing message field",
                });
            }
        };
        let field = descriptor
            .field_by_name(&name)
            .ok_or_else(|| DecodeError::UnknownField {
                name,
                type_name: descriptor.qualified_name(),
            })?;
        let key = field.key();
        let declared = field.descriptor()?;
        tokens.expect_symbol(TokenKind::Colon, "parsing field separator")?;
        let value_token = tokens.expect("parsing field value")?;
        let value = read_value(tokens, value_token, &declared)?;
        builder.set(key, value)?;

        token = tokens.expect("parsing message entry separator")?;
        if token.kind == TokenKind::Comma {
            token = tokens.expect("parsing message field")?;
        } else if token.kind != TokenKind::BraceClose {
            return Err(DecodeError::UnexpectedToken {
                token: token.text.to_owned(),
                context: "parsing message entry separator",
            });
        }
    }
    Ok(builder.build()?)
}

/// Decode one value of the given descriptor; `token` is its first token.
fn read_value(
    tokens: &mut Tokenizer<'_>,
    token: Token<'_>,
    descriptor: &TypeDescriptor,
) -> Result<Value, DecodeError> {
    match descriptor {
        TypeDescriptor::Bool => read_bool(&token),
        TypeDescriptor::Byte => Ok(Value::Byte(read_integer(&token, "byte")? as i8)),
        TypeDescriptor::I16 => Ok(Value::I16(read_integer(&token, "i16")? as i16)),
        TypeDescriptor::I32 => Ok(Value::I32(read_integer(&token, "i32")? as i32)),
        TypeDescriptor::I64 => Ok(Value::I64(read_integer(&token, "i64")?)),
        TypeDescriptor::Double => read_double(&token),
        TypeDescriptor::String => match token.kind {
            TokenKind::String => Ok(Value::String(unquote(token.text)?)),
            _ => Err(DecodeError::InvalidLiteral {
                token: token.text.to_owned(),
                expected: "string",
            }),
        },
        TypeDescriptor::Binary => match token.kind {
            TokenKind::String => decode_base64(&unquote(token.text)?),
            _ => Err(DecodeError::InvalidLiteral {
                token: token.text.to_owned(),
                expected: "binary",
            }),
        },
        TypeDescriptor::Enum(descriptor) => read_enum(&token, descriptor),
        TypeDescriptor::List(list) => {
            let item = list.item()?;
            let mut items = Vec::new();
            read_bracketed(tokens, token, "parsing list item", |tokens, token| {
                items.push(read_value(tokens, token, &item)?);
                Ok(())
            })?;
            Ok(Value::List(items))
        }
        TypeDescriptor::Set(set) => {
            let item = set.item()?;
            let mut items = SetValue::new(set.order());
            read_bracketed(tokens, token, "parsing set item", |tokens, token| {
                items.insert(read_value(tokens, token, &item)?);
                Ok(())
            })?;
            Ok(Value::Set(items))
        }
        TypeDescriptor::Map(map) => {
            if token.kind != TokenKind::BraceOpen {
                return Err(DecodeError::UnexpectedToken {
                    token: token.text.to_owned(),
                    context: "parsing map start",
                });
            }
            let key_descriptor = map.key()?;
            let value_descriptor = map.value()?;
            let mut entries = MapValue::new(map.order());
            let mut token = tokens.expect("parsing map key")?;
            while token.kind != TokenKind::BraceClose {
                let key = read_map_key(&token, &key_descriptor)?;
                tokens.expect_symbol(TokenKind::Colon, "parsing map entry")?;
                let value_token = tokens.expect("parsing map value")?;
                let value = read_value(tokens, value_token, &value_descriptor)?;
                entries.insert(key, value);

                token = tokens.expect("parsing map entry separator")?;
                if token.kind == TokenKind::Comma {
                    token = tokens.expect("parsing map key")?;
                } else if token.kind != TokenKind::BraceClose {
                    return Err(DecodeError::UnexpectedToken {
                        token: token.text.to_owned(),
                        context: "parsing map entry separator",
                    });
                }
            }
            Ok(Value::Map(entries))
        }
        TypeDescriptor::Message(child) => {
            if token.kind != TokenKind::BraceOpen {
                return Err(DecodeError::UnexpectedToken {
                    token: token.text.to_owned(),
                    context: "parsing message start",
                });
            }
            Ok(Value::Message(read_fields(tokens, child)?))
        }
    }
}

/// `[` was the given token; consume elements and the closing `]`.
fn read_bracketed(
    tokens: &mut Tokenizer<'_>,
    open: Token<'_>,
    context: &'static str,
    mut element: impl FnMut(&mut Tokenizer<'_>, Token<'_>) -> Result<(), DecodeError>,
) -> Result<(), DecodeError> {
    if open.kind != TokenKind::BracketOpen {
        return Err(DecodeError::UnexpectedToken {
            token: open.text.to_owned(),
            context,
        });
    }
    let mut token = tokens.expect(context)?;
    while token.kind != TokenKind::BracketClose {
        element(tokens, token)?;
        token = tokens.expect("parsing element separator")?;
        if token.kind == TokenKind::Comma {
            token = tokens.expect(context)?;
        } else if token.kind != TokenKind::BracketClose {
            return Err(DecodeError::UnexpectedToken {
                token: token.text.to_owned(),
                context: "parsing element separator",
            });
        }
    }
    Ok(())
}

fn read_bool(token: &Token<'_>) -> Result<Value, DecodeError> {
    match (token.kind, token.text) {
        (TokenKind::Identifier, "true") | (TokenKind::Number, "1") => Ok(Value::Bool(true)),
        (TokenKind::Identifier, "false") | (TokenKind::Number, "0") => Ok(Value::Bool(false)),
        _ => Err(DecodeError::InvalidLiteral {
            token: token.text.to_owned(),
            expected: "bool",
        }),
    }
}

fn read_integer(token: &Token<'_>, expected: &'static str) -> Result<i64, DecodeError> {
    if !token.is_integral() {
        return Err(DecodeError::InvalidLiteral {
            token: token.text.to_owned(),
            expected,
        });
    }
    let value: i64 = token.text.parse().map_err(|_| DecodeError::InvalidLiteral {
        token: token.text.to_owned(),
        expected,
    })?;
    let in_range = match expected {
        "byte" => i8::try_from(value).is_ok(),
        "i16" => i16::try_from(value).is_ok(),
        "i32" => i32::try_from(value).is_ok(),
        _ => true,
    };
    if !in_range {
        return Err(DecodeError::InvalidLiteral {
            token: token.text.to_owned(),
            expected,
        });
    }
    Ok(value)
}

fn read_double(token: &Token<'_>) -> Result<Value, DecodeError> {
    let invalid = || DecodeError::InvalidLiteral {
        token: token.text.to_owned(),
        expected: "double",
    };
    // NaN and the infinities are written as quoted strings; `f64::from_str`
    // accepts those spellings.
    let unquoted;
    let text = match token.kind {
        TokenKind::Number => token.text,
        TokenKind::String => {
            unquoted = unquote(token.text)?;
            unquoted.as_str()
        }
        _ => return Err(invalid()),
    };
    text.parse().map(Value::Double).map_err(|_| invalid())
}

fn read_enum(token: &Token<'_>, descriptor: &Arc<EnumDescriptor>) -> Result<Value, DecodeError> {
    match token.kind {
        TokenKind::Identifier => enum_by_name(descriptor, token.text),
        TokenKind::String => enum_by_name(descriptor, &unquote(token.text)?),
        TokenKind::Number if token.is_integral() => {
            let value: i32 = token.text.parse().map_err(|_| DecodeError::InvalidLiteral {
                token: token.text.to_owned(),
                expected: "enum",
            })?;
            EnumValue::from_value(descriptor, value)
                .map(Value::Enum)
                .ok_or(DecodeError::UnknownEnumValue {
                    value,
                    enum_name: descriptor.qualified_name(),
                })
        }
        _ => Err(DecodeError::InvalidLiteral {
            token: token.text.to_owned(),
            expected: "enum",
        }),
    }
}

fn enum_by_name(descriptor: &Arc<EnumDescriptor>, name: &str) -> Result<Value, DecodeError> {
    EnumValue::from_name(descriptor, name)
        .map(Value::Enum)
        .ok_or_else(|| DecodeError::UnknownEnumName {
            name: name.to_owned(),
            enum_name: descriptor.qualified_name(),
        })
}

/// Map keys relax strict object syntax: kinds that are not naturally
/// quoted literals (numbers, booleans, enum names) may appear unquoted,
/// while string and binary keys must stay quoted.
fn read_map_key(token: &Token<'_>, descriptor: &TypeDescriptor) -> Result<Value, DecodeError> {
    match token.kind {
        TokenKind::String => parse_key_text(&unquote(token.text)?, descriptor),
        TokenKind::Number | TokenKind::Identifier => {
            if matches!(descriptor.kind(), TypeKind::String | TypeKind::Binary) {
                return Err(DecodeError::UnquotedStringKey {
                    kind: descriptor.kind(),
                    token: token.text.to_owned(),
                });
            }
            parse_key_text(token.text, descriptor)
        }
        _ => Err(DecodeError::UnexpectedToken {
            token: token.text.to_owned(),
            context: "parsing map key",
        }),
    }
}

/// Parse a map key from its textual form, quoted or not.
fn parse_key_text(text: &str, descriptor: &TypeDescriptor) -> Result<Value, DecodeError> {
    let invalid = |expected: &'static str| DecodeError::InvalidLiteral {
        token: text.to_owned(),
        expected,
    };
    match descriptor {
        TypeDescriptor::Bool => match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid("bool")),
        },
        TypeDescriptor::Byte => text.parse().map(Value::Byte).map_err(|_| invalid("byte")),
        TypeDescriptor::I16 => text.parse().map(Value::I16).map_err(|_| invalid("i16")),
        TypeDescriptor::I32 => text.parse().map(Value::I32).map_err(|_| invalid("i32")),
        TypeDescriptor::I64 => text.parse().map(Value::I64).map_err(|_| invalid("i64")),
        TypeDescriptor::Double => text.parse().map(Value::Double).map_err(|_| invalid("double")),
        TypeDescriptor::String => Ok(Value::String(text.to_owned())),
        TypeDescriptor::Binary => decode_base64(text),
        TypeDescriptor::Enum(descriptor) => {
            if let Ok(value) = text.parse::<i32>() {
                EnumValue::from_value(descriptor, value)
                    .map(Value::Enum)
                    .ok_or(DecodeError::UnknownEnumValue {
                        value,
                        enum_name: descriptor.qualified_name(),
                    })
            } else {
                enum_by_name(descriptor, text)
            }
        }
        _ => Err(invalid("primitive map key")),
    }
}

fn decode_base64(text: &str) -> Result<Value, DecodeError> {
    BASE64
        .decode(text)
        .map(Value::Binary)
        .map_err(|_| DecodeError::InvalidLiteral {
            token: text.to_owned(),
            expected: "base64 binary",
        })
}
