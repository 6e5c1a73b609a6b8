//! Styled text rendering shared by the JSON and pretty codecs.
//!
//! One writer walks the message; a [`TextStyle`] decides indentation and
//! quoting, which is the entire difference between the two text formats.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use courier_model::{Message, TypeKind, Value};

use super::lexer::quote;

/// Output styling knobs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    /// Per-level indent; `None` renders everything on one line.
    pub indent: Option<&'static str>,
    /// Quote field names and enum member names. On for JSON so the output
    /// stays valid JSON, off for the pretty format.
    pub quote_names: bool,
    /// Emit a space after `:` and `,` separators.
    pub space_after_separators: bool,
}

pub(crate) const JSON_COMPACT: TextStyle = TextStyle {
    indent: None,
    quote_names: true,
    space_after_separators: false,
};

pub(crate) const JSON_PRETTY: TextStyle = TextStyle {
    indent: Some("  "),
    quote_names: true,
    space_after_separators: true,
};

pub(crate) const PRETTY: TextStyle = TextStyle {
    indent: Some("  "),
    quote_names: false,
    space_after_separators: true,
};

/// Render a whole message in the given style.
pub(crate) fn write_message(message: &Message, style: TextStyle) -> String {
    let mut writer = TextWriter {
        out: String::new(),
        style,
        depth: 0,
    };
    writer.message(message);
    writer.out
}

struct TextWriter {
    out: String,
    style: TextStyle,
    depth: usize,
}

impl TextWriter {
    fn message(&mut self, message: &Message) {
        let descriptor = message.descriptor();
        let mut entries = 0;
        self.out.push('{');
        self.depth += 1;
        for (position, field) in descriptor.fields().iter().enumerate() {
            let Some(value) = message.stored_at(position) else {
                continue;
            };
            self.entry_separator(entries);
            entries += 1;
            self.name(field.name());
            self.colon();
            self.value(value);
        }
        self.depth -= 1;
        if entries > 0 {
            self.newline();
        }
        self.out.push('}');
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Bool(v) => self.push_display(v),
            Value::Byte(v) => self.push_display(v),
            Value::I16(v) => self.push_display(v),
            Value::I32(v) => self.push_display(v),
            Value::I64(v) => self.push_display(v),
            Value::Double(v) => self.double(*v),
            Value::String(v) => self.out.push_str(&quote(v)),
            Value::Binary(v) => self.out.push_str(&quote(&BASE64.encode(v))),
            Value::Enum(v) => self.name(v.name()),
            Value::List(items) => {
                self.bracketed(items.len(), |writer, i| writer.value(&items[i]));
            }
            Value::Set(set) => {
                let items: Vec<_> = set.iter().collect();
                self.bracketed(items.len(), |writer, i| writer.value(items[i]));
            }
            Value::Map(map) => {
                let mut entries = 0;
                self.out.push('{');
                self.depth += 1;
                for (key, value) in map.iter() {
                    self.entry_separator(entries);
                    entries += 1;
                    self.map_key(key);
                    self.colon();
                    self.value(value);
                }
                self.depth -= 1;
                if entries > 0 {
                    self.newline();
                }
                self.out.push('}');
            }
            Value::Message(message) => self.message(message),
        }
    }

    /// Map keys are quoted when the style quotes names (keeping JSON valid
    /// for every key kind) and always for string and binary keys.
    fn map_key(&mut self, key: &Value) {
        match key {
            Value::String(_) | Value::Binary(_) => self.value(key),
            Value::Enum(v) => self.name(v.name()),
            // Non-finite doubles come out quoted already.
            Value::Double(v) if !v.is_finite() => self.double(*v),
            other if self.style.quote_names => {
                self.out.push('"');
                self.bare_scalar(other);
                self.out.push('"');
            }
            other => self.bare_scalar(other),
        }
    }

    fn bare_scalar(&mut self, value: &Value) {
        match value {
            Value::Bool(v) => self.push_display(v),
            Value::Byte(v) => self.push_display(v),
            Value::I16(v) => self.push_display(v),
            Value::I32(v) => self.push_display(v),
            Value::I64(v) => self.push_display(v),
            Value::Double(v) => self.push_display(v),
            _ => self.value(value),
        }
    }

    fn bracketed(&mut self, len: usize, mut element: impl FnMut(&mut Self, usize)) {
        self.out.push('[');
        self.depth += 1;
        for i in 0..len {
            self.entry_separator(i);
            element(self, i);
        }
        self.depth -= 1;
        if len > 0 {
            self.newline();
        }
        self.out.push(']');
    }

    /// Finite doubles print bare; NaN and the infinities have no numeric
    /// literal in the grammar, so they travel as quoted strings.
    fn double(&mut self, value: f64) {
        if value.is_finite() {
            self.push_display(value);
        } else if value.is_nan() {
            self.out.push_str("\"NaN\"");
        } else if value > 0.0 {
            self.out.push_str("\"Infinity\"");
        } else {
            self.out.push_str("\"-Infinity\"");
        }
    }

    fn name(&mut self, name: &str) {
        if self.style.quote_names {
            self.out.push_str(&quote(name));
        } else {
            self.out.push_str(name);
        }
    }

    fn colon(&mut self) {
        self.out.push(':');
        if self.style.space_after_separators {
            self.out.push(' ');
        }
    }

    fn entry_separator(&mut self, entries_so_far: usize) {
        if entries_so_far > 0 {
            self.out.push(',');
            if self.style.indent.is_none() && self.style.space_after_separators {
                self.out.push(' ');
            }
        }
        self.newline();
    }

    fn newline(&mut self) {
        if let Some(indent) = self.style.indent {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str(indent);
            }
        }
    }

    fn push_display(&mut self, value: impl std::fmt::Display) {
        self.out.push_str(&value.to_string());
    }
}
