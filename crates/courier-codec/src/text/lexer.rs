//! Token stream shared by the JSON and pretty text formats.
//!
//! The two formats differ only in output styling; both parse from the same
//! token grammar, so one lexer serves the whole text side.

use logos::Logos;

use crate::error::DecodeError;

/// Token kinds of the relaxed textual syntax. Bare identifiers cover field
/// names, `true`/`false`, and (possibly `Type.NAME` qualified) enum
/// references.
#[derive(Logos, Clone, Copy, PartialEq, Eq, Debug)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    /// Integer or real literal.
    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,
    /// Double-quoted string literal with backslash escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*")]
    Identifier,
}

/// One lexed token: kind plus the source slice it covers.
#[derive(Clone, Copy, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl Token<'_> {
    /// Whether the number literal has no fraction or exponent part.
    pub fn is_integral(&self) -> bool {
        self.kind == TokenKind::Number && !self.text.contains(['.', 'e', 'E'])
    }
}

/// Lookahead-free pull tokenizer; errors carry the phrase describing what
/// was being parsed.
pub struct Tokenizer<'a> {
    lexer: logos::Lexer<'a, TokenKind>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: TokenKind::lexer(source),
        }
    }

    /// Next token, or `None` at clean end of input.
    pub fn next(&mut self, context: &'static str) -> Result<Option<Token<'a>>, DecodeError> {
        match self.lexer.next() {
            None => Ok(None),
            Some(Ok(kind)) => Ok(Some(Token {
                kind,
                text: self.lexer.slice(),
            })),
            Some(Err(())) => Err(DecodeError::UnexpectedToken {
                token: self.lexer.slice().to_owned(),
                context,
            }),
        }
    }

    /// Next token; end of input is an error in the given context.
    pub fn expect(&mut self, context: &'static str) -> Result<Token<'a>, DecodeError> {
        self.next(context)?
            .ok_or(DecodeError::UnexpectedEof { context })
    }

    /// Consume exactly one token of the given kind.
    pub fn expect_symbol(
        &mut self,
        kind: TokenKind,
        context: &'static str,
    ) -> Result<(), DecodeError> {
        let token = self.expect(context)?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedToken {
                token: token.text.to_owned(),
                context,
            })
        }
    }
}

/// Strip the surrounding quotes and process escapes of a string literal.
pub fn unquote(literal: &str) -> Result<String, DecodeError> {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escape = chars.next().ok_or(DecodeError::InvalidLiteral {
            token: literal.to_owned(),
            expected: "string",
        })?;
        match escape {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let bad = || DecodeError::InvalidLiteral {
                    token: literal.to_owned(),
                    expected: "string",
                };
                let unit = hex_code_unit(&mut chars).ok_or_else(bad)?;
                // A high surrogate must be followed by its `\uXXXX` low half;
                // anything else in the surrogate range is malformed.
                let code = if (0xd800..0xdc00).contains(&unit) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(bad());
                    }
                    let low = hex_code_unit(&mut chars).ok_or_else(bad)?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(bad());
                    }
                    0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00)
                } else {
                    unit
                };
                out.push(char::from_u32(code).ok_or_else(bad)?);
            }
            _ => {
                return Err(DecodeError::InvalidLiteral {
                    token: literal.to_owned(),
                    expected: "string",
                });
            }
        }
    }
    Ok(out)
}

fn hex_code_unit(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    (hex.len() == 4)
        .then(|| u32::from_str_radix(&hex, 16).ok())
        .flatten()
}

/// Render a string as a double-quoted literal with escapes.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
