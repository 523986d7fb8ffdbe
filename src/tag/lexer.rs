//! Struct tag lexer
//!
//! Scans a tag string such as `json:"name,omitempty" xml:"name"` into its
//! `key:"value"` groups, following the conventions of Go's
//! `reflect.StructTag`. Unlike `reflect`, which silently stops at the first
//! syntax error, every malformed tag is reported.

use serde::{Deserialize, Serialize};

use super::quote::{quote_go_string, unescape};
use crate::error::{TagError, TagResult, TagSyntax};

/// One lexed `key:"value"` group, value already unquoted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawTagPair {
    pub key: String,
    pub raw_value: String,
}

impl RawTagPair {
    pub fn new(key: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            raw_value: raw_value.into(),
        }
    }

    /// Render this pair back into tag syntax.
    ///
    /// Lexing the result yields a pair equal to `self`.
    pub fn to_tag_string(&self) -> String {
        format!("{}:{}", self.key, quote_go_string(&self.raw_value))
    }
}

/// Lex a raw tag string into its pairs, in source order.
///
/// Duplicate keys are kept; which one wins on lookup is up to the caller
/// (see [`super::KeyPrecedence`]).
pub fn lex(raw: &str) -> TagResult<Vec<RawTagPair>> {
    let bytes = raw.as_bytes();
    let len = bytes.len();
    let mut pairs = Vec::new();
    let mut i = 0;

    loop {
        while i < len && bytes[i] == b' ' {
            i += 1;
        }
        if i == len {
            break;
        }

        let key_start = i;
        while i < len && is_key_byte(bytes[i]) {
            i += 1;
        }
        if i == key_start {
            let reason = if bytes[i] == b':' {
                TagSyntax::EmptyKey
            } else {
                TagSyntax::InvalidKey
            };
            return Err(malformed(raw, i, reason));
        }
        let key_end = i;
        if i >= len || bytes[i] != b':' {
            return Err(malformed(raw, i, TagSyntax::InvalidKey));
        }
        i += 1;

        if i >= len || bytes[i] != b'"' {
            return Err(malformed(raw, i, TagSyntax::MissingQuote));
        }
        let quote_start = i;
        i += 1;
        let body_start = i;
        while i < len && bytes[i] != b'"' {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= len {
            return Err(malformed(raw, quote_start, TagSyntax::UnterminatedQuote));
        }

        let value = unescape(&raw[body_start..i])
            .map_err(|offset| malformed(raw, body_start + offset, TagSyntax::InvalidEscape))?;
        i += 1;

        pairs.push(RawTagPair {
            key: raw[key_start..key_end].to_string(),
            raw_value: value,
        });
    }

    Ok(pairs)
}

/// Keys may not contain spaces, quotes, colons or control characters.
fn is_key_byte(b: u8) -> bool {
    b > b' ' && b != b':' && b != b'"' && b != 0x7f
}

fn malformed(raw: &str, offset: usize, reason: TagSyntax) -> TagError {
    TagError::MalformedTag {
        tag: raw.to_string(),
        offset,
        reason,
    }
}
