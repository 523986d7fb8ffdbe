//! Struct tag parsing
//!
//! - [`lexer`]: raw `key:"value"` groups
//! - [`entry`]: name/options/skip interpretation of one value
//! - [`quote`]: Go string literal escapes shared with the source adapter
//!
//! Each namespace (`json`, `xml`, `db`, ...) is lexed and interpreted
//! independently; nothing couples one key's entry to another's.

pub mod entry;
pub mod lexer;
pub mod quote;

pub use entry::{SKIP_SENTINEL, TagEntry, TagOption, interpret};
pub use lexer::{RawTagPair, lex};

use serde::{Deserialize, Serialize};

use crate::error::TagResult;

/// Which pair wins when a tag repeats a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPrecedence {
    /// `reflect.StructTag.Lookup` behaviour
    #[default]
    FirstMatch,
    LastMatch,
}

/// A lexed struct tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTag {
    raw: String,
    pairs: Vec<RawTagPair>,
}

impl StructTag {
    pub fn parse(raw: &str) -> TagResult<Self> {
        Ok(Self {
            raw: raw.to_string(),
            pairs: lex(raw)?,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn pairs(&self) -> &[RawTagPair] {
        &self.pairs
    }

    /// Keys in source order, duplicates included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.key.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a RawTagPair> {
        self.pairs.iter().filter(move |p| p.key == key)
    }

    pub fn lookup(&self, key: &str, precedence: KeyPrecedence) -> Option<&RawTagPair> {
        match precedence {
            KeyPrecedence::FirstMatch => self.get_all(key).next(),
            KeyPrecedence::LastMatch => self.get_all(key).last(),
        }
    }

    pub fn entry(&self, key: &str, precedence: KeyPrecedence) -> Option<TagEntry> {
        self.lookup(key, precedence).map(interpret)
    }

    /// Every pair interpreted, in source order
    pub fn entries(&self) -> Vec<TagEntry> {
        self.pairs.iter().map(interpret).collect()
    }

    /// Keys that appear more than once, each reported once
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for key in self.keys() {
            if !seen.insert(key) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_respects_precedence() {
        let tag = StructTag::parse(r#"json:"a" xml:"x" json:"b""#).unwrap();
        assert_eq!(
            tag.lookup("json", KeyPrecedence::FirstMatch).map(|p| p.raw_value.as_str()),
            Some("a")
        );
        assert_eq!(
            tag.lookup("json", KeyPrecedence::LastMatch).map(|p| p.raw_value.as_str()),
            Some("b")
        );
        assert!(tag.lookup("db", KeyPrecedence::FirstMatch).is_none());
        assert_eq!(tag.duplicate_keys(), vec!["json"]);
    }

    #[test]
    fn test_namespaces_are_independent() {
        let tag = StructTag::parse(r#"json:"l" xml:"""#).unwrap();
        let json = tag.entry("json", KeyPrecedence::default()).unwrap();
        let xml = tag.entry("xml", KeyPrecedence::default()).unwrap();
        assert_eq!(json.name, "l");
        assert_eq!(xml.name, "");
        assert!(!xml.skip);
        assert_eq!(tag.keys().collect::<Vec<_>>(), vec!["json", "xml"]);
    }

    #[test]
    fn test_lex_interpret_is_idempotent_over_fixture_values() {
        let values = [
            "",
            "-",
            "-,",
            "d",
            ",omitempty",
            ",string",
            "g,omitempty",
            "h,string",
            "i,omitempty,string",
            "j,string,omitempty",
            "k,foo,bar",
            "l",
        ];
        for value in values {
            let pair = RawTagPair::new("json", value);
            let entry = interpret(&pair);
            let relexed = StructTag::parse(&pair.to_tag_string()).unwrap();
            assert_eq!(relexed.entries(), vec![entry], "value {value:?}");
        }
    }
}
