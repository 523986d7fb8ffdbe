//! Interpretation of one tag value
//!
//! A value such as `name,omitempty,string` is split into a name and an
//! ordered list of options. The lone dash `-` is the skip sentinel; `-,`
//! escapes it and names the field literally `-`.

use serde::{Deserialize, Serialize};

use super::lexer::RawTagPair;

/// Name that, written alone, excludes a field from a namespace
pub const SKIP_SENTINEL: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagEntry {
    pub key: String,
    /// Empty when the value named nothing (use the field's own identifier) or when `skip` is set
    pub name: String,
    /// Everything after the first comma, verbatim and in order
    pub options: Vec<String>,
    pub skip: bool,
}

/// Options recognised by the `encoding/json` convention
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagOption {
    /// Encode the value as a JSON string
    String,
    OmitEmpty,
    OmitZero,
    Unknown(String),
}

impl From<&str> for TagOption {
    fn from(s: &str) -> Self {
        match s {
            "string" => Self::String,
            "omitempty" => Self::OmitEmpty,
            "omitzero" => Self::OmitZero,
            _ => Self::Unknown(s.to_owned()),
        }
    }
}

/// Interpret the value of one lexed pair. Never fails.
pub fn interpret(raw: &RawTagPair) -> TagEntry {
    let mut fields = raw.raw_value.split(',');
    // split always yields at least one item
    let name_field = fields.next().unwrap_or_default();
    let options: Vec<String> = fields.map(str::to_owned).collect();

    let (name, skip) = match name_field {
        SKIP_SENTINEL if options.is_empty() => (String::new(), true),
        other => (other.to_owned(), false),
    };

    TagEntry {
        key: raw.key.clone(),
        name,
        options,
        skip,
    }
}

impl TagEntry {
    /// The name to use for this field in the namespace, falling back to `field_name`
    pub fn effective_name<'a>(&'a self, field_name: &'a str) -> Option<&'a str> {
        if self.skip {
            None
        } else if self.name.is_empty() {
            Some(field_name)
        } else {
            Some(&self.name)
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn is_omitempty(&self) -> bool {
        self.has_option("omitempty")
    }

    pub fn is_string(&self) -> bool {
        self.has_option("string")
    }

    /// Classified options, with empty option fields dropped
    pub fn known_options(&self) -> Vec<TagOption> {
        self.options
            .iter()
            .filter(|o| !o.is_empty())
            .map(|o| TagOption::from(o.as_str()))
            .collect()
    }
}
