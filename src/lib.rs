//! Structural facts about Go source: struct tags, type declarations and
//! embedded fields.
//!
//! The core modules ([`tag`], [`decl`], [`embed`]) are pure functions over
//! immutable values. [`parsing`] adapts tree-sitter-go syntax trees into
//! their inputs and [`report`] aggregates the results per file.

pub mod config;
pub mod decl;
pub mod embed;
pub mod error;
pub mod logging;
pub mod parsing;
pub mod report;
pub mod tag;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use decl::{TypeGraph, TypeSpec};
pub use embed::{EmbeddedField, FieldSet, PromotedField, name_of, promoted_fields};
pub use error::{
    DeclError, DeclResult, EmbedError, EmbedResult, ExtractError, ExtractResult, FactsError,
    FactsResult, ParseError, ParseResult, TagError, TagResult, TagSyntax,
};
pub use parsing::{DeclScope, FileFacts, GoSource, GoSourceParser, StructDecl};
pub use report::{Diagnostic, FileReport};
pub use tag::{KeyPrecedence, RawTagPair, StructTag, TagEntry, TagOption, interpret, lex};
pub use types::{FieldDecl, TypeExpr};
