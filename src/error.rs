//! Error types for Go fact extraction
//!
//! This module provides structured error types using thiserror. Every error
//! identifies the offending input (the raw tag, the duplicate name, the
//! rejected type expression) so callers can skip one item and keep going.

use crate::types::TypeExpr;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The grammar rule a malformed tag violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSyntax {
    /// A group started with `:` or a key was otherwise empty
    EmptyKey,
    /// A key contained a space, quote or control character, or was not followed by `:`
    InvalidKey,
    /// The `:` after a key was not immediately followed by `"`
    MissingQuote,
    /// The closing `"` of a value was never found
    UnterminatedQuote,
    /// A backslash escape inside a value is not valid Go
    InvalidEscape,
}

impl fmt::Display for TagSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyKey => "empty key",
            Self::InvalidKey => "key must be followed by ':'",
            Self::MissingQuote => "value must start with '\"'",
            Self::UnterminatedQuote => "unterminated quoted value",
            Self::InvalidEscape => "invalid escape sequence in value",
        };
        f.write_str(text)
    }
}

/// Errors raised by the tag lexer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("Malformed struct tag `{tag}` at byte {offset}: {reason}")]
    MalformedTag {
        tag: String,
        offset: usize,
        reason: TagSyntax,
    },
}

/// Errors raised while building a type declaration graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclError {
    #[error("Type '{name}' is declared more than once in the same scope")]
    DuplicateTypeName { name: String },

    #[error("Invalid recursive type '{name}': {}", cycle.join(" -> "))]
    RecursiveDeclaration { name: String, cycle: Vec<String> },
}

/// Errors raised by the embedded field resolver and its consumers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    #[error("Type `{expr}` cannot be used as an embedded field")]
    NotEmbeddable { expr: TypeExpr },

    #[error("Duplicate field '{name}' in struct")]
    DuplicateField { name: String },
}

/// Errors specific to parsing Go source with tree-sitter
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("Failed to parse code at line {line}, column {column}: {reason}")]
    SyntaxError {
        line: u32,
        column: u32,
        reason: String,
    },

    #[error("Invalid UTF-8 in source file")]
    InvalidUtf8,

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while converting syntax nodes into facts
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Expected {0} node is missing")]
    NodeMissing(&'static str),

    #[error("Unexpected node kind '{0}'")]
    NodeKindUnknown(String),

    #[error("Invalid UTF-8 in node text")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Invalid string literal `{0}`")]
    InvalidLiteral(String),
}

/// Top-level error for operations that span several components
#[derive(Error, Debug)]
pub enum FactsError {
    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Decl(#[from] DeclError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl FactsError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON reports
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Tag(TagError::MalformedTag { .. }) => "MALFORMED_TAG",
            Self::Decl(DeclError::DuplicateTypeName { .. }) => "DUPLICATE_TYPE_NAME",
            Self::Decl(DeclError::RecursiveDeclaration { .. }) => "RECURSIVE_DECLARATION",
            Self::Embed(EmbedError::NotEmbeddable { .. }) => "NOT_EMBEDDABLE",
            Self::Embed(EmbedError::DuplicateField { .. }) => "DUPLICATE_FIELD",
            Self::Parse(ParseError::ParserInit { .. }) => "PARSER_INIT",
            Self::Parse(ParseError::SyntaxError { .. }) => "SYNTAX_ERROR",
            Self::Parse(ParseError::FileRead { .. }) => "FILE_READ",
            Self::Parse(ParseError::InvalidUtf8) | Self::Extract(ExtractError::InvalidUtf8(_)) => {
                "INVALID_UTF8"
            }
            Self::Extract(_) => "EXTRACT_ERROR",
        }
        .to_string()
    }
}

/// Result type alias for tag lexing
pub type TagResult<T> = Result<T, TagError>;

/// Result type alias for type graph construction
pub type DeclResult<T> = Result<T, DeclError>;

/// Result type alias for embedded field resolution
pub type EmbedResult<T> = Result<T, EmbedError>;

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for node extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type alias for cross-component operations
pub type FactsResult<T> = Result<T, FactsError>;
