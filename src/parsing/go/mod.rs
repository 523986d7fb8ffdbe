//! Go source adapter
//!
//! Wraps tree-sitter-go and turns its syntax nodes into the inputs of the
//! tag, declaration and embedding resolvers.
//!
//! - [`parser`]: tree-sitter parser setup and syntax error detection
//! - [`extract`]: type declarations, struct fields and tag literals

pub mod extract;
pub mod parser;

pub use extract::{
    DeclScope, FileFacts, PACKAGE_SCOPE, StructDecl, struct_fields, struct_types, tag_literal,
    type_expr_from_node, type_scopes, type_specs,
};
pub use parser::{GoSource, GoSourceParser};
