//! Type declarations and their identity graph
//!
//! A Go type declaration either introduces an alias (`type A = B`), which
//! denotes exactly the same type as `B`, or a defined type (`type A B`),
//! which is a new type distinct from every other type even when it shares
//! `B`'s structure. A parenthesized block declares several independent specs
//! that only share provenance.

pub mod graph;

pub use graph::TypeGraph;

use serde::{Deserialize, Serialize};

use crate::types::TypeExpr;

/// One entry of a type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    /// The declared type expression, exactly as written
    pub underlying: TypeExpr,
    pub is_alias: bool,
    /// Identifies the parenthesized `type ( ... )` block the spec came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u32>,
}

impl TypeSpec {
    /// `type name = underlying`
    pub fn alias(name: impl Into<String>, underlying: TypeExpr) -> Self {
        Self {
            name: name.into(),
            underlying,
            is_alias: true,
            group_id: None,
        }
    }

    /// `type name underlying`
    pub fn defined(name: impl Into<String>, underlying: TypeExpr) -> Self {
        Self {
            name: name.into(),
            underlying,
            is_alias: false,
            group_id: None,
        }
    }

    pub fn in_group(mut self, group_id: u32) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// The blank identifier declares nothing and never collides
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}
