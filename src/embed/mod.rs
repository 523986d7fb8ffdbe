//! Embedded (anonymous) struct fields
//!
//! An embedded field's name is promoted from its type: `T1`, `*T2`,
//! `P.Duration` and `*P.Month` contribute the fields `T1`, `T2`, `Duration`
//! and `Month`. Only named types or pointers to named types can be embedded.
//!
//! [`name_of`] looks at one field in isolation. Collisions between fields and
//! promotion from deeper levels need the whole field list and live in
//! [`promotion`].

pub mod promotion;

pub use promotion::{FieldSet, PromotedField, promoted_fields};

use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, EmbedResult};
use crate::types::{GENERIC_TYPE_KIND, TypeExpr};

/// The identity an anonymous field contributes to its struct
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddedField {
    pub type_expr: TypeExpr,
    pub promoted_name: String,
    /// Nesting level below the struct that declares the field list; 0 for its own fields
    pub depth: usize,
}

impl EmbeddedField {
    pub fn resolve(type_expr: &TypeExpr, depth: usize) -> EmbedResult<Self> {
        Ok(Self {
            promoted_name: name_of(type_expr)?,
            type_expr: type_expr.clone(),
            depth,
        })
    }

    /// Whether the field embeds through `*T`
    pub fn is_pointer(&self) -> bool {
        matches!(self.type_expr, TypeExpr::PointerTo { .. })
    }
}

/// Compute the promoted field name of an embedded field's type.
pub fn name_of(expr: &TypeExpr) -> EmbedResult<String> {
    let named = match expr {
        TypeExpr::PointerTo { element } => element.as_ref(),
        other => other,
    };
    let name = match named {
        TypeExpr::Identifier { name } | TypeExpr::Qualified { name, .. } => Some(name.as_str()),
        // `List[T]` and `pkg.List[T]` promote as `List`
        TypeExpr::Opaque { node_kind, text } if node_kind == GENERIC_TYPE_KIND => text
            .split('[')
            .next()
            .and_then(|base| base.rsplit('.').next())
            .map(str::trim)
            .filter(|base| !base.is_empty()),
        _ => None,
    };
    name.map(str::to_owned)
        .ok_or_else(|| EmbedError::NotEmbeddable { expr: expr.clone() })
}
