//! Structural model of Go type expressions
//!
//! `TypeExpr` is a minimal immutable tree: enough to compare two expressions
//! for structural identity and to drive embedded-field naming. There are no
//! back-references; a struct literal owns its field declarations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tag::quote::quote_go_string;

/// `Opaque` kind used for generic instantiations such as `List[int]`
pub const GENERIC_TYPE_KIND: &str = "generic_type";

/// A Go type expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// A bare type name such as `int` or `TreeNode`
    Identifier { name: String },
    /// `*T`
    PointerTo { element: Box<TypeExpr> },
    /// `pkg.Name`, where `pkg` is the import alias used in the file
    Qualified { package: String, name: String },
    /// `struct { ... }`
    StructLiteral { fields: Vec<FieldDecl> },
    /// `[]T`
    SliceOf { element: Box<TypeExpr> },
    /// `[N]T`; the length is kept as written
    ArrayOf { len: String, element: Box<TypeExpr> },
    /// `map[K]V`
    MapOf { key: Box<TypeExpr>, value: Box<TypeExpr> },
    /// Function, interface, channel and generic instantiation types.
    ///
    /// These are not modeled structurally. Two opaque expressions are equal
    /// when their node kind and whitespace-normalized source text match, so
    /// aliases inside them are not resolved: with `type Node = int`,
    /// `func(Node)` and `func(int)` compare as different types.
    Opaque { node_kind: String, text: String },
}

/// One field declaration line of a struct literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Declared identifiers; empty for an embedded field
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Decoded contents of the tag literal, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl TypeExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier { name: name.into() }
    }

    pub fn pointer_to(element: TypeExpr) -> Self {
        Self::PointerTo {
            element: Box::new(element),
        }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn struct_of(fields: Vec<FieldDecl>) -> Self {
        Self::StructLiteral { fields }
    }

    pub fn slice_of(element: TypeExpr) -> Self {
        Self::SliceOf {
            element: Box::new(element),
        }
    }

    pub fn array_of(len: impl Into<String>, element: TypeExpr) -> Self {
        Self::ArrayOf {
            len: len.into(),
            element: Box::new(element),
        }
    }

    pub fn map_of(key: TypeExpr, value: TypeExpr) -> Self {
        Self::MapOf {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn opaque(node_kind: impl Into<String>, text: &str) -> Self {
        Self::Opaque {
            node_kind: node_kind.into(),
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    /// The bare identifier if this is an unqualified name
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Short variant name, used in diagnostics
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Identifier { .. } => "identifier",
            Self::PointerTo { .. } => "pointer",
            Self::Qualified { .. } => "qualified identifier",
            Self::StructLiteral { .. } => "struct literal",
            Self::SliceOf { .. } => "slice",
            Self::ArrayOf { .. } => "array",
            Self::MapOf { .. } => "map",
            Self::Opaque { .. } => "opaque type",
        }
    }

    /// Visit every bare identifier referenced by this expression, in source order
    pub fn for_each_identifier<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::Identifier { name } => f(name),
            Self::Qualified { .. } | Self::Opaque { .. } => {}
            Self::PointerTo { element }
            | Self::SliceOf { element }
            | Self::ArrayOf { element, .. } => element.for_each_identifier(f),
            Self::MapOf { key, value } => {
                key.for_each_identifier(f);
                value.for_each_identifier(f);
            }
            Self::StructLiteral { fields } => {
                for field in fields {
                    field.ty.for_each_identifier(f);
                }
            }
        }
    }
}

impl FieldDecl {
    pub fn named<I, S>(names: I, ty: TypeExpr) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ty,
            tag: None,
        }
    }

    pub fn embedded(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// An anonymous field declares a type but no names
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier { name } => f.write_str(name),
            Self::PointerTo { element } => write!(f, "*{element}"),
            Self::Qualified { package, name } => write!(f, "{package}.{name}"),
            Self::SliceOf { element } => write!(f, "[]{element}"),
            Self::ArrayOf { len, element } => write!(f, "[{len}]{element}"),
            Self::MapOf { key, value } => write!(f, "map[{key}]{value}"),
            Self::Opaque { text, .. } => f.write_str(text),
            Self::StructLiteral { fields } => {
                if fields.is_empty() {
                    return f.write_str("struct{}");
                }
                f.write_str("struct{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl fmt::Display for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.names.is_empty() {
            write!(f, "{} ", self.names.join(", "))?;
        }
        write!(f, "{}", self.ty)?;
        if let Some(tag) = &self.tag {
            if tag.contains('`') {
                write!(f, " {}", quote_go_string(tag))?;
            } else {
                write!(f, " `{tag}`")?;
            }
        }
        Ok(())
    }
}
