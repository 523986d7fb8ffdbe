//! Struct-level composition of embedded field names
//!
//! These functions work on a whole field list: they detect two fields of one
//! struct sharing a name, and walk embedded structs to find which names are
//! selectable at which depth. A name found at a shallower depth shadows any
//! deeper field of the same name; two fields sharing a name at the
//! shallowest depth make it ambiguous.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{EmbeddedField, name_of};
use crate::decl::TypeGraph;
use crate::error::{EmbedError, EmbedResult};
use crate::types::{FieldDecl, TypeExpr};

/// One name a struct declares directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredField {
    pub name: String,
    /// Set for anonymous fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// The fields a struct declares directly, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    fields: Vec<DeclaredField>,
}

impl FieldSet {
    /// Flatten field declarations, rejecting duplicate non-blank names
    pub fn from_fields(decls: &[FieldDecl]) -> EmbedResult<Self> {
        let mut fields = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for decl in decls {
            let entries = if decl.is_embedded() {
                let embedded = EmbeddedField::resolve(&decl.ty, 0)?;
                vec![(embedded.promoted_name.clone(), Some(embedded))]
            } else {
                decl.names.iter().map(|n| (n.clone(), None)).collect()
            };

            for (name, embedded) in entries {
                if name != "_" && !seen.insert(name.clone()) {
                    return Err(EmbedError::DuplicateField { name });
                }
                fields.push(DeclaredField {
                    name,
                    embedded,
                    tag: decl.tag.clone(),
                });
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[DeclaredField] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&DeclaredField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn embedded(&self) -> impl Iterator<Item = &EmbeddedField> {
        self.fields.iter().filter_map(|f| f.embedded.as_ref())
    }
}

/// A field name visible on a struct, possibly promoted from an embedded struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotedField {
    pub name: String,
    pub depth: usize,
    /// Embedded field names walked to reach this field, outermost first
    pub path: Vec<String>,
    /// The field itself is an embedded field
    pub embedded: bool,
    /// More than one field has this name at this depth; selecting it is an error
    pub ambiguous: bool,
}

struct Candidate {
    name: String,
    path: Vec<String>,
    embedded: bool,
}

/// Compute the selectable field names of a struct literal's field list.
///
/// Embedded fields are expanded when their named type is declared in
/// `graph` with a struct underlying type; qualified types belong to other
/// packages and are not expanded. Fields whose type cannot be embedded are
/// ignored here, [`FieldSet::from_fields`] reports them.
pub fn promoted_fields(
    graph: &TypeGraph,
    fields: &[FieldDecl],
    max_depth: usize,
) -> Vec<PromotedField> {
    let mut result = Vec::new();
    let mut resolved: HashSet<String> = HashSet::new();
    let mut current: Vec<(&[FieldDecl], Vec<String>)> = vec![(fields, Vec::new())];

    for depth in 0..=max_depth {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut next = Vec::new();

        for (level_fields, path) in &current {
            for field in level_fields.iter() {
                if !field.is_embedded() {
                    candidates.extend(field.names.iter().filter(|n| *n != "_").map(|n| {
                        Candidate {
                            name: n.clone(),
                            path: path.clone(),
                            embedded: false,
                        }
                    }));
                    continue;
                }

                let Ok(name) = name_of(&field.ty) else {
                    continue;
                };
                if let Some(inner) = local_struct_fields(graph, &field.ty) {
                    // A type embedding itself (through a pointer) stops here
                    if !path.contains(&name) {
                        let mut inner_path = path.clone();
                        inner_path.push(name.clone());
                        next.push((inner, inner_path));
                    }
                }
                candidates.push(Candidate {
                    name,
                    path: path.clone(),
                    embedded: true,
                });
            }
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for candidate in &candidates {
            *counts.entry(candidate.name.as_str()).or_default() += 1;
        }
        let mut reported: HashSet<&str> = HashSet::new();
        for candidate in &candidates {
            if resolved.contains(&candidate.name) || !reported.insert(candidate.name.as_str()) {
                continue;
            }
            result.push(PromotedField {
                name: candidate.name.clone(),
                depth,
                path: candidate.path.clone(),
                embedded: candidate.embedded,
                ambiguous: counts[candidate.name.as_str()] > 1,
            });
        }
        resolved.extend(reported.into_iter().map(str::to_owned));

        if next.is_empty() {
            break;
        }
        current = next;
    }

    result
}

fn local_struct_fields<'a>(graph: &'a TypeGraph, ty: &TypeExpr) -> Option<&'a [FieldDecl]> {
    let named = match ty {
        TypeExpr::PointerTo { element } => element.as_ref(),
        other => other,
    };
    let name = named.as_identifier()?;
    let spec = graph.get(name)?;
    match graph.underlying_type(&spec.underlying) {
        TypeExpr::StructLiteral { fields } => Some(fields),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::TypeSpec;

    fn ident(name: &str) -> TypeExpr {
        TypeExpr::ident(name)
    }

    /// The anonymous struct of the `embedded_field.go` fixture
    fn fixture_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::embedded(ident("T1")),
            FieldDecl::embedded(TypeExpr::pointer_to(ident("T2"))),
            FieldDecl::embedded(TypeExpr::qualified("P", "Duration")),
            FieldDecl::embedded(TypeExpr::pointer_to(TypeExpr::qualified("P", "Month"))),
            FieldDecl::named(["x", "y"], ident("int")),
        ]
    }

    #[test]
    fn test_field_set_flattens_fixture() {
        let set = FieldSet::from_fields(&fixture_fields()).unwrap();
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["T1", "T2", "Duration", "Month", "x", "y"]
        );
        assert_eq!(set.embedded().count(), 4);
        assert!(set.get("x").unwrap().embedded.is_none());
    }

    #[test]
    fn test_embedded_name_colliding_with_explicit_field() {
        let err = FieldSet::from_fields(&[
            FieldDecl::named(["Duration"], ident("int")),
            FieldDecl::embedded(TypeExpr::qualified("time", "Duration")),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            EmbedError::DuplicateField {
                name: "Duration".to_string()
            }
        );
    }

    #[test]
    fn test_two_embeddings_of_same_name_collide() {
        let err = FieldSet::from_fields(&[
            FieldDecl::embedded(ident("T")),
            FieldDecl::embedded(TypeExpr::pointer_to(TypeExpr::qualified("p", "T"))),
        ])
        .unwrap_err();
        assert!(matches!(err, EmbedError::DuplicateField { .. }));
    }

    #[test]
    fn test_blank_fields_never_collide() {
        let set = FieldSet::from_fields(&[
            FieldDecl::named(["_", "a"], ident("int")),
            FieldDecl::named(["_"], ident("string")),
        ])
        .unwrap();
        assert_eq!(set.fields().len(), 3);
    }

    #[test]
    fn test_non_embeddable_field_is_reported() {
        let err = FieldSet::from_fields(&[FieldDecl::embedded(TypeExpr::slice_of(ident("int")))])
            .unwrap_err();
        assert!(matches!(err, EmbedError::NotEmbeddable { .. }));
    }

    #[test]
    fn test_promotion_through_local_structs() {
        let graph = TypeGraph::build([
            TypeSpec::defined(
                "Base",
                TypeExpr::struct_of(vec![
                    FieldDecl::named(["ID", "Name"], ident("string")),
                ]),
            ),
            TypeSpec::alias("BaseAlias", ident("Base")),
        ])
        .unwrap();
        let fields = vec![
            FieldDecl::embedded(TypeExpr::pointer_to(ident("Base"))),
            FieldDecl::named(["Name"], ident("string")),
        ];

        let promoted = promoted_fields(&graph, &fields, 4);
        let summary: Vec<_> = promoted
            .iter()
            .map(|p| (p.name.as_str(), p.depth, p.ambiguous))
            .collect();
        // Name at depth 0 shadows Base.Name
        assert_eq!(
            summary,
            vec![("Base", 0, false), ("Name", 0, false), ("ID", 1, false)]
        );
        assert_eq!(promoted[2].path, vec!["Base"]);
    }

    #[test]
    fn test_same_depth_collision_is_ambiguous() {
        let graph = TypeGraph::build([
            TypeSpec::defined(
                "A",
                TypeExpr::struct_of(vec![FieldDecl::named(["X"], ident("int"))]),
            ),
            TypeSpec::defined(
                "B",
                TypeExpr::struct_of(vec![FieldDecl::named(["X", "Y"], ident("int"))]),
            ),
        ])
        .unwrap();
        let fields = vec![FieldDecl::embedded(ident("A")), FieldDecl::embedded(ident("B"))];

        let promoted = promoted_fields(&graph, &fields, 4);
        let x = promoted.iter().find(|p| p.name == "X").unwrap();
        let y = promoted.iter().find(|p| p.name == "Y").unwrap();
        assert!(x.ambiguous);
        assert_eq!(x.depth, 1);
        assert!(!y.ambiguous);
    }

    #[test]
    fn test_self_embedding_terminates() {
        let graph = TypeGraph::build([TypeSpec::defined(
            "List",
            TypeExpr::struct_of(vec![
                FieldDecl::embedded(TypeExpr::pointer_to(ident("List"))),
                FieldDecl::named(["Value"], ident("int")),
            ]),
        )])
        .unwrap();
        let TypeExpr::StructLiteral { fields } = &graph.get("List").unwrap().underlying else {
            unreachable!("List is declared as a struct");
        };

        let promoted = promoted_fields(&graph, fields, 16);
        let names: Vec<_> = promoted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["List", "Value"]);
    }

    #[test]
    fn test_max_depth_zero_reports_only_own_fields() {
        let graph = TypeGraph::default();
        let promoted = promoted_fields(&graph, &fixture_fields(), 0);
        assert_eq!(promoted.len(), 6);
        assert!(promoted.iter().all(|p| p.depth == 0 && !p.ambiguous));
    }
}
