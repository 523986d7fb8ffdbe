//! Two-phase construction of the per-scope type graph
//!
//! Go type declarations may refer to names declared later in the same
//! scope, so the builder first registers every name and only then looks at
//! bodies. Phase two rejects declarations Go itself rejects as invalid
//! recursive types, which keeps every later query terminating.

use std::collections::HashMap;
use tracing::debug;

use super::TypeSpec;
use crate::error::{DeclError, DeclResult};
use crate::types::{FieldDecl, TypeExpr};

/// All type specs of one scope, indexed by name
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    specs: Vec<TypeSpec>,
    index: HashMap<String, usize>,
}

/// Identity of a bare type name as seen from this scope
#[derive(Debug, PartialEq, Eq)]
enum NameIdentity<'a> {
    Local(&'a str),
    Universe(&'a str),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl TypeGraph {
    /// Build a graph from the specs of one scope
    pub fn build(specs: impl IntoIterator<Item = TypeSpec>) -> DeclResult<Self> {
        let specs: Vec<TypeSpec> = specs.into_iter().collect();

        // Phase 1: register names
        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if spec.is_blank() {
                continue;
            }
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(DeclError::DuplicateTypeName {
                    name: spec.name.clone(),
                });
            }
        }
        let graph = Self { specs, index };

        // Phase 2: validate bodies with every name visible
        graph.check_alias_cycles()?;
        graph.check_value_cycles()?;

        debug!(
            "Built type graph: {} specs, {} aliases",
            graph.specs.len(),
            graph.aliases().count()
        );
        Ok(graph)
    }

    pub fn get(&self, name: &str) -> Option<&TypeSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in declaration order
    pub fn specs(&self) -> &[TypeSpec] {
        &self.specs
    }

    pub fn group(&self, group_id: u32) -> impl Iterator<Item = &TypeSpec> {
        self.specs
            .iter()
            .filter(move |s| s.group_id == Some(group_id))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &TypeSpec> {
        self.specs.iter().filter(|s| s.is_alias)
    }

    pub fn defined(&self) -> impl Iterator<Item = &TypeSpec> {
        self.specs.iter().filter(|s| !s.is_alias)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.get(name).is_some_and(|s| s.is_alias)
    }

    /// Follow alias names until reaching something that is not an alias
    pub fn resolve_alias<'a>(&'a self, expr: &'a TypeExpr) -> &'a TypeExpr {
        let mut current = expr;
        while let TypeExpr::Identifier { name } = current {
            match self.get(name) {
                Some(spec) if spec.is_alias => current = &spec.underlying,
                _ => break,
            }
        }
        current
    }

    /// Follow both alias and defined names of this scope down to a type
    /// literal or a name declared elsewhere.
    pub fn underlying_type<'a>(&'a self, expr: &'a TypeExpr) -> &'a TypeExpr {
        let mut current = expr;
        while let TypeExpr::Identifier { name } = current {
            match self.get(name) {
                Some(spec) => current = &spec.underlying,
                None => break,
            }
        }
        current
    }

    /// Whether two names of this scope (or of the universe) denote the same type
    pub fn same_type(&self, a: &str, b: &str) -> bool {
        self.identical(&TypeExpr::ident(a), &TypeExpr::ident(b))
    }

    /// Go type identity between two expressions
    pub fn identical(&self, a: &TypeExpr, b: &TypeExpr) -> bool {
        let a = self.resolve_alias(a);
        let b = self.resolve_alias(b);

        match (a, b) {
            (TypeExpr::Identifier { name: x }, TypeExpr::Identifier { name: y }) => {
                self.name_identity(x) == self.name_identity(y)
            }
            (
                TypeExpr::Qualified {
                    package: p1,
                    name: n1,
                },
                TypeExpr::Qualified {
                    package: p2,
                    name: n2,
                },
            ) => p1 == p2 && n1 == n2,
            (TypeExpr::PointerTo { element: x }, TypeExpr::PointerTo { element: y })
            | (TypeExpr::SliceOf { element: x }, TypeExpr::SliceOf { element: y }) => {
                self.identical(x, y)
            }
            (
                TypeExpr::ArrayOf {
                    len: l1,
                    element: x,
                },
                TypeExpr::ArrayOf {
                    len: l2,
                    element: y,
                },
            ) => l1 == l2 && self.identical(x, y),
            (
                TypeExpr::MapOf {
                    key: k1,
                    value: v1,
                },
                TypeExpr::MapOf {
                    key: k2,
                    value: v2,
                },
            ) => self.identical(k1, k2) && self.identical(v1, v2),
            (TypeExpr::StructLiteral { fields: f1 }, TypeExpr::StructLiteral { fields: f2 }) => {
                let (f1, f2) = (flatten_fields(f1), flatten_fields(f2));
                f1.len() == f2.len() && f1.iter().zip(&f2).all(|(x, y)| self.same_field(x, y))
            }
            (TypeExpr::Opaque { .. }, TypeExpr::Opaque { .. }) => a == b,
            _ => false,
        }
    }

    fn same_field(&self, a: &StructField<'_>, b: &StructField<'_>) -> bool {
        a.name == b.name && a.tag == b.tag && self.identical(a.ty, b.ty)
    }

    fn name_identity<'a>(&self, name: &'a str) -> NameIdentity<'a> {
        if self.contains(name) {
            return NameIdentity::Local(name);
        }
        // Predeclared aliases
        match name {
            "byte" => NameIdentity::Universe("uint8"),
            "rune" => NameIdentity::Universe("int32"),
            other => NameIdentity::Universe(other),
        }
    }

    /// An alias may not refer to itself, even through pointers or other
    /// type literals, unless a defined type sits in between.
    fn check_alias_cycles(&self) -> DeclResult<()> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        for spec in self.aliases() {
            if !spec.is_blank() {
                self.visit_alias(&spec.name, &mut marks, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit_alias<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> DeclResult<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(cycle_error(path, name)),
            None => {}
        }
        let Some(spec) = self.get(name) else {
            return Ok(());
        };

        marks.insert(name, Mark::InProgress);
        path.push(name);

        let mut referenced = Vec::new();
        spec.underlying
            .for_each_identifier(&mut |ident| referenced.push(ident));
        for ident in referenced {
            if self.is_alias(ident) {
                self.visit_alias(ident, marks, path)?;
            }
        }

        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    /// A type may not contain itself by value: `type T T`, `type A B; type B A`
    /// and `type T struct{ t T }` are rejected, `type T struct{ next *T }` is fine.
    fn check_value_cycles(&self) -> DeclResult<()> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        for spec in &self.specs {
            if !spec.is_blank() {
                self.visit_value(&spec.name, &mut marks, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit_value<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> DeclResult<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(cycle_error(path, name)),
            None => {}
        }
        let Some(spec) = self.get(name) else {
            return Ok(());
        };

        marks.insert(name, Mark::InProgress);
        path.push(name);
        self.visit_value_expr(&spec.underlying, marks, path)?;
        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    fn visit_value_expr<'a>(
        &'a self,
        expr: &'a TypeExpr,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> DeclResult<()> {
        match expr {
            TypeExpr::Identifier { name } => self.visit_value(name, marks, path),
            TypeExpr::ArrayOf { element, .. } => self.visit_value_expr(element, marks, path),
            TypeExpr::StructLiteral { fields } => {
                for field in fields {
                    self.visit_value_expr(&field.ty, marks, path)?;
                }
                Ok(())
            }
            // indirection or out of scope
            TypeExpr::PointerTo { .. }
            | TypeExpr::SliceOf { .. }
            | TypeExpr::MapOf { .. }
            | TypeExpr::Qualified { .. }
            | TypeExpr::Opaque { .. } => Ok(()),
        }
    }
}

/// One field of a struct literal; `name` is `None` for an embedded field
struct StructField<'a> {
    name: Option<&'a str>,
    tag: Option<&'a str>,
    ty: &'a TypeExpr,
}

/// `x, y float64` and `x float64; y float64` declare the same two fields
fn flatten_fields(fields: &[FieldDecl]) -> Vec<StructField<'_>> {
    let mut flat = Vec::with_capacity(fields.len());
    for field in fields {
        let tag = field.tag.as_deref();
        if field.is_embedded() {
            flat.push(StructField {
                name: None,
                tag,
                ty: &field.ty,
            });
        } else {
            flat.extend(field.names.iter().map(|name| StructField {
                name: Some(name.as_str()),
                tag,
                ty: &field.ty,
            }));
        }
    }
    flat
}

fn cycle_error(path: &[&str], name: &str) -> DeclError {
    let start = path.iter().position(|&n| n == name).unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
    cycle.push(name.to_string());
    DeclError::RecursiveDeclaration {
        name: name.to_string(),
        cycle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> TypeExpr {
        TypeExpr::ident(name)
    }

    fn point_struct() -> TypeExpr {
        TypeExpr::struct_of(vec![FieldDecl::named(["x", "y"], ident("float64"))])
    }

    /// The declarations of the `simple.go` fixture
    fn fixture_graph() -> TypeGraph {
        TypeGraph::build([
            TypeSpec::alias("Node", ident("int")),
            TypeSpec::alias("Comparable", ident("int")),
            TypeSpec::alias("nodeList", TypeExpr::slice_of(TypeExpr::pointer_to(ident("Node"))))
                .in_group(0),
            TypeSpec::alias("Polar", ident("polar")).in_group(0),
            TypeSpec::defined("Point", point_struct()).in_group(1),
            TypeSpec::defined("polar", ident("Point")).in_group(1),
            TypeSpec::defined(
                "TreeNode",
                TypeExpr::struct_of(vec![
                    FieldDecl::named(["left", "right"], TypeExpr::pointer_to(ident("TreeNode"))),
                    FieldDecl::named(["value"], TypeExpr::pointer_to(ident("Comparable"))),
                ]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_alias_is_identical_to_aliased_type() {
        let graph = fixture_graph();
        assert!(graph.same_type("Node", "int"));
        assert!(graph.same_type("Comparable", "Node"));
        assert!(graph.same_type("Polar", "polar"));
    }

    #[test]
    fn test_defined_type_is_distinct() {
        let graph = fixture_graph();
        assert!(!graph.same_type("polar", "Point"));
        assert!(!graph.same_type("Polar", "Point"));
        assert!(!graph.identical(&ident("Point"), &point_struct()));
        assert!(graph.same_type("Point", "Point"));
    }

    #[test]
    fn test_alias_of_composite_is_structurally_identical() {
        let graph = fixture_graph();
        let written = TypeExpr::slice_of(TypeExpr::pointer_to(ident("int")));
        assert!(graph.identical(&ident("nodeList"), &written));
        // The stored expression keeps the reference to Node
        assert_eq!(
            graph.get("nodeList").unwrap().underlying,
            TypeExpr::slice_of(TypeExpr::pointer_to(ident("Node")))
        );
    }

    #[test]
    fn test_struct_identity_ignores_name_grouping() {
        let graph = TypeGraph::build([TypeSpec::alias("P", point_struct())]).unwrap();
        let split = TypeExpr::struct_of(vec![
            FieldDecl::named(["x"], ident("float64")),
            FieldDecl::named(["y"], ident("float64")),
        ]);
        assert!(graph.identical(&ident("P"), &split));

        // order, names and tags still matter per field
        let swapped = TypeExpr::struct_of(vec![
            FieldDecl::named(["y"], ident("float64")),
            FieldDecl::named(["x"], ident("float64")),
        ]);
        assert!(!graph.identical(&ident("P"), &swapped));
        let tagged = TypeExpr::struct_of(vec![
            FieldDecl::named(["x", "y"], ident("float64")).with_tag(r#"json:"v""#),
        ]);
        let tagged_split = TypeExpr::struct_of(vec![
            FieldDecl::named(["x"], ident("float64")).with_tag(r#"json:"v""#),
            FieldDecl::named(["y"], ident("float64")),
        ]);
        assert!(!graph.identical(&tagged, &tagged_split));
        assert!(!graph.identical(
            &TypeExpr::struct_of(vec![FieldDecl::embedded(ident("T"))]),
            &TypeExpr::struct_of(vec![FieldDecl::named(["T"], ident("T"))])
        ));
    }

    #[test]
    fn test_two_defined_types_with_same_shape_differ() {
        let graph = TypeGraph::build([
            TypeSpec::defined("Celsius", ident("float64")),
            TypeSpec::defined("Fahrenheit", ident("float64")),
            TypeSpec::alias("Temp", ident("Celsius")),
        ])
        .unwrap();
        assert!(!graph.same_type("Celsius", "Fahrenheit"));
        assert!(!graph.same_type("Celsius", "float64"));
        assert!(graph.same_type("Temp", "Celsius"));
        assert!(!graph.same_type("Temp", "Fahrenheit"));
    }

    #[test]
    fn test_groups_are_provenance_only() {
        let graph = fixture_graph();
        let group: Vec<_> = graph.group(1).map(|s| s.name.as_str()).collect();
        assert_eq!(group, vec!["Point", "polar"]);
        assert_eq!(graph.aliases().count(), 4);
        assert_eq!(graph.defined().count(), 3);
    }

    #[test]
    fn test_forward_references_resolve() {
        let graph = TypeGraph::build([
            TypeSpec::alias("Early", ident("Late")),
            TypeSpec::defined("Late", ident("string")),
        ])
        .unwrap();
        assert!(graph.same_type("Early", "Late"));
        assert_eq!(graph.underlying_type(&ident("Early")), &ident("string"));
    }

    #[test]
    fn test_underlying_type_follows_defined_chain() {
        let graph = fixture_graph();
        assert_eq!(graph.underlying_type(&ident("Polar")), &point_struct());
        assert_eq!(graph.resolve_alias(&ident("Polar")), &ident("polar"));
        assert_eq!(graph.underlying_type(&ident("int")), &ident("int"));
    }

    #[test]
    fn test_duplicate_name_fails() {
        let err = TypeGraph::build([
            TypeSpec::alias("Node", ident("int")),
            TypeSpec::defined("Node", ident("string")),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DeclError::DuplicateTypeName {
                name: "Node".to_string()
            }
        );
    }

    #[test]
    fn test_blank_names_never_collide() {
        let graph = TypeGraph::build([
            TypeSpec::defined("_", ident("int")),
            TypeSpec::defined("_", ident("string")),
        ])
        .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(!graph.contains("_"));
    }

    #[test]
    fn test_recursive_alias_is_rejected() {
        let err = TypeGraph::build([TypeSpec::alias("T", TypeExpr::pointer_to(ident("T")))])
            .unwrap_err();
        assert!(matches!(err, DeclError::RecursiveDeclaration { ref name, .. } if name == "T"));

        let err = TypeGraph::build([
            TypeSpec::alias("A", ident("B")),
            TypeSpec::alias("B", TypeExpr::slice_of(ident("A"))),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DeclError::RecursiveDeclaration {
                name: "A".to_string(),
                cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
            }
        );
    }

    #[test]
    fn test_alias_through_defined_type_is_allowed() {
        let graph = TypeGraph::build([
            TypeSpec::alias("List", TypeExpr::slice_of(ident("Item"))),
            TypeSpec::defined(
                "Item",
                TypeExpr::struct_of(vec![FieldDecl::named(["children"], ident("List"))]),
            ),
        ]);
        assert!(graph.is_ok());
    }

    #[test]
    fn test_value_cycles_are_rejected() {
        let err = TypeGraph::build([
            TypeSpec::defined("A", ident("B")),
            TypeSpec::defined("B", ident("A")),
        ])
        .unwrap_err();
        assert!(matches!(err, DeclError::RecursiveDeclaration { .. }));

        let err = TypeGraph::build([TypeSpec::defined(
            "T",
            TypeExpr::struct_of(vec![FieldDecl::named(["t"], TypeExpr::array_of("2", ident("T")))]),
        )])
        .unwrap_err();
        assert!(matches!(err, DeclError::RecursiveDeclaration { .. }));
    }

    #[test]
    fn test_self_reference_through_pointer_is_allowed() {
        let graph = fixture_graph();
        assert!(graph.same_type("TreeNode", "TreeNode"));
    }

    #[test]
    fn test_predeclared_aliases() {
        let graph = TypeGraph::default();
        assert!(graph.same_type("byte", "uint8"));
        assert!(graph.same_type("rune", "int32"));
        assert!(!graph.same_type("byte", "int8"));
    }

    #[test]
    fn test_local_name_shadows_predeclared_alias() {
        let graph = TypeGraph::build([TypeSpec::defined("uint8", ident("int"))]).unwrap();
        assert!(!graph.same_type("byte", "uint8"));
    }

    #[test]
    fn test_struct_identity_compares_tags_and_names() {
        let graph = TypeGraph::default();
        let plain = TypeExpr::struct_of(vec![FieldDecl::named(["a"], ident("int"))]);
        let tagged = TypeExpr::struct_of(vec![
            FieldDecl::named(["a"], ident("int")).with_tag(r#"json:"a""#),
        ]);
        let renamed = TypeExpr::struct_of(vec![FieldDecl::named(["b"], ident("int"))]);
        assert!(graph.identical(&plain, &plain.clone()));
        assert!(!graph.identical(&plain, &tagged));
        assert!(!graph.identical(&plain, &renamed));
    }
}
