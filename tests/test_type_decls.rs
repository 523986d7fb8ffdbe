//! Type declaration integration tests
//!
//! Key validations:
//! - `type A = B` is an alias, `type A B` a distinct defined type
//! - Parenthesized groups flatten into specs sharing a group id
//! - Declared types are kept as written (references stay identifiers)
//! - Duplicate and invalid recursive declarations are rejected

use anyhow::Result;
use gofacts::parsing::go::{type_scopes, type_specs};
use gofacts::{DeclError, GoSourceParser, TypeExpr, TypeGraph, TypeSpec};
use std::path::Path;

fn fixture_specs(name: &str) -> Result<Vec<TypeSpec>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/go")
        .join(name);
    let code = std::fs::read_to_string(path)?;
    let mut parser = GoSourceParser::new()?;
    let source = parser.parse(&code)?;
    Ok(type_specs(&source)?)
}

fn simple_graph() -> Result<TypeGraph> {
    Ok(TypeGraph::build(fixture_specs("simple.go")?)?)
}

#[test]
fn test_simple_fixture_classification() -> Result<()> {
    println!("\n=== TEST: simple.go declarations ===");
    let specs = fixture_specs("simple.go")?;
    for spec in &specs {
        println!(
            "  {} alias={} group={:?} underlying={}",
            spec.name, spec.is_alias, spec.group_id, spec.underlying
        );
    }

    let summary: Vec<_> = specs
        .iter()
        .map(|s| (s.name.as_str(), s.is_alias, s.group_id))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Node", true, None),
            ("Comparable", true, None),
            ("nodeList", true, Some(0)),
            ("Polar", true, Some(0)),
            ("Point", false, Some(1)),
            ("polar", false, Some(1)),
            ("TreeNode", false, None),
            ("Foo", false, None),
        ]
    );
    println!("=== PASSED ===");
    Ok(())
}

#[test]
fn test_declared_types_are_kept_as_written() -> Result<()> {
    let graph = simple_graph()?;
    assert_eq!(
        graph.get("nodeList").unwrap().underlying,
        TypeExpr::slice_of(TypeExpr::pointer_to(TypeExpr::ident("Node")))
    );
    assert_eq!(graph.get("Polar").unwrap().underlying, TypeExpr::ident("polar"));
    assert_eq!(
        graph.get("Point").unwrap().underlying.to_string(),
        "struct{ x, y float64 }"
    );
    Ok(())
}

#[test]
fn test_alias_identity() -> Result<()> {
    let graph = simple_graph()?;
    assert!(graph.same_type("Node", "int"));
    assert!(graph.same_type("Comparable", "int"));
    assert!(graph.same_type("Node", "Comparable"));
    assert!(graph.same_type("Polar", "polar"));
    assert!(graph.identical(
        &TypeExpr::ident("nodeList"),
        &TypeExpr::slice_of(TypeExpr::pointer_to(TypeExpr::ident("int")))
    ));
    Ok(())
}

#[test]
fn test_defined_types_are_distinct() -> Result<()> {
    let graph = simple_graph()?;
    assert!(!graph.same_type("polar", "Point"));
    assert!(!graph.same_type("Polar", "Point"));
    assert!(!graph.same_type("Foo", "TreeNode"));
    // same underlying struct, still a different type
    assert_eq!(
        graph.underlying_type(&TypeExpr::ident("polar")),
        graph.underlying_type(&TypeExpr::ident("Point"))
    );
    Ok(())
}

#[test]
fn test_groups_are_provenance_only() -> Result<()> {
    let graph = simple_graph()?;
    let first: Vec<_> = graph.group(0).map(|s| s.name.as_str()).collect();
    let second: Vec<_> = graph.group(1).map(|s| s.name.as_str()).collect();
    assert_eq!(first, vec!["nodeList", "Polar"]);
    assert_eq!(second, vec!["Point", "polar"]);
    // Polar (group 0) refers forward to polar (group 1)
    assert!(graph.same_type("Polar", "polar"));
    Ok(())
}

#[test]
fn test_duplicate_declaration_is_rejected() -> Result<()> {
    let err = TypeGraph::build(fixture_specs("invalid.go")?).unwrap_err();
    assert_eq!(
        err,
        DeclError::DuplicateTypeName {
            name: "Dup".to_string()
        }
    );
    Ok(())
}

#[test]
fn test_recursive_alias_is_rejected() -> Result<()> {
    let specs = fixture_specs("invalid.go")?
        .into_iter()
        .filter(|s| s.name == "Loop");
    let err = TypeGraph::build(specs).unwrap_err();
    assert!(matches!(err, DeclError::RecursiveDeclaration { ref name, .. } if name == "Loop"));
    Ok(())
}

#[test]
fn test_function_local_types_do_not_collide_with_package_types() -> Result<()> {
    let code = "package main\n\ntype T int\n\nfunc main() {\n\ttype T = string\n}\n";
    let mut parser = GoSourceParser::new()?;
    let source = parser.parse(code)?;
    let scopes = type_scopes(&source)?;
    assert_eq!(scopes.len(), 2);
    for scope in &scopes {
        let graph = TypeGraph::build(scope.specs.clone())?;
        assert!(graph.contains("T"));
    }
    assert!(!scopes[0].specs[0].is_alias);
    assert!(scopes[1].specs[0].is_alias);
    Ok(())
}
