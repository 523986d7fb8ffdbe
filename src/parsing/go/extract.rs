//! Conversion of Go syntax nodes into declaration and field facts
//!
//! Node kinds follow tree-sitter-go: `type_declaration` holds `type_spec`
//! (defined type) and `type_alias` children, wrapped in `(` `)` for a group;
//! `struct_type` holds a `field_declaration_list`. An embedded pointer field
//! appears as a `*` token next to its `type` field rather than as a
//! `pointer_type` node.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tree_sitter::Node;

use super::parser::GoSource;
use crate::decl::TypeSpec;
use crate::error::{ExtractError, ExtractResult};
use crate::tag::quote::{unquote_interpreted, unquote_raw};
use crate::types::{FieldDecl, TypeExpr};

/// Label of the file-level scope
pub const PACKAGE_SCOPE: &str = "package";

/// The type specs declared directly in one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclScope {
    /// `package`, or the enclosing function and the line of the block.
    /// Not unique: two blocks on one line share a label.
    pub label: String,
    /// Index of the nearest enclosing scope in [`FileFacts::scopes`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub specs: Vec<TypeSpec>,
}

impl DeclScope {
    pub fn is_package(&self) -> bool {
        self.parent.is_none()
    }
}

/// A struct literal found in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    /// The type name, or `var a, b` for an anonymous struct in a var declaration
    pub label: String,
    /// `package`, or the label of the block the struct is declared in
    pub scope: String,
    /// Index in [`FileFacts::scopes`] of the innermost enclosing scope that declares types
    pub scope_index: usize,
    /// 1-based line of the declaration
    pub line: usize,
    pub fields: Vec<FieldDecl>,
}

/// Everything the adapter extracts from one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    /// The package scope first, then every block that declares types
    pub scopes: Vec<DeclScope>,
    pub structs: Vec<StructDecl>,
}

impl FileFacts {
    pub fn extract(source: &GoSource) -> ExtractResult<Self> {
        let mut walker = Walker {
            code: source.code(),
            scopes: vec![DeclScope {
                label: PACKAGE_SCOPE.to_string(),
                parent: None,
                specs: Vec::new(),
            }],
            structs: Vec::new(),
            next_group: 0,
        };
        walker.walk(source.root(), 0, "")?;

        // Blocks without type declarations are folded into their nearest
        // kept ancestor. A parent always precedes its children.
        let mut remap = Vec::with_capacity(walker.scopes.len());
        let mut scopes: Vec<DeclScope> = Vec::new();
        for (i, mut scope) in walker.scopes.into_iter().enumerate() {
            let parent = scope.parent.map(|p| remap[p]);
            if i == 0 || !scope.specs.is_empty() {
                scope.parent = parent;
                remap.push(scopes.len());
                scopes.push(scope);
            } else {
                remap.push(parent.unwrap_or(0));
            }
        }
        let mut structs = walker.structs;
        for decl in &mut structs {
            decl.scope_index = remap[decl.scope_index];
        }

        debug!(
            "Extracted {} type specs in {} scopes, {} structs",
            scopes.iter().map(|s| s.specs.len()).sum::<usize>(),
            scopes.len(),
            structs.len()
        );
        Ok(Self { scopes, structs })
    }

    pub fn package_scope(&self) -> Option<&DeclScope> {
        self.scopes.first()
    }

    pub fn scope(&self, index: usize) -> Option<&DeclScope> {
        self.scopes.get(index)
    }

    /// Indices of the scope at `index` and its enclosing scopes, innermost first
    pub fn scope_chain(&self, index: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut next = self.scopes.get(index).map(|_| index);
        while let Some(i) = next {
            chain.push(i);
            next = self.scopes[i].parent;
        }
        chain
    }
}

/// Every type spec of the file, package scope first
pub fn type_specs(source: &GoSource) -> ExtractResult<Vec<TypeSpec>> {
    Ok(FileFacts::extract(source)?
        .scopes
        .into_iter()
        .flat_map(|scope| scope.specs)
        .collect())
}

/// Type specs grouped by the scope that declares them
pub fn type_scopes(source: &GoSource) -> ExtractResult<Vec<DeclScope>> {
    Ok(FileFacts::extract(source)?.scopes)
}

/// Named struct types and anonymous structs of `var` declarations
pub fn struct_types(source: &GoSource) -> ExtractResult<Vec<StructDecl>> {
    Ok(FileFacts::extract(source)?.structs)
}

struct Walker<'a> {
    code: &'a str,
    scopes: Vec<DeclScope>,
    structs: Vec<StructDecl>,
    next_group: u32,
}

impl Walker<'_> {
    fn walk(&mut self, node: Node, scope: usize, owner: &str) -> ExtractResult<()> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "type_declaration" => self.type_declaration(child, scope)?,
                "var_spec" => {
                    self.var_spec(child, scope)?;
                    // initializers may hold function literals
                    self.walk(child, scope, owner)?;
                }
                "function_declaration" | "method_declaration" => {
                    let name = match child.child_by_field_name("name") {
                        Some(name) => node_text(name, self.code)?,
                        None => "_",
                    };
                    self.walk(child, scope, &format!("func {name}"))?;
                }
                "block" => {
                    let owner = if owner.is_empty() { "func" } else { owner };
                    let label = format!("{owner} (line {})", child.start_position().row + 1);
                    self.scopes.push(DeclScope {
                        label,
                        parent: Some(scope),
                        specs: Vec::new(),
                    });
                    let inner = self.scopes.len() - 1;
                    self.walk(child, inner, owner)?;
                }
                _ => self.walk(child, scope, owner)?,
            }
        }
        Ok(())
    }

    fn type_declaration(&mut self, node: Node, scope: usize) -> ExtractResult<()> {
        let mut cursor = node.walk();
        let grouped = node.children(&mut cursor).any(|c| c.kind() == "(");
        let group_id = grouped.then(|| {
            let id = self.next_group;
            self.next_group += 1;
            id
        });

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let is_alias = match child.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let name_node = child
                .child_by_field_name("name")
                .ok_or(ExtractError::NodeMissing("type name"))?;
            let name = node_text(name_node, self.code)?;
            let type_node = child
                .child_by_field_name("type")
                .ok_or(ExtractError::NodeMissing("declared type"))?;
            let underlying = type_expr_from_node(type_node, self.code)?;

            if let TypeExpr::StructLiteral { fields } = &underlying {
                self.push_struct(name.to_string(), scope, child, fields.clone());
            }

            let spec = TypeSpec {
                name: name.to_string(),
                underlying,
                is_alias,
                group_id,
            };
            self.scopes[scope].specs.push(spec);
        }
        Ok(())
    }

    fn var_spec(&mut self, node: Node, scope: usize) -> ExtractResult<()> {
        let Some(type_node) = node.child_by_field_name("type") else {
            return Ok(());
        };
        if type_node.kind() != "struct_type" {
            return Ok(());
        }

        let mut cursor = node.walk();
        let names = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| node_text(n, self.code))
            .collect::<ExtractResult<Vec<_>>>()?;
        let fields = struct_fields(type_node, self.code)?;
        self.push_struct(format!("var {}", names.join(", ")), scope, node, fields);
        Ok(())
    }

    fn push_struct(&mut self, label: String, scope: usize, node: Node, fields: Vec<FieldDecl>) {
        self.structs.push(StructDecl {
            label,
            scope: self.scopes[scope].label.clone(),
            scope_index: scope,
            line: node.start_position().row + 1,
            fields,
        });
    }
}

/// Convert a type node into a [`TypeExpr`]
pub fn type_expr_from_node(node: Node, code: &str) -> ExtractResult<TypeExpr> {
    match node.kind() {
        "type_identifier" => Ok(TypeExpr::ident(node_text(node, code)?)),
        "qualified_type" => {
            let package = required_field(node, "package")?;
            let name = required_field(node, "name")?;
            Ok(TypeExpr::qualified(
                node_text(package, code)?,
                node_text(name, code)?,
            ))
        }
        "pointer_type" => {
            let element = first_type_child(node).ok_or(ExtractError::NodeMissing("pointer element"))?;
            Ok(TypeExpr::pointer_to(type_expr_from_node(element, code)?))
        }
        "slice_type" => {
            let element = required_field(node, "element")?;
            Ok(TypeExpr::slice_of(type_expr_from_node(element, code)?))
        }
        "array_type" => {
            let length = required_field(node, "length")?;
            let element = required_field(node, "element")?;
            Ok(TypeExpr::array_of(
                node_text(length, code)?,
                type_expr_from_node(element, code)?,
            ))
        }
        "map_type" => {
            let key = required_field(node, "key")?;
            let value = required_field(node, "value")?;
            Ok(TypeExpr::map_of(
                type_expr_from_node(key, code)?,
                type_expr_from_node(value, code)?,
            ))
        }
        "parenthesized_type" => {
            let inner = first_type_child(node).ok_or(ExtractError::NodeMissing("parenthesized type"))?;
            type_expr_from_node(inner, code)
        }
        "struct_type" => Ok(TypeExpr::struct_of(struct_fields(node, code)?)),
        "generic_type" | "interface_type" | "function_type" | "channel_type" | "negated_type"
        | "union_type" => Ok(TypeExpr::opaque(node.kind(), node_text(node, code)?)),
        other => Err(ExtractError::NodeKindUnknown(other.to_string())),
    }
}

/// The field declarations of a `struct_type` (or its `field_declaration_list`)
pub fn struct_fields(node: Node, code: &str) -> ExtractResult<Vec<FieldDecl>> {
    let list = if node.kind() == "field_declaration_list" {
        node
    } else {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|c| c.kind() == "field_declaration_list");
        found.ok_or(ExtractError::NodeMissing("field_declaration_list"))?
    };

    let mut fields = Vec::new();
    let mut cursor = list.walk();
    for child in list.children(&mut cursor) {
        if child.kind() == "field_declaration" {
            fields.push(field_declaration(child, code)?);
        }
    }
    Ok(fields)
}

fn field_declaration(node: Node, code: &str) -> ExtractResult<FieldDecl> {
    let mut names = Vec::new();
    let mut star = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "field_identifier" => names.push(node_text(child, code)?.to_string()),
            "*" => star = true,
            _ => {}
        }
    }

    let type_node = required_field(node, "type")?;
    let mut ty = type_expr_from_node(type_node, code)?;
    if star && names.is_empty() {
        ty = TypeExpr::pointer_to(ty);
    }

    let tag = node
        .child_by_field_name("tag")
        .map(|tag| tag_literal(tag, code))
        .transpose()?;

    Ok(FieldDecl { names, ty, tag })
}

/// Decode the contents of a tag string literal
pub fn tag_literal(node: Node, code: &str) -> ExtractResult<String> {
    let text = node_text(node, code)?;
    let decoded = match node.kind() {
        "raw_string_literal" => unquote_raw(text),
        "interpreted_string_literal" => unquote_interpreted(text),
        other => return Err(ExtractError::NodeKindUnknown(other.to_string())),
    };
    decoded.ok_or_else(|| ExtractError::InvalidLiteral(text.to_string()))
}

fn node_text<'a>(node: Node, code: &'a str) -> ExtractResult<&'a str> {
    Ok(node.utf8_text(code.as_bytes())?)
}

fn required_field<'tree>(node: Node<'tree>, field: &'static str) -> ExtractResult<Node<'tree>> {
    node.child_by_field_name(field)
        .ok_or(ExtractError::NodeMissing(field))
}

fn first_type_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|c| c.kind() != "comment")
}
