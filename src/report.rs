//! Per-file aggregation of tag, declaration and embedding facts
//!
//! A report never fails because of one bad item: a malformed tag or an
//! unembeddable field is recorded as a diagnostic on its struct, an invalid
//! declaration as a diagnostic on its scope, and processing continues with
//! the siblings. Only an unparsable file fails as a whole.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::decl::{TypeGraph, TypeSpec};
use crate::embed::{EmbeddedField, FieldSet, PromotedField, promoted_fields};
use crate::error::{ExtractResult, FactsError, FactsResult};
use crate::parsing::go::{
    DeclScope, FileFacts, GoSource, GoSourceParser, PACKAGE_SCOPE, StructDecl,
};
use crate::tag::{StructTag, TagEntry};
use crate::types::FieldDecl;

/// A recoverable problem with one item of the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn from_error(err: impl Into<FactsError>) -> Self {
        let err = err.into();
        Self {
            code: err.status_code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Alias,
    Defined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    pub name: String,
    pub kind: DeclKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u32>,
    /// The type expression as written
    pub declared: String,
    /// For an alias, the non-alias type it finally denotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denotes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeReport {
    pub label: String,
    pub types: Vec<TypeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// One entry per reported namespace present in the tag
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<TagEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructReport {
    pub label: String,
    pub scope: String,
    pub line: usize,
    pub fields: Vec<FieldReport>,
    pub embedded: Vec<EmbeddedField>,
    pub promoted: Vec<PromotedField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub scopes: Vec<ScopeReport>,
    pub structs: Vec<StructReport>,
}

impl FileReport {
    /// Parse `code` and build its report
    pub fn from_source(code: &str, settings: &Settings) -> FactsResult<Self> {
        let mut parser = GoSourceParser::new()?;
        let source = parser.parse(code)?;
        Ok(Self::from_parsed(&source, settings)?)
    }

    /// Build the report of an already parsed file
    pub fn from_parsed(source: &GoSource, settings: &Settings) -> ExtractResult<Self> {
        let mut facts = FileFacts::extract(source)?;
        if !settings.report.include_local_types {
            facts.scopes.retain(DeclScope::is_package);
            facts.structs.retain(|s| s.scope == PACKAGE_SCOPE);
        }

        let (scopes, graphs): (Vec<_>, Vec<_>) = facts.scopes.iter().map(scope_report).unzip();

        let structs = facts
            .structs
            .iter()
            .map(|decl| {
                let (graph, skipped) = visible_graph(&facts, &scopes, &graphs, decl.scope_index);
                struct_report(decl, &graph, skipped, settings)
            })
            .collect::<Vec<_>>();

        let diagnostics: usize = structs.iter().map(|s| s.diagnostics.len()).sum::<usize>()
            + scopes.iter().filter(|s| s.error.is_some()).count();
        debug!(
            "Report built: {} scopes, {} structs, {diagnostics} diagnostics",
            scopes.len(),
            structs.len()
        );

        Ok(Self {
            path: None,
            scopes,
            structs,
        })
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// All diagnostics in the file, scopes first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.scopes
            .iter()
            .filter_map(|s| s.error.as_ref())
            .chain(self.structs.iter().flat_map(|s| s.diagnostics.iter()))
    }

    pub fn struct_report(&self, label: &str) -> Option<&StructReport> {
        self.structs.iter().find(|s| s.label == label)
    }
}

fn scope_report(scope: &DeclScope) -> (ScopeReport, Option<TypeGraph>) {
    let (graph, error) = match TypeGraph::build(scope.specs.iter().cloned()) {
        Ok(graph) => (Some(graph), None),
        Err(err) => {
            warn!("Scope '{}': {err}", scope.label);
            (None, Some(Diagnostic::from_error(err)))
        }
    };

    let types = scope
        .specs
        .iter()
        .map(|spec| TypeReport {
            name: spec.name.clone(),
            kind: if spec.is_alias {
                DeclKind::Alias
            } else {
                DeclKind::Defined
            },
            group_id: spec.group_id,
            declared: spec.underlying.to_string(),
            denotes: match &graph {
                Some(graph) if spec.is_alias => {
                    Some(graph.resolve_alias(&spec.underlying).to_string())
                }
                _ => None,
            },
        })
        .collect();

    (
        ScopeReport {
            label: scope.label.clone(),
            types,
            error,
        },
        graph,
    )
}

/// The graph seen from the scope at `index`.
///
/// Specs of the enclosing scopes are visible, inner ones shadowing outer
/// ones of the same name. A scope whose own declarations are invalid is left
/// out, and so is any inner scope that clashes with the outer ones once
/// merged; each omission comes back as a diagnostic.
fn visible_graph<'a>(
    facts: &FileFacts,
    reports: &[ScopeReport],
    graphs: &'a [Option<TypeGraph>],
    index: usize,
) -> (Cow<'a, TypeGraph>, Vec<Diagnostic>) {
    let mut skipped = Vec::new();
    let mut usable: Vec<&TypeGraph> = Vec::new();
    for i in facts.scope_chain(index) {
        match (&graphs[i], &reports[i].error) {
            (Some(graph), _) => usable.push(graph),
            (None, Some(error)) => skipped.push(Diagnostic {
                code: error.code.clone(),
                message: format!(
                    "Types of scope '{}' not used for promotion: {}",
                    reports[i].label, error.message
                ),
            }),
            (None, None) => {}
        }
    }

    let graph = match usable.as_slice() {
        [] => Cow::Owned(TypeGraph::default()),
        [only] => Cow::Borrowed(*only),
        _ => Cow::Owned(merge_scopes(&usable, &mut skipped)),
    };
    (graph, skipped)
}

/// Merge valid scope graphs, innermost first, dropping inner scopes until
/// the merge builds. The outermost graph alone is always valid.
fn merge_scopes(graphs: &[&TypeGraph], skipped: &mut Vec<Diagnostic>) -> TypeGraph {
    for start in 0..graphs.len() {
        match TypeGraph::build(shadowed_specs(&graphs[start..])) {
            Ok(graph) => return graph,
            Err(err) => {
                debug!("Merged scopes rejected: {err}");
                skipped.push(Diagnostic::from_error(err));
            }
        }
    }
    TypeGraph::default()
}

fn shadowed_specs(graphs: &[&TypeGraph]) -> Vec<TypeSpec> {
    let mut shadowed: HashSet<&str> = HashSet::new();
    let mut layers = Vec::with_capacity(graphs.len());
    for graph in graphs {
        let layer: Vec<TypeSpec> = graph
            .specs()
            .iter()
            .filter(|s| s.is_blank() || !shadowed.contains(s.name.as_str()))
            .cloned()
            .collect();
        shadowed.extend(graph.specs().iter().map(|s| s.name.as_str()));
        layers.push(layer);
    }
    // outermost declarations first
    layers.into_iter().rev().flatten().collect()
}

fn struct_report(
    decl: &StructDecl,
    graph: &TypeGraph,
    skipped_scopes: Vec<Diagnostic>,
    settings: &Settings,
) -> StructReport {
    let mut diagnostics = Vec::new();
    let mut embedded = Vec::new();

    let fields = decl
        .fields
        .iter()
        .map(|field| field_report(field, settings, &mut diagnostics))
        .collect();

    // unembeddable fields are reported here and left out of the collision check
    let mut checked = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        if !field.is_embedded() {
            checked.push(field.clone());
            continue;
        }
        match EmbeddedField::resolve(&field.ty, 0) {
            Ok(fact) => {
                embedded.push(fact);
                checked.push(field.clone());
            }
            Err(err) => diagnostics.push(Diagnostic::from_error(err)),
        }
    }

    if let Err(err) = FieldSet::from_fields(&checked) {
        diagnostics.push(Diagnostic::from_error(err));
    }
    diagnostics.extend(skipped_scopes);

    for diagnostic in &diagnostics {
        warn!("{} (line {}): {}", decl.label, decl.line, diagnostic.message);
    }

    StructReport {
        label: decl.label.clone(),
        scope: decl.scope.clone(),
        line: decl.line,
        fields,
        embedded,
        promoted: promoted_fields(graph, &decl.fields, settings.report.max_promotion_depth),
        diagnostics,
    }
}

fn field_report(
    field: &FieldDecl,
    settings: &Settings,
    diagnostics: &mut Vec<Diagnostic>,
) -> FieldReport {
    let mut entries = Vec::new();
    let mut duplicate_keys = Vec::new();

    if let Some(raw) = &field.tag {
        match StructTag::parse(raw) {
            Ok(tag) => {
                let precedence = settings.tags.precedence;
                let mut keys: Vec<&str> = Vec::new();
                if settings.tags.namespaces.is_empty() {
                    for key in tag.keys() {
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                } else {
                    keys.extend(settings.tags.namespaces.iter().map(String::as_str));
                }
                entries.extend(keys.into_iter().filter_map(|key| tag.entry(key, precedence)));
                duplicate_keys.extend(tag.duplicate_keys().into_iter().map(str::to_owned));
            }
            Err(err) => diagnostics.push(Diagnostic::from_error(err)),
        }
    }

    FieldReport {
        names: field.names.clone(),
        ty: field.ty.to_string(),
        tag: field.tag.clone(),
        entries,
        duplicate_keys,
    }
}
