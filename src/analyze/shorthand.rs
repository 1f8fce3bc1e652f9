//! Shorthand optional-binding linkage.
//!
//! `if let x { … }` reads a variable without the index recording a use of
//! it. Declarations carrying shorthand identifiers become containers, and
//! each identifier links back to the nearest enclosing variable of that
//! name with a related reference, so the shadow binding counts as a use.

use crate::analyze::{AnalyzerContext, GraphMutator, add_related_edge};
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;

pub struct LetShorthandLinker;

impl GraphMutator for LetShorthandLinker {
    fn name(&self) -> &'static str {
        "let-shorthand-linker"
    }

    fn mutate(&self, graph: &mut SourceGraph, _ctx: &AnalyzerContext) -> ScanResult<()> {
        let containers: Vec<DeclId> = graph
            .declaration_ids()
            .into_iter()
            .filter(|&id| !graph.decl(id).let_shorthand_identifiers.is_empty())
            .collect();

        for container in containers {
            graph.let_shorthand_containers.insert(container);
            let identifiers: Vec<_> = graph
                .decl(container)
                .let_shorthand_identifiers
                .iter()
                .cloned()
                .collect();
            for identifier in identifiers {
                if let Some(shadowed) = find_shadowed(graph, container, &identifier) {
                    add_related_edge(graph, container, shadowed);
                }
            }
        }
        Ok(())
    }
}

/// Walk the enclosing scopes, then the file's top level, for a variable of
/// the given name.
fn find_shadowed(graph: &SourceGraph, container: DeclId, name: &str) -> Option<DeclId> {
    let matches = |id: DeclId| {
        let decl = graph.decl(id);
        id != container && decl.kind.is_variable() && decl.name_str() == Some(name)
    };

    let mut scope = Some(container);
    while let Some(current) = scope {
        let decl = graph.decl(current);
        let siblings: Vec<DeclId> = match decl.parent {
            Some(parent) => graph.decl(parent).children.iter().copied().collect(),
            None => Vec::new(),
        };
        if let Some(found) = siblings.into_iter().find(|&id| matches(id)) {
            return Some(found);
        }
        scope = decl.parent;
    }

    let file = graph.decl(container).location.file;
    graph
        .declaration_ids()
        .into_iter()
        .filter(|&id| {
            let decl = graph.decl(id);
            decl.parent.is_none() && decl.location.file == file
        })
        .find(|&id| matches(id))
}
