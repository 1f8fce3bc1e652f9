//! Import and conformance usage analysis.
//!
//! Both analyzers record candidates on the graph; the result collector
//! classifies them once liveness is known. Imports of modules outside the
//! indexed set are never flagged, since their usage cannot be observed.

use crate::analyze::{AnalyzerContext, GraphMutator};
use crate::error::ScanResult;
use crate::graph::{ImportUsage, SourceGraph};
use crate::types::{DeclId, FileId};
use indexmap::IndexSet;

pub struct UnusedImportAnalyzer;

impl GraphMutator for UnusedImportAnalyzer {
    fn name(&self) -> &'static str {
        "unused-import-analyzer"
    }

    fn mutate(&self, graph: &mut SourceGraph, _ctx: &AnalyzerContext) -> ScanResult<()> {
        let known = graph.known_modules();
        let files: Vec<FileId> = graph.files().map(|f| f.id).collect();

        let mut usage = Vec::new();
        for file in files {
            let imports = graph.file(file).imports.clone();
            if imports.is_empty() {
                continue;
            }
            let own_modules = graph.file(file).modules.clone();
            let file_decls: Vec<DeclId> = graph
                .declaration_ids()
                .into_iter()
                .filter(|&id| graph.decl(id).location.file == file)
                .collect();

            for import in imports {
                if !known.contains(&import.module) || own_modules.contains(&import.module) {
                    continue;
                }
                let referencers: Vec<DeclId> = file_decls
                    .iter()
                    .copied()
                    .filter(|&id| references_module(graph, id, &import.module))
                    .collect();
                usage.push(ImportUsage {
                    file,
                    module: import.module.clone(),
                    line: import.line,
                    column: import.column,
                    referencers,
                });
            }
        }
        graph.import_usage = usage;
        Ok(())
    }
}

/// Whether any reference the declaration makes resolves into the module.
fn references_module(graph: &SourceGraph, id: DeclId, module: &str) -> bool {
    let decl = graph.decl(id);
    decl.references
        .iter()
        .chain(decl.related.iter())
        .any(|&rid| {
            let reference = graph.reference(rid);
            graph
                .decl_by_usr(reference.target)
                .is_some_and(|target| {
                    let target_file = graph.decl(target).location.file;
                    graph.file(target_file).modules.iter().any(|m| &**m == module)
                })
        })
}

pub struct RedundantConformanceAnalyzer;

impl GraphMutator for RedundantConformanceAnalyzer {
    fn name(&self) -> &'static str {
        "redundant-conformance-analyzer"
    }

    fn mutate(&self, graph: &mut SourceGraph, _ctx: &AnalyzerContext) -> ScanResult<()> {
        let mut redundant = Vec::new();
        for (index, conformance) in graph.conformances.iter().enumerate() {
            let Some(protocol) = conformance.protocol else {
                continue;
            };
            if !used_as_abstraction(graph, protocol) {
                redundant.push(index);
            }
        }
        graph.redundant_conformances = redundant;
        Ok(())
    }
}

/// A protocol is used as an abstraction when it, or any requirement it
/// declares, carries at least one expression-level reference.
fn used_as_abstraction(graph: &SourceGraph, protocol: DeclId) -> bool {
    let mut members: IndexSet<DeclId> = IndexSet::new();
    members.insert(protocol);
    members.extend(graph.decl(protocol).children.iter().copied());

    members.iter().any(|&member| {
        graph
            .references_to_decl(member)
            .iter()
            .any(|reference| !reference.is_related)
    })
}
