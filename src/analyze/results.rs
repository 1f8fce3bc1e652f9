//! The result collector.
//!
//! Runs after the passes have frozen the graph. Enumerates every explicit,
//! non-implicit declaration that is neither live nor structurally required,
//! classifies the remaining candidates the liveness-dependent analyzers
//! recorded, sorts by source position, and dedupes by symbol-id.

use crate::analyze::AnalyzerContext;
use crate::decl::{DeclKind, Declaration};
use crate::graph::SourceGraph;
use crate::report::{Finding, FindingCategory};
use crate::types::{DeclId, UsrId};
use std::collections::HashSet;

pub fn collect_findings(graph: &SourceGraph, ctx: &AnalyzerContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen_usrs: HashSet<UsrId> = HashSet::new();

    let push_decl = |findings: &mut Vec<Finding>,
                         seen: &mut HashSet<UsrId>,
                         decl: &Declaration,
                         category: FindingCategory,
                         name_override: Option<String>| {
        if decl.usrs.iter().any(|usr| seen.contains(usr)) && category == FindingCategory::UnusedDeclaration {
            return;
        }
        seen.extend(decl.usrs.iter().copied());
        findings.push(Finding {
            usrs: decl.usrs.iter().map(|&usr| graph.usr_string(usr).to_string()).collect(),
            kind: decl.kind,
            name: name_override.or_else(|| decl.name_str().map(str::to_string)),
            path: graph.file_path(decl.location.file).to_path_buf(),
            line: decl.location.line,
            column: decl.location.column,
            category,
        });
    };

    // Unused declarations.
    for id in graph.declaration_ids() {
        let decl = graph.decl(id);
        if decl.is_implicit
            || decl.kind == DeclKind::VariableParameter
            || decl.kind.is_accessor()
            || decl.is_structurally_required()
            || graph.is_live(id)
        {
            continue;
        }
        push_decl(&mut findings, &mut seen_usrs, decl, FindingCategory::UnusedDeclaration, None);
    }

    // Redundant public accessibility. With retain_public set, public API is
    // axiomatically external and never redundant.
    if !ctx.settings.analysis.retain_public {
        for id in graph.declaration_ids() {
            let decl = graph.decl(id);
            if !graph.is_live(id)
                || decl.is_implicit
                || decl.kind.is_accessor()
                || decl.kind == DeclKind::VariableParameter
                || !decl.explicit_accessibility
                || !decl.effective_accessibility.is_accessible_across_modules()
            {
                continue;
            }
            if !has_cross_module_reference(graph, id) {
                push_decl(
                    &mut findings,
                    &mut seen_usrs,
                    decl,
                    FindingCategory::RedundantPublicAccessibility,
                    None,
                );
            }
        }
    }

    // Unused parameters of live functions; a dead function subsumes its
    // parameters.
    for id in graph.declaration_ids() {
        let decl = graph.decl(id);
        if !decl.kind.is_function() || !graph.is_live(id) {
            continue;
        }
        for &param in decl.unused_parameters.iter() {
            if !graph.is_retained(param) {
                push_decl(
                    &mut findings,
                    &mut seen_usrs,
                    graph.decl(param),
                    FindingCategory::UnusedParameter,
                    None,
                );
            }
        }
    }

    // Redundant conformances of live types.
    for &index in &graph.redundant_conformances {
        let conformance = &graph.conformances[index];
        if graph.is_live(conformance.conformer) {
            push_decl(
                &mut findings,
                &mut seen_usrs,
                graph.decl(conformance.conformer),
                FindingCategory::RedundantConformance,
                Some(conformance.protocol_name.to_string()),
            );
        }
    }

    // Imports no live declaration reads through.
    for usage in &graph.import_usage {
        if usage.referencers.iter().any(|&id| graph.is_live(id)) {
            continue;
        }
        findings.push(Finding {
            usrs: Vec::new(),
            kind: DeclKind::Module,
            name: Some(usage.module.to_string()),
            path: graph.file_path(usage.file).to_path_buf(),
            line: usage.line,
            column: usage.column,
            category: FindingCategory::UnusedImport,
        });
    }

    findings.sort_by(|a, b| {
        (&a.path, a.line, a.column, a.category, &a.name)
            .cmp(&(&b.path, b.line, b.column, b.category, &b.name))
    });
    findings
}

/// Whether any reference to the declaration originates in a file compiled
/// into a module outside the declaration's own module set.
fn has_cross_module_reference(graph: &SourceGraph, id: DeclId) -> bool {
    let own_file = graph.decl(id).location.file;
    let own_modules = &graph.file(own_file).modules;
    graph.references_to_decl(id).iter().any(|reference| {
        let Some(parent) = reference.parent else {
            return false;
        };
        let referencing_file = graph.decl(parent).location.file;
        graph
            .file(referencing_file)
            .modules
            .iter()
            .any(|m| !own_modules.contains(m))
    })
}
