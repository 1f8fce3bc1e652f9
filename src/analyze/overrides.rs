//! Override chain extension.
//!
//! Ingest records an override as a use of its base. Calling the base form
//! must equally retain the override that dynamic dispatch may select, so
//! this pass mirrors every member-to-member related edge, making the chain
//! traversable in both directions.

use crate::analyze::{AnalyzerContext, GraphMutator, add_related_edge};
use crate::decl::DeclKind;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;

pub struct OverrideChainExtender;

fn is_member_kind(kind: DeclKind) -> bool {
    kind.is_function() || kind.is_variable() || kind == DeclKind::Subscript
}

impl GraphMutator for OverrideChainExtender {
    fn name(&self) -> &'static str {
        "override-chain-extender"
    }

    fn mutate(&self, graph: &mut SourceGraph, _ctx: &AnalyzerContext) -> ScanResult<()> {
        let mut mirrored: Vec<(DeclId, DeclId)> = Vec::new();
        for id in graph.declaration_ids() {
            let decl = graph.decl(id);
            if !is_member_kind(decl.kind) {
                continue;
            }
            for &rid in decl.related.iter() {
                let reference = graph.reference(rid);
                let Some(base) = graph.decl_by_usr(reference.target) else {
                    continue;
                };
                if graph.decl(base).kind == decl.kind && base != id {
                    mirrored.push((base, id));
                }
            }
        }
        for (base, sub) in mirrored {
            add_related_edge(graph, base, sub);
        }
        Ok(())
    }
}
