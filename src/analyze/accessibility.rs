//! Effective accessibility: the minimum of a declaration's own level and
//! that of every enclosing declaration. A `public` method inside an
//! `internal` class is effectively internal.

use crate::analyze::{AnalyzerContext, GraphMutator};
use crate::decl::Accessibility;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;

pub struct AccessibilityCascade;

impl GraphMutator for AccessibilityCascade {
    fn name(&self) -> &'static str {
        "accessibility-cascade"
    }

    fn mutate(&self, graph: &mut SourceGraph, ctx: &AnalyzerContext) -> ScanResult<()> {
        let roots: Vec<DeclId> = graph
            .declaration_ids()
            .into_iter()
            .filter(|&id| graph.decl(id).parent.is_none())
            .collect();

        let mut stack: Vec<(DeclId, Accessibility)> = Vec::new();
        for root in roots {
            stack.push((root, Accessibility::Open));
            while let Some((id, ceiling)) = stack.pop() {
                let decl = graph.decl_mut(id);
                let effective = decl.accessibility.min(ceiling);
                decl.effective_accessibility = effective;
                stack.extend(decl.children.iter().map(|&child| (child, effective)));
            }
        }

        if ctx.settings.analysis.retain_public {
            for id in graph.declaration_ids() {
                if graph.decl(id).effective_accessibility.is_accessible_across_modules() {
                    graph.retain(id);
                }
            }
        }
        Ok(())
    }
}
