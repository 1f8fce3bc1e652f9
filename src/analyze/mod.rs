//! The mutation-pass pipeline.
//!
//! A fixed, ordered sequence of analyzers over the frozen-shape graph. Each
//! pass either extends the reference graph to model a language semantic the
//! compiler index omits, or marks declarations retained. Later passes
//! depend on the graph shape established earlier, so the order below is
//! authoritative.

mod accessibility;
mod conformance;
mod entry_points;
mod imports;
mod overrides;
mod parameters;
mod reachability;
mod results;
mod shorthand;
mod synthesized;

pub use results::collect_findings;

use crate::config::Settings;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::{CompactString, Location};
use std::sync::Arc;
use tracing::debug;

/// Read-only inputs shared by the passes.
pub struct AnalyzerContext {
    pub settings: Arc<Settings>,
    /// (function location, parameter names unread in its body), sorted by
    /// location.
    pub unused_parameters: Vec<(Location, Vec<CompactString>)>,
}

impl AnalyzerContext {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            unused_parameters: Vec::new(),
        }
    }
}

/// One analyzer with a single responsibility. Passes only add to the graph;
/// none removes a retain mark.
pub trait GraphMutator {
    fn name(&self) -> &'static str;
    fn mutate(&self, graph: &mut SourceGraph, ctx: &AnalyzerContext) -> ScanResult<()>;
}

fn passes() -> Vec<Box<dyn GraphMutator>> {
    vec![
        Box::new(accessibility::AccessibilityCascade),
        Box::new(conformance::ProtocolConformanceExtender),
        Box::new(overrides::OverrideChainExtender),
        Box::new(synthesized::SynthesizedMemberRetainer),
        Box::new(entry_points::EntryPointRetainer),
        Box::new(imports::UnusedImportAnalyzer),
        Box::new(imports::RedundantConformanceAnalyzer),
        Box::new(parameters::UnusedParameterAnalyzer),
        Box::new(shorthand::LetShorthandLinker),
        Box::new(reachability::Reachability),
    ]
}

/// Run every pass in order.
pub fn run(graph: &mut SourceGraph, ctx: &AnalyzerContext) -> ScanResult<()> {
    for pass in passes() {
        debug!(pass = pass.name(), "running analyzer pass");
        pass.mutate(graph, ctx)?;
    }
    Ok(())
}

/// Add a related (structural) reference from one declaration to another,
/// targeting the first USR of `to`. The shared shape for the edges the
/// conformance, override, and shorthand passes synthesize.
pub(crate) fn add_related_edge(
    graph: &mut SourceGraph,
    from: crate::types::DeclId,
    to: crate::types::DeclId,
) {
    let target = graph.decl(to);
    let Some(&target_usr) = target.usrs.first() else {
        return;
    };
    let mut reference = crate::decl::Reference::new(target.kind, target_usr, target.location);
    reference.name = target.name.clone();
    reference.is_related = true;
    graph.add_reference(reference, from);
}
