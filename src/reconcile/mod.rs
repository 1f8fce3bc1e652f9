//! Phase-two reference reconciliation.
//!
//! Two subpasses run after enrichment. The latent pass attaches the
//! per-referencer buckets by symbol-id lookup. The dangling pass attributes
//! references whose parent the index never named, by exact location first
//! and line number second. Both passes compute their matches on a worker
//! pool against the immutable graph, then attach single-threaded.

use crate::decl::Reference;
use crate::graph::SourceGraph;
use crate::index::PendingRelations;
use crate::types::{DeclId, FileId, Location};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileStats {
    pub attached: usize,
    pub dropped: usize,
}

pub fn reconcile(
    graph: &mut SourceGraph,
    pending: PendingRelations,
    pool: &rayon::ThreadPool,
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    attach_latent(graph, pending.referencers, pool, &mut stats);
    attach_dangling(graph, pending.dangling, pool, &mut stats);
    info!(attached = stats.attached, dropped = stats.dropped, "reconciliation complete");
    stats
}

/// Attach bucketed references to the declaration owning their referencer
/// symbol-id.
fn attach_latent(
    graph: &mut SourceGraph,
    referencers: indexmap::IndexMap<crate::types::UsrId, Vec<Reference>>,
    pool: &rayon::ThreadPool,
    stats: &mut ReconcileStats,
) {
    let buckets: Vec<_> = referencers.into_iter().collect();
    let owners: Vec<Option<DeclId>> = {
        let graph = &*graph;
        pool.install(|| {
            buckets
                .par_iter()
                .map(|(usr, _)| graph.decl_by_usr(*usr))
                .collect()
        })
    };

    for ((usr, references), owner) in buckets.into_iter().zip(owners) {
        match owner {
            Some(owner) => {
                for reference in references {
                    graph.add_reference(reference, owner);
                    stats.attached += 1;
                }
            }
            None => {
                debug!(usr = graph.usr_string(usr), "referencer never declared, dropping bucket");
                stats.dropped += references.len();
            }
        }
    }
}

/// Attribute dangling references by location. Candidates at the exact
/// location win over same-line candidates; among candidates, one without a
/// parent wins (it is likely the top-level declaration the reference
/// annotates), then the deterministic (kind rank, location, name, id)
/// order decides.
fn attach_dangling(
    graph: &mut SourceGraph,
    dangling: Vec<Reference>,
    pool: &rayon::ThreadPool,
    stats: &mut ReconcileStats,
) {
    let mut by_location: HashMap<Location, Vec<DeclId>> = HashMap::new();
    let mut by_line: HashMap<(FileId, u32), Vec<DeclId>> = HashMap::new();
    for id in graph.declaration_ids() {
        let decl = graph.decl(id);
        if decl.is_implicit {
            continue;
        }
        by_location.entry(decl.location).or_default().push(id);
        by_line.entry((decl.location.file, decl.location.line)).or_default().push(id);
    }

    let winners: Vec<Option<DeclId>> = {
        let graph = &*graph;
        pool.install(|| {
            dangling
                .par_iter()
                .map(|reference| choose_owner(graph, &by_location, &by_line, reference))
                .collect()
        })
    };

    for (reference, winner) in dangling.into_iter().zip(winners) {
        match winner {
            Some(owner) => {
                graph.add_reference(reference, owner);
                stats.attached += 1;
            }
            // Freed: never enters the graph.
            None => stats.dropped += 1,
        }
    }
}

fn choose_owner(
    graph: &SourceGraph,
    by_location: &HashMap<Location, Vec<DeclId>>,
    by_line: &HashMap<(FileId, u32), Vec<DeclId>>,
    reference: &Reference,
) -> Option<DeclId> {
    let candidates = by_location
        .get(&reference.location)
        .or_else(|| by_line.get(&(reference.location.file, reference.location.line)))?;

    let order_key = |&id: &DeclId| {
        let decl = graph.decl(id);
        (
            decl.kind.disambiguation_rank(),
            decl.location,
            decl.name.clone(),
            id,
        )
    };

    let unparented: Vec<DeclId> = candidates
        .iter()
        .copied()
        .filter(|&id| graph.decl(id).parent.is_none())
        .collect();
    if !unparented.is_empty() {
        return unparented.iter().min_by_key(|id| order_key(id)).copied();
    }
    candidates.iter().min_by_key(|id| order_key(id)).copied()
}
