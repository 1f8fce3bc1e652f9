//! The parallel ingest pipeline.
//!
//! ```text
//! FEED → INGEST (N workers) → COMMIT (single thread)
//! ```
//!
//! Workers pull one file job at a time from a bounded channel, build the
//! per-file indexing state, and emit it as a commit record. The calling
//! thread drains the records and reduces them into the graph
//! single-threaded, so edge insertion never contends on a lock. Commit
//! order is path order, which keeps declaration and reference ids stable
//! across runs regardless of worker scheduling.

use crate::config::Settings;
use crate::decl::Reference;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::index::ingest::{FileIngest, RawRef, ingest_file};
use crate::index::store::{IndexStore, UnitHandle};
use crate::types::{DeclId, FileId, Location, UsrId};
use crossbeam_channel::{bounded, unbounded};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// One file's worth of ingestion work: every unit it was compiled into.
pub struct FileJob {
    pub path: PathBuf,
    pub units: Vec<(Arc<dyn IndexStore>, UnitHandle)>,
}

/// Relations that cannot be resolved until every file is committed.
#[derive(Debug, Default)]
pub struct PendingRelations {
    /// parent symbol-id → children awaiting that parent
    pub parents: HashMap<UsrId, Vec<DeclId>>,
    /// referencer symbol-id → references awaiting that declaration
    pub referencers: IndexMap<UsrId, Vec<Reference>>,
    /// references to be attached by location heuristics
    pub dangling: Vec<Reference>,
    pub parameter_usrs: HashSet<UsrId>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    pub files: usize,
    pub declarations: usize,
    pub references: usize,
}

pub struct IngestPipeline {
    threads: usize,
    retain_objc_accessible: bool,
}

impl IngestPipeline {
    pub fn new(settings: &Settings) -> Self {
        Self {
            threads: settings.scan.threads.max(1),
            retain_objc_accessible: settings.analysis.retain_objc_accessible,
        }
    }

    /// Ingest all jobs and commit their states into the graph. Returns the
    /// pending relations for hierarchy establishment and reconciliation.
    pub fn run(
        &self,
        graph: &mut SourceGraph,
        jobs: Vec<FileJob>,
    ) -> ScanResult<(PendingRelations, IngestStats)> {
        let job_count = jobs.len();
        let workers = self.threads.min(job_count.max(1));
        let (job_tx, job_rx) = bounded::<FileJob>(workers * 2);
        let (result_tx, result_rx) = unbounded::<(PathBuf, ScanResult<FileIngest>)>();

        let mut results: Vec<(PathBuf, ScanResult<FileIngest>)> = Vec::with_capacity(job_count);
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        let outcome = ingest_file(&job.path, &job.units);
                        if result_tx.send((job.path, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            for job in jobs {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);

            while let Ok(result) = result_rx.recv() {
                results.push(result);
            }
        });

        // Worker scheduling must not affect the outcome: reduce in path
        // order, and report the first error in that same order.
        results.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut pending = PendingRelations::default();
        let mut stats = IngestStats::default();
        for (path, result) in results {
            let state = result?;
            debug!(file = %path.display(), decls = state.decls.len(), "committing file state");
            self.commit_file(graph, state, &mut pending, &mut stats);
        }
        info!(
            files = stats.files,
            declarations = stats.declarations,
            references = stats.references,
            "phase one complete"
        );
        Ok((pending, stats))
    }

    fn commit_file(
        &self,
        graph: &mut SourceGraph,
        state: FileIngest,
        pending: &mut PendingRelations,
        stats: &mut IngestStats,
    ) {
        let file = graph.add_file(&state.path, state.modules.iter().cloned());
        stats.files += 1;

        for raw in &state.decls {
            let location = Location::new(file, raw.line, raw.column);
            let id = graph.add_declaration(raw.kind, location, raw.name.as_deref());
            for usr in &raw.usrs {
                let usr = graph.intern_usr(usr);
                graph.bind_usr(id, usr);
            }
            {
                let decl = graph.decl_mut(id);
                decl.is_implicit |= raw.is_implicit;
                decl.is_objc_accessible |= raw.is_objc_accessible;
            }
            if raw.is_implicit {
                graph.retain(id);
            }
            if raw.is_objc_accessible && self.retain_objc_accessible {
                graph.retain(id);
            }
            for parent in &raw.parent_usrs {
                let parent = graph.intern_usr(parent);
                pending.parents.entry(parent).or_default().push(id);
            }
            for raw_ref in &raw.own_refs {
                let reference = materialize(graph, file, raw_ref);
                graph.add_reference(reference, id);
                stats.references += 1;
            }
            stats.declarations += 1;
        }

        for (referencer, raw_refs) in &state.buckets {
            let referencer = graph.intern_usr(referencer);
            let list = pending.referencers.entry(referencer).or_default();
            for raw_ref in raw_refs {
                list.push(materialize(graph, file, raw_ref));
                stats.references += 1;
            }
        }
        for raw_ref in &state.dangling {
            pending.dangling.push(materialize(graph, file, raw_ref));
            stats.references += 1;
        }
        for usr in &state.parameter_usrs {
            let usr = graph.intern_usr(usr);
            pending.parameter_usrs.insert(usr);
        }
    }
}

fn materialize(graph: &mut SourceGraph, file: FileId, raw: &RawRef) -> Reference {
    let target = graph.intern_usr(&raw.target_usr);
    let mut reference = Reference::new(raw.kind, target, Location::new(file, raw.line, raw.column));
    reference.name = raw.name.as_deref().map(Into::into);
    reference.is_related = raw.is_related;
    reference.is_write_only = raw.is_write_only;
    reference
}
