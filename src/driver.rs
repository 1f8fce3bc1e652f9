//! The scan driver: owns one full analysis from unit enumeration to the
//! finding list.
//!
//! Phase one ingests index records on a worker pool and commits them
//! single-threaded. Phase two establishes the hierarchy, applies syntax
//! enrichment, and reconciles references. The mutation passes then run on
//! the calling thread, and the collector reads the frozen graph.

use crate::analyze::{self, AnalyzerContext, collect_findings};
use crate::config::Settings;
use crate::error::{ScanError, ScanResult};
use crate::graph::SourceGraph;
use crate::index::{FileJob, IndexStore, IngestPipeline, UnitHandle};
use crate::reconcile::reconcile;
use crate::report::Finding;
use crate::syntax::{FileSyntax, SyntaxProvider, apply_file_syntax, assign_reference_roles};
use crate::types::FileId;
use indexmap::IndexMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Driver {
    settings: Arc<Settings>,
    /// Parsed-file cache, scoped to the driver so concurrent scans in one
    /// process never share state.
    syntax_cache: Mutex<HashMap<PathBuf, Arc<FileSyntax>>>,
}

impl Driver {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            syntax_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one full analysis.
    ///
    /// `sources` is the expected source set; every file in it must have a
    /// compilation unit in some store. An empty slice means "every indexed
    /// file".
    pub fn scan(
        &self,
        sources: &[PathBuf],
        stores: Vec<Arc<dyn IndexStore>>,
        syntax: &dyn SyntaxProvider,
    ) -> ScanResult<Vec<Finding>> {
        let by_file = enumerate_units(&stores)?;
        check_unindexed(sources, &by_file)?;

        let jobs: Vec<FileJob> = by_file
            .into_iter()
            .filter(|(path, _)| sources.is_empty() || sources.iter().any(|s| s == path))
            .map(|(path, units)| FileJob { path, units })
            .collect();

        let mut graph = SourceGraph::new();
        let pipeline = IngestPipeline::new(&self.settings);
        let (pending, _stats) = pipeline.run(&mut graph, jobs)?;

        graph.establish_hierarchy(&pending.parents, &pending.parameter_usrs);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.scan.threads.max(1))
            .build()
            .map_err(|e| ScanError::Config { reason: e.to_string() })?;

        let mut ctx = AnalyzerContext::new(Arc::clone(&self.settings));
        self.enrich(&mut graph, syntax, &pool, &mut ctx)?;

        reconcile(&mut graph, pending, &pool);
        assign_reference_roles(&mut graph);

        analyze::run(&mut graph, &ctx)?;
        Ok(collect_findings(&graph, &ctx))
    }

    /// Fetch syntax records in parallel and apply them in file order. A
    /// failing file degrades to all-live rather than risking false
    /// positives.
    fn enrich(
        &self,
        graph: &mut SourceGraph,
        syntax: &dyn SyntaxProvider,
        pool: &rayon::ThreadPool,
        ctx: &mut AnalyzerContext,
    ) -> ScanResult<()> {
        let files: Vec<(FileId, PathBuf)> = graph
            .files()
            .map(|f| (f.id, f.path.clone()))
            .collect();

        let fetched: Vec<(FileId, ScanResult<Arc<FileSyntax>>)> = pool.install(|| {
            files
                .par_iter()
                .map(|(id, path)| (*id, self.cached_syntax(path, syntax)))
                .collect()
        });

        for (file, result) in fetched {
            match result {
                Ok(record) => {
                    let outcome = apply_file_syntax(
                        graph,
                        file,
                        &record,
                        self.settings.analysis.ignore_comment_commands,
                    );
                    ctx.unused_parameters.extend(outcome.unused_parameters);
                }
                Err(e) => {
                    // Unknown syntax means unknown liveness; treat the whole
                    // file as live so nothing in it is falsely reported.
                    warn!(error = %e, "syntax failed, treating file's declarations as live");
                    let ids = graph.declaration_ids();
                    for id in ids {
                        if graph.decl(id).location.file == file {
                            graph.retain_hierarchy(id);
                        }
                    }
                }
            }
        }
        ctx.unused_parameters.sort_by_key(|(location, _)| *location);
        Ok(())
    }

    fn cached_syntax(
        &self,
        path: &Path,
        provider: &dyn SyntaxProvider,
    ) -> ScanResult<Arc<FileSyntax>> {
        if let Some(cached) = self.syntax_cache.lock().get(path) {
            return Ok(Arc::clone(cached));
        }
        let record = Arc::new(provider.file_syntax(path)?);
        self.syntax_cache
            .lock()
            .insert(path.to_path_buf(), Arc::clone(&record));
        Ok(record)
    }
}

type UnitsByFile = IndexMap<PathBuf, Vec<(Arc<dyn IndexStore>, UnitHandle)>>;

/// Group every store's units by main file, raising a conflict when one
/// store indexes a file under disagreeing module names. The same file in
/// different stores legitimately unions its module set.
fn enumerate_units(stores: &[Arc<dyn IndexStore>]) -> ScanResult<UnitsByFile> {
    let mut by_file: UnitsByFile = IndexMap::new();
    for store in stores {
        let mut modules_in_store: HashMap<PathBuf, String> = HashMap::new();
        for handle in store.units()? {
            if let Some(previous) = modules_in_store.get(&handle.main_file) {
                if *previous != handle.module {
                    let mut modules = vec![previous.clone(), handle.module.clone()];
                    modules.sort();
                    return Err(ScanError::ConflictingIndexUnits {
                        file: handle.main_file,
                        modules,
                    });
                }
            } else {
                modules_in_store.insert(handle.main_file.clone(), handle.module.clone());
            }
            by_file
                .entry(handle.main_file.clone())
                .or_default()
                .push((Arc::clone(store), handle));
        }
    }
    by_file.sort_keys();
    debug!(files = by_file.len(), "enumerated index units");
    Ok(by_file)
}

fn check_unindexed(sources: &[PathBuf], by_file: &UnitsByFile) -> ScanResult<()> {
    let mut unindexed: Vec<PathBuf> = sources
        .iter()
        .filter(|source| !by_file.contains_key(*source))
        .cloned()
        .collect();
    if unindexed.is_empty() {
        Ok(())
    } else {
        unindexed.sort();
        Err(ScanError::UnindexedFiles { files: unindexed })
    }
}
