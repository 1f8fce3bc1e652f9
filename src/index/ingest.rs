//! Per-file ingestion: turns one file's occurrence records into a raw
//! indexing state ready for the single-threaded commit.
//!
//! Several index records routinely describe the same logical declaration
//! (extensions, accessors, objc-bridged members). Raw declarations collapse
//! on the (kind, name, implicit, objc, location) key, unioning their
//! symbol-ids and relations.

use crate::decl::DeclKind;
use crate::error::ScanResult;
use crate::index::store::{IndexStore, OccurrenceRecord, Roles, UnitHandle};
use crate::types::CompactString;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A reference before it is owned by the graph: the target is still a raw
/// USR string and the parent is unknown or implied by its bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRef {
    pub kind: DeclKind,
    pub target_usr: String,
    pub line: u32,
    pub column: u32,
    pub name: Option<String>,
    pub is_related: bool,
    pub is_write_only: bool,
}

/// A declaration as parsed from index records, before interning.
#[derive(Debug, Clone)]
pub struct RawDecl {
    pub kind: DeclKind,
    pub name: Option<String>,
    pub line: u32,
    pub column: u32,
    pub usrs: IndexSet<String>,
    pub is_implicit: bool,
    pub is_objc_accessible: bool,
    /// Parent symbol-ids from child-of relations, resolved after all files
    /// are committed.
    pub parent_usrs: IndexSet<String>,
    /// Related references this declaration owns (override bases).
    pub own_refs: Vec<RawRef>,
}

type DedupKey = (DeclKind, Option<String>, bool, bool, u32, u32);

/// Everything one file contributes to the graph.
#[derive(Debug, Default)]
pub struct FileIngest {
    pub path: PathBuf,
    pub modules: IndexSet<CompactString>,
    pub decls: Vec<RawDecl>,
    /// References grouped by the symbol-id of the declaration that makes
    /// them; attached once that declaration is known.
    pub buckets: IndexMap<String, Vec<RawRef>>,
    /// References with no known referencer; attached by location later.
    pub dangling: Vec<RawRef>,
    pub parameter_usrs: IndexSet<String>,

    dedup: HashMap<DedupKey, usize>,
}

impl FileIngest {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }
}

fn is_objc_usr(usr: &str) -> bool {
    usr.starts_with("c:")
}

const INVERTED: Roles = Roles::BASE_OF
    .union(Roles::CALLED_BY)
    .union(Roles::EXTENDED_BY)
    .union(Roles::CONTAINED_BY);

/// Ingest every unit compiled from one file. Multiple units occur when the
/// file is built into several targets; the dedup key folds their repeated
/// records together.
pub fn ingest_file(
    path: &Path,
    units: &[(Arc<dyn IndexStore>, UnitHandle)],
) -> ScanResult<FileIngest> {
    let mut state = FileIngest::new(path.to_path_buf());
    for (store, unit) in units {
        state.modules.insert(unit.module.as_str().into());
        let occurrences = store.occurrences(unit)?;
        for occurrence in occurrences.iter() {
            ingest_occurrence(&mut state, occurrence);
        }
    }
    Ok(state)
}

fn ingest_occurrence(state: &mut FileIngest, occurrence: &OccurrenceRecord) {
    let roles = occurrence.role_flags();
    if roles.contains(Roles::DEFINITION) {
        ingest_definition(state, occurrence, roles);
    } else if roles.contains(Roles::REFERENCE) {
        ingest_reference(state, occurrence, roles);
    } else if roles.contains(Roles::IMPLICIT) {
        ingest_implicit_relation(state, occurrence);
    }
}

fn ingest_definition(state: &mut FileIngest, occurrence: &OccurrenceRecord, roles: Roles) {
    let symbol = &occurrence.symbol;

    // Parameter declarations are discarded; unused-parameter detection is
    // syntactic. Their symbol-ids are kept so accessors synthesized under
    // them can be dropped at hierarchy time.
    if symbol.kind == DeclKind::VariableParameter {
        state.parameter_usrs.insert(symbol.usr.clone());
        return;
    }

    let is_implicit = roles.contains(Roles::IMPLICIT);
    let is_objc = is_objc_usr(&symbol.usr);
    let key: DedupKey = (
        symbol.kind,
        symbol.name.clone(),
        is_implicit,
        is_objc,
        occurrence.line,
        occurrence.column,
    );
    let index = *state.dedup.entry(key).or_insert_with(|| {
        state.decls.push(RawDecl {
            kind: symbol.kind,
            name: symbol.name.clone(),
            line: occurrence.line,
            column: occurrence.column,
            usrs: IndexSet::new(),
            is_implicit,
            is_objc_accessible: is_objc,
            parent_usrs: IndexSet::new(),
            own_refs: Vec::new(),
        });
        state.decls.len() - 1
    });
    let decl = &mut state.decls[index];
    decl.usrs.insert(symbol.usr.clone());

    for relation in &occurrence.relations {
        let rel_roles = relation.role_flags();
        if rel_roles.contains(Roles::CHILD_OF) {
            decl.parent_usrs.insert(relation.usr.clone());
        }
        if rel_roles.contains(Roles::OVERRIDE_OF) {
            // The override is a use of its base.
            decl.own_refs.push(RawRef {
                kind: symbol.kind,
                target_usr: relation.usr.clone(),
                line: occurrence.line,
                column: occurrence.column,
                name: relation.name.clone(),
                is_related: true,
                is_write_only: false,
            });
        }
        if rel_roles.intersects(INVERTED) {
            // The relation's other side uses this declaration: invert it
            // into that referencer's bucket.
            state.buckets.entry(relation.usr.clone()).or_default().push(RawRef {
                kind: symbol.kind,
                target_usr: symbol.usr.clone(),
                line: occurrence.line,
                column: occurrence.column,
                name: symbol.name.clone(),
                is_related: rel_roles.contains(Roles::BASE_OF),
                is_write_only: false,
            });
        }
    }
}

fn ingest_reference(state: &mut FileIngest, occurrence: &OccurrenceRecord, roles: Roles) {
    let symbol = &occurrence.symbol;
    let is_write_only =
        roles.contains(Roles::WRITE) && !roles.contains(Roles::READ) && !roles.contains(Roles::CALL);
    let make = |is_related: bool| RawRef {
        kind: symbol.kind,
        target_usr: symbol.usr.clone(),
        line: occurrence.line,
        column: occurrence.column,
        name: symbol.name.clone(),
        is_related,
        is_write_only,
    };

    let mut attributed = false;
    for relation in &occurrence.relations {
        let rel_roles = relation.role_flags();
        if rel_roles.intersects(INVERTED) {
            attributed = true;
            state
                .buckets
                .entry(relation.usr.clone())
                .or_default()
                .push(make(rel_roles.contains(Roles::BASE_OF)));
        }
    }

    if !attributed {
        // Unattributed module references carry no useful edge.
        if symbol.kind != DeclKind::Module {
            state.dangling.push(make(false));
        }
    }
}

/// Occurrences that are neither definitions nor references model relations
/// the compiler synthesized; only override edges matter here.
fn ingest_implicit_relation(state: &mut FileIngest, occurrence: &OccurrenceRecord) {
    let symbol = &occurrence.symbol;
    for relation in &occurrence.relations {
        if relation.role_flags().contains(Roles::OVERRIDE_OF) {
            state.buckets.entry(symbol.usr.clone()).or_default().push(RawRef {
                kind: symbol.kind,
                target_usr: relation.usr.clone(),
                line: occurrence.line,
                column: occurrence.column,
                name: relation.name.clone(),
                is_related: true,
                is_write_only: false,
            });
        }
    }
}
