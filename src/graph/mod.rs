//! The process-wide source graph: every declaration and reference the run
//! knows about, in contiguous arena storage addressed by stable ids.
//!
//! Cross-node links (parent/child, reference targets, conformances) are ids,
//! never owning handles, so the cyclic shape of real programs needs no
//! cycle-aware reference counting. The graph is created empty, populated by
//! the ingest phase, enriched and reconciled in phase two, mutated by the
//! analyzer passes, then read by the result collector.

use crate::decl::{Declaration, DeclKind, Reference};
use crate::syntax::ImportStatement;
use crate::types::{CompactString, DeclId, FileId, Location, RefId, UsrId, UsrInterner, compact_string};
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A source file plus the modules it is compiled into and the imports it
/// declares.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub modules: IndexSet<CompactString>,
    pub imports: Vec<ImportStatement>,
}

/// A conformance edge discovered by the protocol conformance extender.
/// `protocol` is None when the protocol lives outside the indexed modules
/// (e.g. Codable); `protocol_name` is always present.
#[derive(Debug, Clone)]
pub struct Conformance {
    pub conformer: DeclId,
    pub protocol: Option<DeclId>,
    pub protocol_name: CompactString,
}

/// Which declarations reference each imported module, per import statement.
/// Filled by the unused-import analyzer, classified by the result collector
/// once liveness is known.
#[derive(Debug, Clone)]
pub struct ImportUsage {
    pub file: FileId,
    pub module: CompactString,
    pub line: u32,
    pub column: u32,
    pub referencers: Vec<DeclId>,
}

type RefKey = (DeclId, UsrId, Location, DeclKind, bool);

#[derive(Debug, Default)]
pub struct SourceGraph {
    files: Vec<SourceFile>,
    file_ids: HashMap<PathBuf, FileId>,
    usrs: UsrInterner,

    decls: Vec<Declaration>,
    refs: Vec<Reference>,
    dropped: HashSet<DeclId>,

    decl_by_usr: HashMap<UsrId, DeclId>,
    decl_by_location: HashMap<Location, DeclId>,
    refs_by_target: HashMap<UsrId, IndexSet<RefId>>,
    ref_keys: HashMap<RefKey, RefId>,

    retained: IndexSet<DeclId>,
    live: IndexSet<DeclId>,

    pub conformances: Vec<Conformance>,
    pub redundant_conformances: Vec<usize>,
    pub import_usage: Vec<ImportUsage>,
    pub let_shorthand_containers: IndexSet<DeclId>,
}

impl SourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- files ---

    pub fn add_file(&mut self, path: &Path, modules: impl IntoIterator<Item = CompactString>) -> FileId {
        if let Some(&id) = self.file_ids.get(path) {
            let file = &mut self.files[id.index()];
            file.modules.extend(modules);
            return id;
        }
        let id = FileId::from_index(self.files.len());
        self.files.push(SourceFile {
            id,
            path: path.to_path_buf(),
            modules: modules.into_iter().collect(),
            imports: Vec::new(),
        });
        self.file_ids.insert(path.to_path_buf(), id);
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn file_path(&self, id: FileId) -> &Path {
        &self.files[id.index()].path
    }

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.file_ids.get(path).copied()
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn set_imports(&mut self, file: FileId, imports: Vec<ImportStatement>) {
        self.files[file.index()].imports = imports;
    }

    /// Module names any indexed file is compiled into.
    pub fn known_modules(&self) -> IndexSet<CompactString> {
        let mut modules = IndexSet::new();
        for file in &self.files {
            modules.extend(file.modules.iter().cloned());
        }
        modules
    }

    // --- usrs ---

    pub fn intern_usr(&mut self, usr: &str) -> UsrId {
        self.usrs.intern(usr)
    }

    pub fn lookup_usr(&self, usr: &str) -> Option<UsrId> {
        self.usrs.get(usr)
    }

    pub fn usr_string(&self, id: UsrId) -> &str {
        self.usrs.resolve(id)
    }

    // --- declarations ---

    /// Add a declaration, or merge into the one already occupying the same
    /// location key. Merging unions nothing here beyond identity; callers
    /// union USRs via [`Self::bind_usr`], which is how records that share a
    /// location under multiple symbol-ids collapse into one node.
    pub fn add_declaration(
        &mut self,
        kind: DeclKind,
        location: Location,
        name: Option<&str>,
    ) -> DeclId {
        if let Some(&existing) = self.decl_by_location.get(&location) {
            let decl = &self.decls[existing.index()];
            if decl.kind == kind && decl.name.as_deref() == name {
                return existing;
            }
        }
        let id = DeclId::from_index(self.decls.len());
        let mut decl = Declaration::new(id, kind, location);
        decl.name = name.map(compact_string);
        self.decls.push(decl);
        // First declaration at a location owns the location index; later
        // arrivals with a different shape (accessor next to its property)
        // keep their own node but are not location-addressable.
        self.decl_by_location.entry(location).or_insert(id);
        id
    }

    /// Associate a USR with a declaration. Each USR maps to at most one
    /// declaration; the first binding wins.
    pub fn bind_usr(&mut self, decl: DeclId, usr: UsrId) {
        self.decls[decl.index()].usrs.insert(usr);
        self.decl_by_usr.entry(usr).or_insert(decl);
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.index()]
    }

    pub fn decl_by_usr(&self, usr: UsrId) -> Option<DeclId> {
        self.decl_by_usr.get(&usr).copied().filter(|id| !self.dropped.contains(id))
    }

    pub fn decl_at(&self, location: Location) -> Option<DeclId> {
        self.decl_by_location
            .get(&location)
            .copied()
            .filter(|id| !self.dropped.contains(id))
    }

    /// All live (non-dropped) declaration ids, in insertion order.
    pub fn declaration_ids(&self) -> Vec<DeclId> {
        (0..self.decls.len())
            .map(DeclId::from_index)
            .filter(|id| !self.dropped.contains(id))
            .collect()
    }

    pub fn declaration_count(&self) -> usize {
        self.decls.len() - self.dropped.len()
    }

    pub fn set_parent(&mut self, child: DeclId, parent: DeclId) {
        self.decls[child.index()].parent = Some(parent);
        self.decls[parent.index()].children.insert(child);
    }

    /// Drop a declaration and its subtree from every index. Used for
    /// accessors synthesized under parameters, which are uninteresting.
    pub fn remove_declaration(&mut self, id: DeclId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.dropped.insert(current) {
                continue;
            }
            let decl = &self.decls[current.index()];
            stack.extend(decl.children.iter().copied());
            let usrs: Vec<UsrId> = decl.usrs.iter().copied().collect();
            let location = decl.location;
            for usr in usrs {
                if self.decl_by_usr.get(&usr) == Some(&current) {
                    self.decl_by_usr.remove(&usr);
                }
            }
            if self.decl_by_location.get(&location) == Some(&current) {
                self.decl_by_location.remove(&location);
            }
            self.retained.shift_remove(&current);
        }
    }

    /// Resolve parent links recorded during ingest. Children whose parent
    /// USR turned out to be a parameter are dropped; children whose parent
    /// is unknown stay top-level.
    pub fn establish_hierarchy(
        &mut self,
        parents: &HashMap<UsrId, Vec<DeclId>>,
        parameter_usrs: &HashSet<UsrId>,
    ) {
        let mut entries: Vec<(&UsrId, &Vec<DeclId>)> = parents.iter().collect();
        entries.sort_by_key(|(usr, _)| **usr);
        for (usr, children) in entries {
            if let Some(parent) = self.decl_by_usr(*usr) {
                for &child in children {
                    if !self.dropped.contains(&child) {
                        self.set_parent(child, parent);
                    }
                }
            } else if parameter_usrs.contains(usr) {
                for &child in children {
                    self.remove_declaration(child);
                }
            }
        }
    }

    // --- references ---

    /// Attach a reference to its parent declaration, dividing it into the
    /// plain or related set by its flag. Duplicate edges (same parent,
    /// target, location, kind, relatedness) collapse to the first id, which
    /// absorbs the repeats produced by a file compiled into several targets.
    pub fn add_reference(&mut self, mut reference: Reference, parent: DeclId) -> RefId {
        let key: RefKey = (
            parent,
            reference.target,
            reference.location,
            reference.kind,
            reference.is_related,
        );
        if let Some(&existing) = self.ref_keys.get(&key) {
            return existing;
        }
        let id = RefId::from_index(self.refs.len());
        reference.id = id;
        reference.parent = Some(parent);
        let target = reference.target;
        let is_related = reference.is_related;
        self.refs.push(reference);
        self.ref_keys.insert(key, id);
        self.refs_by_target.entry(target).or_default().insert(id);
        let decl = &mut self.decls[parent.index()];
        if is_related {
            decl.related.insert(id);
        } else {
            decl.references.insert(id);
        }
        id
    }

    pub fn reference(&self, id: RefId) -> &Reference {
        &self.refs[id.index()]
    }

    pub fn reference_mut(&mut self, id: RefId) -> &mut Reference {
        &mut self.refs[id.index()]
    }

    pub fn reference_count(&self) -> usize {
        self.refs.len()
    }

    pub fn references_to(&self, usr: UsrId) -> impl Iterator<Item = &Reference> {
        self.refs_by_target
            .get(&usr)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .map(|id| &self.refs[id.index()])
    }

    /// References targeting any USR of `decl`.
    pub fn references_to_decl(&self, decl: DeclId) -> Vec<&Reference> {
        self.decls[decl.index()]
            .usrs
            .iter()
            .flat_map(|&usr| self.references_to(usr))
            .collect()
    }

    // --- retention and liveness ---

    /// Mark a declaration retained. The retained set only ever grows; no
    /// pass removes a mark.
    pub fn retain(&mut self, id: DeclId) {
        if !self.dropped.contains(&id) {
            self.retained.insert(id);
        }
    }

    /// Retain a declaration and every descendant.
    pub fn retain_hierarchy(&mut self, id: DeclId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.retain(current);
            stack.extend(self.decls[current.index()].children.iter().copied());
        }
    }

    pub fn is_retained(&self, id: DeclId) -> bool {
        self.retained.contains(&id)
    }

    pub fn retained(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.retained.iter().copied()
    }

    pub fn mark_live(&mut self, id: DeclId) -> bool {
        self.live.insert(id)
    }

    pub fn is_live(&self, id: DeclId) -> bool {
        self.live.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclKind;

    fn loc(graph: &mut SourceGraph, line: u32, column: u32) -> Location {
        let file = graph.add_file(Path::new("/src/A.swift"), [compact_string("App")]);
        Location::new(file, line, column)
    }

    #[test]
    fn test_add_file_merges_modules() {
        let mut graph = SourceGraph::new();
        let a = graph.add_file(Path::new("/src/A.swift"), [compact_string("App")]);
        let b = graph.add_file(Path::new("/src/A.swift"), [compact_string("AppTests")]);

        assert_eq!(a, b);
        assert_eq!(graph.file(a).modules.len(), 2);
        assert_eq!(graph.known_modules().len(), 2);
    }

    #[test]
    fn test_declaration_merges_at_location_key() {
        let mut graph = SourceGraph::new();
        let location = loc(&mut graph, 3, 7);

        let first = graph.add_declaration(DeclKind::Class, location, Some("A"));
        let second = graph.add_declaration(DeclKind::Class, location, Some("A"));
        assert_eq!(first, second);

        let usr_a = graph.intern_usr("s:4Main1AC");
        let usr_b = graph.intern_usr("s:4Main1AC-ext");
        graph.bind_usr(first, usr_a);
        graph.bind_usr(first, usr_b);

        assert_eq!(graph.decl(first).usrs.len(), 2);
        assert_eq!(graph.decl_by_usr(usr_a), Some(first));
        assert_eq!(graph.decl_by_usr(usr_b), Some(first));
    }

    #[test]
    fn test_distinct_kind_at_same_location_gets_own_node() {
        let mut graph = SourceGraph::new();
        let location = loc(&mut graph, 5, 9);

        let property = graph.add_declaration(DeclKind::VariableInstance, location, Some("x"));
        let getter = graph.add_declaration(DeclKind::AccessorGetter, location, Some("getter:x"));

        assert_ne!(property, getter);
        // The property owns the location index.
        assert_eq!(graph.decl_at(location), Some(property));
    }

    #[test]
    fn test_reference_dedup_and_attachment() {
        let mut graph = SourceGraph::new();
        let location = loc(&mut graph, 2, 1);
        let caller = graph.add_declaration(DeclKind::FreeFunction, location, Some("main()"));
        let target = graph.intern_usr("s:4Main4usedyyF");

        let site = Location::new(location.file, 3, 5);
        let r1 = graph.add_reference(
            Reference::new(DeclKind::MethodInstance, target, site),
            caller,
        );
        let r2 = graph.add_reference(
            Reference::new(DeclKind::MethodInstance, target, site),
            caller,
        );

        assert_eq!(r1, r2);
        assert_eq!(graph.reference_count(), 1);
        assert_eq!(graph.reference(r1).parent, Some(caller));
        assert!(graph.decl(caller).references.contains(&r1));
        assert_eq!(graph.references_to(target).count(), 1);
    }

    #[test]
    fn test_hierarchy_drops_parameter_children() {
        let mut graph = SourceGraph::new();
        let location = loc(&mut graph, 1, 1);
        let file = location.file;

        let func = graph.add_declaration(DeclKind::FreeFunction, location, Some("f(a:)"));
        let func_usr = graph.intern_usr("s:4Main1fyySiF");
        graph.bind_usr(func, func_usr);

        let getter = graph.add_declaration(
            DeclKind::AccessorGetter,
            Location::new(file, 1, 8),
            Some("getter:a"),
        );
        let param_usr = graph.intern_usr("s:4Main1fyySiF1aL_Sivp");

        let mut parents = HashMap::new();
        parents.insert(param_usr, vec![getter]);
        let mut parameter_usrs = HashSet::new();
        parameter_usrs.insert(param_usr);

        graph.establish_hierarchy(&parents, &parameter_usrs);

        assert_eq!(graph.declaration_count(), 1);
        assert!(graph.decl_at(Location::new(file, 1, 8)).is_none());
    }

    #[test]
    fn test_hierarchy_sets_parent_links() {
        let mut graph = SourceGraph::new();
        let location = loc(&mut graph, 1, 7);
        let file = location.file;

        let class = graph.add_declaration(DeclKind::Class, location, Some("A"));
        let class_usr = graph.intern_usr("s:4Main1AC");
        graph.bind_usr(class, class_usr);
        let method = graph.add_declaration(
            DeclKind::MethodInstance,
            Location::new(file, 2, 10),
            Some("used()"),
        );

        let mut parents = HashMap::new();
        parents.insert(class_usr, vec![method]);
        graph.establish_hierarchy(&parents, &HashSet::new());

        assert_eq!(graph.decl(method).parent, Some(class));
        assert!(graph.decl(class).children.contains(&method));
    }

    #[test]
    fn test_retain_hierarchy_and_monotonicity() {
        let mut graph = SourceGraph::new();
        let location = loc(&mut graph, 1, 7);
        let file = location.file;

        let class = graph.add_declaration(DeclKind::Class, location, Some("A"));
        let method = graph.add_declaration(
            DeclKind::MethodInstance,
            Location::new(file, 2, 10),
            Some("m()"),
        );
        graph.set_parent(method, class);

        graph.retain_hierarchy(class);
        assert!(graph.is_retained(class));
        assert!(graph.is_retained(method));
        assert_eq!(graph.retained().count(), 2);
    }
}
