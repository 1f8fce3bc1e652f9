//! The compiler-index boundary.
//!
//! Per compilation unit the core consumes an iterator of occurrences, each
//! carrying a symbol, a location, role flags, and relations to other
//! symbols. Two stores ship: [`JsonIndexStore`] reads a directory of
//! per-unit JSON records; [`MemoryIndexStore`] backs fixtures and tests.

use crate::decl::DeclKind;
use crate::error::{ScanError, ScanResult};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

bitflags! {
    /// Roles an occurrence or relation can carry. Mirrors the compiler's
    /// index-store role mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Roles: u32 {
        const DEFINITION   = 1 << 0;
        const REFERENCE    = 1 << 1;
        const IMPLICIT     = 1 << 2;
        const READ         = 1 << 3;
        const WRITE        = 1 << 4;
        const CALL         = 1 << 5;
        const DYNAMIC      = 1 << 6;
        const CHILD_OF     = 1 << 7;
        const BASE_OF      = 1 << 8;
        const OVERRIDE_OF  = 1 << 9;
        const CALLED_BY    = 1 << 10;
        const EXTENDED_BY  = 1 << 11;
        const CONTAINED_BY = 1 << 12;
    }
}

/// Role names as they appear in serialized records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleName {
    Definition,
    Reference,
    Implicit,
    Read,
    Write,
    Call,
    Dynamic,
    ChildOf,
    BaseOf,
    OverrideOf,
    CalledBy,
    ExtendedBy,
    ContainedBy,
}

impl From<RoleName> for Roles {
    fn from(name: RoleName) -> Self {
        match name {
            RoleName::Definition => Roles::DEFINITION,
            RoleName::Reference => Roles::REFERENCE,
            RoleName::Implicit => Roles::IMPLICIT,
            RoleName::Read => Roles::READ,
            RoleName::Write => Roles::WRITE,
            RoleName::Call => Roles::CALL,
            RoleName::Dynamic => Roles::DYNAMIC,
            RoleName::ChildOf => Roles::CHILD_OF,
            RoleName::BaseOf => Roles::BASE_OF,
            RoleName::OverrideOf => Roles::OVERRIDE_OF,
            RoleName::CalledBy => Roles::CALLED_BY,
            RoleName::ExtendedBy => Roles::EXTENDED_BY,
            RoleName::ContainedBy => Roles::CONTAINED_BY,
        }
    }
}

pub fn roles_from_names(names: &[RoleName]) -> Roles {
    names.iter().fold(Roles::empty(), |acc, &n| acc | n.into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub usr: String,
    pub kind: DeclKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRecord {
    pub roles: Vec<RoleName>,
    pub usr: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RelationRecord {
    pub fn role_flags(&self) -> Roles {
        roles_from_names(&self.roles)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub symbol: SymbolRecord,
    pub line: u32,
    pub column: u32,
    pub roles: Vec<RoleName>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl OccurrenceRecord {
    pub fn role_flags(&self) -> Roles {
        roles_from_names(&self.roles)
    }
}

/// One compilation unit's records: the file it was compiled from, the
/// module it was compiled into, and every occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRecord {
    pub main_file: PathBuf,
    pub module: String,
    #[serde(default)]
    pub occurrences: Vec<OccurrenceRecord>,
}

/// Identity of one unit within a store, handed back to `occurrences`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitHandle {
    pub id: usize,
    pub main_file: PathBuf,
    pub module: String,
}

pub trait IndexStore: Send + Sync {
    /// Enumerate units cheaply, without materializing occurrences.
    fn units(&self) -> ScanResult<Vec<UnitHandle>>;

    /// The occurrences of one unit.
    fn occurrences(&self, unit: &UnitHandle) -> ScanResult<Arc<[OccurrenceRecord]>>;
}

/// Reads every `*.json` unit record under a directory. Units are sorted by
/// file name so enumeration order never depends on directory order.
#[derive(Debug)]
pub struct JsonIndexStore {
    units: Vec<Arc<UnitRecord>>,
}

impl JsonIndexStore {
    pub fn open(root: &Path) -> ScanResult<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(root)
            .map_err(|e| ScanError::io(root, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut units = Vec::with_capacity(paths.len());
        for path in paths {
            let data = std::fs::read_to_string(&path).map_err(|e| ScanError::io(&path, e))?;
            let unit: UnitRecord = serde_json::from_str(&data)
                .map_err(|e| ScanError::index_read(&path, e))?;
            units.push(Arc::new(unit));
        }
        Ok(Self { units })
    }
}

impl IndexStore for JsonIndexStore {
    fn units(&self) -> ScanResult<Vec<UnitHandle>> {
        Ok(self
            .units
            .iter()
            .enumerate()
            .map(|(id, unit)| UnitHandle {
                id,
                main_file: unit.main_file.clone(),
                module: unit.module.clone(),
            })
            .collect())
    }

    fn occurrences(&self, unit: &UnitHandle) -> ScanResult<Arc<[OccurrenceRecord]>> {
        Ok(self.units[unit.id].occurrences.clone().into())
    }
}

/// In-memory store for fixtures and tests.
#[derive(Default)]
pub struct MemoryIndexStore {
    units: Vec<Arc<UnitRecord>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: UnitRecord) {
        self.units.push(Arc::new(unit));
    }
}

impl IndexStore for MemoryIndexStore {
    fn units(&self) -> ScanResult<Vec<UnitHandle>> {
        Ok(self
            .units
            .iter()
            .enumerate()
            .map(|(id, unit)| UnitHandle {
                id,
                main_file: unit.main_file.clone(),
                module: unit.module.clone(),
            })
            .collect())
    }

    fn occurrences(&self, unit: &UnitHandle) -> ScanResult<Arc<[OccurrenceRecord]>> {
        Ok(self.units[unit.id].occurrences.clone().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_flags_combine() {
        let roles = roles_from_names(&[RoleName::Reference, RoleName::Call]);
        assert!(roles.contains(Roles::REFERENCE));
        assert!(roles.contains(Roles::CALL));
        assert!(!roles.contains(Roles::DEFINITION));
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&RoleName::OverrideOf).unwrap();
        assert_eq!(json, "\"override-of\"");
        let name: RoleName = serde_json::from_str("\"child-of\"").unwrap();
        assert_eq!(name, RoleName::ChildOf);
    }

    #[test]
    fn test_unit_record_deserializes() {
        let json = r#"{
            "main_file": "/src/A.swift",
            "module": "App",
            "occurrences": [{
                "symbol": {"usr": "s:3App1AC", "kind": "class", "name": "A"},
                "line": 1,
                "column": 7,
                "roles": ["definition"],
                "relations": [{"roles": ["child-of"], "usr": "s:3App"}]
            }]
        }"#;
        let unit: UnitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(unit.module, "App");
        assert_eq!(unit.occurrences.len(), 1);
        assert_eq!(unit.occurrences[0].symbol.kind, DeclKind::Class);
        assert!(unit.occurrences[0].role_flags().contains(Roles::DEFINITION));
        assert!(unit.occurrences[0].relations[0].role_flags().contains(Roles::CHILD_OF));
    }

    #[test]
    fn test_json_store_reads_sorted_units() {
        let dir = tempfile::tempdir().unwrap();
        for (name, module) in [("b.json", "Kit"), ("a.json", "App")] {
            let unit = UnitRecord {
                main_file: PathBuf::from(format!("/src/{module}.swift")),
                module: module.to_string(),
                occurrences: Vec::new(),
            };
            std::fs::write(dir.path().join(name), serde_json::to_string(&unit).unwrap()).unwrap();
        }

        let store = JsonIndexStore::open(dir.path()).unwrap();
        let units = store.units().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].module, "App");
        assert_eq!(units[1].module, "Kit");
    }

    #[test]
    fn test_json_store_rejects_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let err = JsonIndexStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, ScanError::IndexRead { .. }));
    }
}
