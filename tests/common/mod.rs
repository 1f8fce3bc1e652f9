//! Shared fixture builders for the end-to-end tests: hand-rolled index
//! units and syntax records fed through the real driver.

use std::path::PathBuf;
use std::sync::Arc;
use vestige::index::{
    IndexStore, MemoryIndexStore, OccurrenceRecord, RelationRecord, RoleName, SymbolRecord,
    UnitRecord,
};
use vestige::syntax::{MemorySyntaxProvider, SyntaxProvider};
use vestige::{DeclKind, Driver, Finding, Settings};

pub fn symbol(usr: &str, kind: DeclKind, name: &str) -> SymbolRecord {
    SymbolRecord {
        usr: usr.to_string(),
        kind,
        name: Some(name.to_string()),
        language: Some("swift".to_string()),
    }
}

pub fn relation(role: RoleName, usr: &str) -> RelationRecord {
    RelationRecord {
        roles: vec![role],
        usr: usr.to_string(),
        name: None,
    }
}

/// A definition occurrence, optionally parented and with extra relations.
pub fn def(
    usr: &str,
    kind: DeclKind,
    name: &str,
    line: u32,
    column: u32,
    relations: Vec<RelationRecord>,
) -> OccurrenceRecord {
    OccurrenceRecord {
        symbol: symbol(usr, kind, name),
        line,
        column,
        roles: vec![RoleName::Definition],
        relations,
    }
}

pub fn def_in(
    usr: &str,
    kind: DeclKind,
    name: &str,
    line: u32,
    column: u32,
    parent_usr: &str,
) -> OccurrenceRecord {
    def(usr, kind, name, line, column, vec![relation(RoleName::ChildOf, parent_usr)])
}

pub fn implicit_def_in(
    usr: &str,
    kind: DeclKind,
    name: &str,
    line: u32,
    column: u32,
    parent_usr: &str,
) -> OccurrenceRecord {
    let mut occurrence = def_in(usr, kind, name, line, column, parent_usr);
    occurrence.roles.push(RoleName::Implicit);
    occurrence
}

/// A reference occurrence contained by the given declaration.
pub fn call(
    usr: &str,
    kind: DeclKind,
    name: &str,
    line: u32,
    column: u32,
    container_usr: &str,
) -> OccurrenceRecord {
    OccurrenceRecord {
        symbol: symbol(usr, kind, name),
        line,
        column,
        roles: vec![RoleName::Reference, RoleName::Call],
        relations: vec![relation(RoleName::ContainedBy, container_usr)],
    }
}

/// A type reference in an inheritance clause: `struct S: P` produces a
/// reference to P related base-of S.
pub fn inherits(
    usr: &str,
    kind: DeclKind,
    name: &str,
    line: u32,
    column: u32,
    subtype_usr: &str,
) -> OccurrenceRecord {
    OccurrenceRecord {
        symbol: symbol(usr, kind, name),
        line,
        column,
        roles: vec![RoleName::Reference],
        relations: vec![relation(RoleName::BaseOf, subtype_usr)],
    }
}

pub fn unit(file: &str, module: &str, occurrences: Vec<OccurrenceRecord>) -> UnitRecord {
    UnitRecord {
        main_file: PathBuf::from(file),
        module: module.to_string(),
        occurrences,
    }
}

pub fn scan(units: Vec<UnitRecord>, syntax: &dyn SyntaxProvider) -> Vec<Finding> {
    scan_with(Settings::default(), units, syntax)
}

pub fn scan_with(
    settings: Settings,
    units: Vec<UnitRecord>,
    syntax: &dyn SyntaxProvider,
) -> Vec<Finding> {
    let mut store = MemoryIndexStore::new();
    for u in units {
        store.add_unit(u);
    }
    let stores: Vec<Arc<dyn IndexStore>> = vec![Arc::new(store)];
    let driver = Driver::new(Arc::new(settings));
    driver.scan(&[], stores, syntax).expect("scan should succeed")
}

pub fn empty_syntax() -> MemorySyntaxProvider {
    MemorySyntaxProvider::new()
}

pub fn reported_names(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .map(|f| f.name.clone().unwrap_or_default())
        .collect()
}
