use crate::decl::DeclKind;
use crate::types::{CompactString, DeclId, Location, RefId, UsrId};
use serde::{Deserialize, Serialize};

/// How a reference uses its target, beyond a plain expression-level use.
/// Assigned by matching the reference location against the using
/// declaration's type footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefRole {
    #[default]
    Plain,
    InheritedClassType,
    RefinedProtocolType,
    VariableType,
    ReturnType,
    ParameterType,
    GenericParameterType,
    GenericRequirementType,
    VariableInitFunctionCall,
    FunctionCallMetatypeArgument,
}

/// A directed use edge from a declaration to a symbol. The target stays a
/// USR id rather than a declaration id: many references point at symbols
/// from other modules that never resolve to a declaration in the graph.
#[derive(Debug, Clone)]
pub struct Reference {
    pub id: RefId,
    pub kind: DeclKind,
    pub target: UsrId,
    pub location: Location,
    pub name: Option<CompactString>,
    pub role: RefRole,
    /// Structural relation (inheritance, conformance, override base, type
    /// footprint) as opposed to an expression-level use.
    pub is_related: bool,
    /// The occurrence only wrote the target, never read or called it.
    pub is_write_only: bool,
    pub parent: Option<DeclId>,
}

impl Reference {
    /// A reference not yet owned by the graph. The id is a placeholder until
    /// [`crate::graph::SourceGraph::add_reference`] attaches it.
    pub fn new(kind: DeclKind, target: UsrId, location: Location) -> Self {
        Self {
            id: RefId::from_index(0),
            kind,
            target,
            location,
            name: None,
            role: RefRole::Plain,
            is_related: false,
            is_write_only: false,
            parent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileId;

    #[test]
    fn test_reference_defaults() {
        let file = FileId::new(1).unwrap();
        let r = Reference::new(
            DeclKind::MethodInstance,
            UsrId::new(7).unwrap(),
            Location::new(file, 4, 9),
        );

        assert_eq!(r.role, RefRole::Plain);
        assert!(!r.is_related);
        assert!(!r.is_write_only);
        assert!(r.parent.is_none());
    }
}
