//! The declaration side of the source graph: kinds, accessibility, and the
//! `Declaration` node itself.

mod reference;

pub use reference::{RefRole, Reference};

use crate::syntax::CommentCommand;
use crate::types::{CompactString, DeclId, Location, RefId, UsrId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Every kind of declaration the compiler index can describe. Closed set;
/// adding a variant is a compile-checked change everywhere we match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclKind {
    Module,
    Enum,
    Struct,
    Class,
    Protocol,
    #[serde(rename = "extension-of-class")]
    ExtensionClass,
    #[serde(rename = "extension-of-struct")]
    ExtensionStruct,
    #[serde(rename = "extension-of-protocol")]
    ExtensionProtocol,
    #[serde(rename = "extension-of-enum")]
    ExtensionEnum,
    Typealias,
    AssociatedType,
    #[serde(rename = "generic-type-parameter")]
    GenericTypeParam,
    FreeFunction,
    MethodInstance,
    MethodClass,
    MethodStatic,
    Constructor,
    Destructor,
    OperatorInfix,
    OperatorPrefix,
    OperatorPostfix,
    Subscript,
    AccessorGetter,
    AccessorSetter,
    #[serde(rename = "accessor-didset")]
    AccessorDidSet,
    #[serde(rename = "accessor-willset")]
    AccessorWillSet,
    AccessorAddress,
    AccessorMutableAddress,
    VariableInstance,
    VariableClass,
    VariableStatic,
    VariableGlobal,
    VariableLocal,
    VariableParameter,
    EnumCase,
}

impl DeclKind {
    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            Self::ExtensionClass | Self::ExtensionStruct | Self::ExtensionProtocol | Self::ExtensionEnum
        )
    }

    pub fn is_concrete_type(&self) -> bool {
        matches!(self, Self::Enum | Self::Struct | Self::Class)
    }

    pub fn is_conformable(&self) -> bool {
        self.is_concrete_type() || self.is_extension()
    }

    pub fn is_accessor(&self) -> bool {
        matches!(
            self,
            Self::AccessorGetter
                | Self::AccessorSetter
                | Self::AccessorDidSet
                | Self::AccessorWillSet
                | Self::AccessorAddress
                | Self::AccessorMutableAddress
        )
    }

    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            Self::VariableInstance
                | Self::VariableClass
                | Self::VariableStatic
                | Self::VariableGlobal
                | Self::VariableLocal
                | Self::VariableParameter
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Self::FreeFunction
                | Self::MethodInstance
                | Self::MethodClass
                | Self::MethodStatic
                | Self::Constructor
                | Self::Destructor
                | Self::OperatorInfix
                | Self::OperatorPrefix
                | Self::OperatorPostfix
                | Self::Subscript
        )
    }

    /// A member that can satisfy a protocol requirement.
    pub fn is_protocol_member_candidate(&self) -> bool {
        matches!(
            self,
            Self::MethodInstance
                | Self::MethodClass
                | Self::MethodStatic
                | Self::Constructor
                | Self::Subscript
                | Self::VariableInstance
                | Self::VariableClass
                | Self::VariableStatic
                | Self::AssociatedType
                | Self::Typealias
        )
    }

    /// Human label used when rendering findings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Module => "Module",
            Self::Enum => "Enum",
            Self::Struct => "Struct",
            Self::Class => "Class",
            Self::Protocol => "Protocol",
            Self::ExtensionClass
            | Self::ExtensionStruct
            | Self::ExtensionProtocol
            | Self::ExtensionEnum => "Extension",
            Self::Typealias => "Typealias",
            Self::AssociatedType => "Associated type",
            Self::GenericTypeParam => "Generic type parameter",
            Self::FreeFunction | Self::MethodInstance | Self::MethodClass | Self::MethodStatic => {
                "Function"
            }
            Self::Constructor => "Initializer",
            Self::Destructor => "Deinitializer",
            Self::OperatorInfix | Self::OperatorPrefix | Self::OperatorPostfix => "Operator",
            Self::Subscript => "Subscript",
            Self::AccessorGetter
            | Self::AccessorSetter
            | Self::AccessorDidSet
            | Self::AccessorWillSet
            | Self::AccessorAddress
            | Self::AccessorMutableAddress => "Accessor",
            Self::VariableInstance
            | Self::VariableClass
            | Self::VariableStatic
            | Self::VariableGlobal
            | Self::VariableLocal => "Property",
            Self::VariableParameter => "Parameter",
            Self::EnumCase => "Enum case",
        }
    }

    /// Tie-break rank for location-based reference attribution. Lower ranks
    /// win. Properties and subscripts must rank above their accessors so a
    /// reference on a one-line `var x: T { get }` attributes to the property.
    pub fn disambiguation_rank(&self) -> u8 {
        match self {
            Self::Module => 0,
            Self::Enum | Self::Struct | Self::Class | Self::Protocol => 1,
            Self::ExtensionClass | Self::ExtensionStruct | Self::ExtensionProtocol | Self::ExtensionEnum => 2,
            Self::Typealias | Self::AssociatedType | Self::GenericTypeParam => 3,
            Self::VariableInstance
            | Self::VariableClass
            | Self::VariableStatic
            | Self::VariableGlobal
            | Self::VariableLocal => 4,
            Self::Subscript => 4,
            Self::EnumCase => 5,
            Self::AccessorGetter
            | Self::AccessorSetter
            | Self::AccessorDidSet
            | Self::AccessorWillSet
            | Self::AccessorAddress
            | Self::AccessorMutableAddress => 6,
            Self::FreeFunction
            | Self::MethodInstance
            | Self::MethodClass
            | Self::MethodStatic
            | Self::Constructor
            | Self::Destructor
            | Self::OperatorInfix
            | Self::OperatorPrefix
            | Self::OperatorPostfix => 7,
            Self::VariableParameter => 8,
        }
    }
}

/// Swift access levels, ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    Private,
    Fileprivate,
    #[default]
    Internal,
    Package,
    Public,
    Open,
}

impl Accessibility {
    pub fn is_accessible_across_modules(&self) -> bool {
        matches!(self, Self::Public | Self::Open)
    }
}

/// Source locations where a declaration's type appears, grouped by position.
/// Filled in by syntax enrichment and consulted when assigning reference
/// roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFootprint {
    pub inherited: HashSet<Location>,
    pub variable_type: HashSet<Location>,
    pub return_type: HashSet<Location>,
    pub parameter_type: HashSet<Location>,
    pub generic_parameter: HashSet<Location>,
    pub generic_requirement: HashSet<Location>,
    pub variable_init_call: HashSet<Location>,
    pub metatype_argument: HashSet<Location>,
}

impl TypeFootprint {
    /// The role a reference at `location` plays, if the location falls in
    /// one of the footprint sets.
    pub fn role_at(&self, location: Location) -> Option<RefRole> {
        if self.variable_type.contains(&location) {
            Some(RefRole::VariableType)
        } else if self.return_type.contains(&location) {
            Some(RefRole::ReturnType)
        } else if self.parameter_type.contains(&location) {
            Some(RefRole::ParameterType)
        } else if self.generic_parameter.contains(&location) {
            Some(RefRole::GenericParameterType)
        } else if self.generic_requirement.contains(&location) {
            Some(RefRole::GenericRequirementType)
        } else if self.variable_init_call.contains(&location) {
            Some(RefRole::VariableInitFunctionCall)
        } else if self.metatype_argument.contains(&location) {
            Some(RefRole::FunctionCallMetatypeArgument)
        } else {
            None
        }
    }

    pub fn is_inherited_position(&self, location: Location) -> bool {
        self.inherited.contains(&location)
    }
}

/// A named program entity owned by the source graph. One logical declaration
/// may aggregate several index records and therefore carry several USRs.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    pub usrs: IndexSet<UsrId>,
    pub location: Location,
    pub name: Option<CompactString>,

    pub accessibility: Accessibility,
    /// True when the accessibility was written in source rather than
    /// defaulted.
    pub explicit_accessibility: bool,
    /// Minimum of the explicit accessibility and every enclosing
    /// declaration's. Computed by the accessibility cascade.
    pub effective_accessibility: Accessibility,

    pub attributes: IndexSet<CompactString>,
    pub modifiers: IndexSet<CompactString>,
    pub commands: Vec<CommentCommand>,
    pub declared_type: Option<CompactString>,
    pub footprint: TypeFootprint,
    pub let_shorthand_identifiers: IndexSet<CompactString>,

    pub is_implicit: bool,
    pub is_objc_accessible: bool,
    pub has_capital_self_function_call: bool,
    pub has_generic_function_returned_metatype_parameters: bool,

    pub parent: Option<DeclId>,
    pub children: IndexSet<DeclId>,
    /// Expression-level uses this declaration makes of others.
    pub references: IndexSet<RefId>,
    /// Structural relations: inheritance, conformance, override bases, type
    /// footprints.
    pub related: IndexSet<RefId>,
    /// Parameters the parser found unread in this function's body.
    pub unused_parameters: IndexSet<DeclId>,
}

impl Declaration {
    pub fn new(id: DeclId, kind: DeclKind, location: Location) -> Self {
        Self {
            id,
            kind,
            usrs: IndexSet::new(),
            location,
            name: None,
            accessibility: Accessibility::default(),
            explicit_accessibility: false,
            effective_accessibility: Accessibility::default(),
            attributes: IndexSet::new(),
            modifiers: IndexSet::new(),
            commands: Vec::new(),
            declared_type: None,
            footprint: TypeFootprint::default(),
            let_shorthand_identifiers: IndexSet::new(),
            is_implicit: false,
            is_objc_accessible: false,
            has_capital_self_function_call: false,
            has_generic_function_returned_metatype_parameters: false,
            parent: None,
            children: IndexSet::new(),
            references: IndexSet::new(),
            related: IndexSet::new(),
            unused_parameters: IndexSet::new(),
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| &**a == name)
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| &**m == name)
    }

    pub fn is_override(&self) -> bool {
        self.has_modifier("override")
    }

    /// Base identifier without the argument list, e.g. `f` for `f(a:b:)`.
    pub fn base_name(&self) -> Option<&str> {
        self.name_str().map(|n| n.split('(').next().unwrap_or(n))
    }

    /// Structurally required declarations are never reported: removing them
    /// would not compile or changes runtime behavior regardless of use.
    pub fn is_structurally_required(&self) -> bool {
        match self.kind {
            DeclKind::Destructor => true,
            DeclKind::Constructor => self.has_modifier("required"),
            _ => false,
        }
    }
}
