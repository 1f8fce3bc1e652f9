//! Applies the syntax provider's output to the graph: accessibility,
//! attributes, type footprints, comment commands, and finally reference
//! roles.

use crate::decl::{DeclKind, RefRole};
use crate::graph::SourceGraph;
use crate::syntax::{CommentCommand, FileSyntax, SourcePoint};
use crate::types::{CompactString, FileId, Location, RefId};
use tracing::debug;

fn locate(file: FileId, points: &[SourcePoint]) -> impl Iterator<Item = Location> + '_ {
    points.iter().map(move |p| Location::new(file, p.line, p.column))
}

/// What enrichment hands back to the driver for the later analyzer passes.
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    /// (function location, parameter names unread in its body)
    pub unused_parameters: Vec<(Location, Vec<CompactString>)>,
}

/// Write one file's syntax record into its declarations.
pub fn apply_file_syntax(
    graph: &mut SourceGraph,
    file: FileId,
    syntax: &FileSyntax,
    ignore_commands: bool,
) -> EnrichOutcome {
    graph.set_imports(file, syntax.imports.clone());

    if !ignore_commands {
        let file_commands = CommentCommand::parse_lines(
            syntax.leading_comment_lines.iter().map(String::as_str),
        );
        if file_commands.contains(&CommentCommand::IgnoreAll) {
            for id in graph.declaration_ids() {
                if graph.decl(id).location.file == file {
                    graph.retain_hierarchy(id);
                }
            }
        }
    }

    for record in &syntax.declarations {
        let location = Location::new(file, record.line, record.column);
        let Some(id) = graph.decl_at(location) else {
            debug!(line = record.line, column = record.column, "no declaration at syntax record");
            continue;
        };

        let commands = if ignore_commands {
            Vec::new()
        } else {
            CommentCommand::parse_lines(record.comment_lines.iter().map(String::as_str))
        };
        let retain_subtree = commands.iter().any(|c| matches!(c, CommentCommand::Ignore));

        let decl = graph.decl_mut(id);
        if let Some(accessibility) = record.accessibility {
            decl.accessibility = accessibility;
            decl.explicit_accessibility = true;
        }
        decl.attributes.extend(record.attributes.iter().map(|a| CompactString::from(a.as_str())));
        decl.modifiers.extend(record.modifiers.iter().map(|m| CompactString::from(m.as_str())));
        decl.commands = commands;
        if let Some(ty) = &record.declared_type {
            decl.declared_type = Some(ty.as_str().into());
        }
        decl.let_shorthand_identifiers.extend(
            record.let_shorthand_identifiers.iter().map(|i| CompactString::from(i.as_str())),
        );
        decl.has_capital_self_function_call |= record.has_capital_self_function_call;
        decl.has_generic_function_returned_metatype_parameters |=
            record.has_generic_function_returned_metatype_parameters;

        decl.footprint.inherited.extend(locate(file, &record.inherited_types));
        decl.footprint.variable_type.extend(locate(file, &record.variable_types));
        decl.footprint.return_type.extend(locate(file, &record.return_types));
        decl.footprint.parameter_type.extend(locate(file, &record.parameter_types));
        decl.footprint.generic_parameter.extend(locate(file, &record.generic_parameters));
        decl.footprint.generic_requirement.extend(locate(file, &record.generic_requirements));
        decl.footprint.variable_init_call.extend(locate(file, &record.variable_init_calls));
        decl.footprint.metatype_argument.extend(locate(file, &record.metatype_arguments));

        if retain_subtree {
            graph.retain_hierarchy(id);
        }
    }

    EnrichOutcome {
        unused_parameters: syntax
            .unused_parameters
            .iter()
            .map(|p| {
                (
                    Location::new(file, p.line, p.column),
                    p.unused.iter().map(|n| CompactString::from(n.as_str())).collect(),
                )
            })
            .collect(),
    }
}

/// Assign each attached reference its role from the owning declaration's
/// type footprint. Runs once all references have parents, so edges attached
/// by the reconciler are covered too.
pub fn assign_reference_roles(graph: &mut SourceGraph) {
    let mut assignments: Vec<(RefId, RefRole)> = Vec::new();

    for i in 0..graph.reference_count() {
        let id = RefId::from_index(i);
        let reference = graph.reference(id);
        let Some(parent) = reference.parent else { continue };
        let decl = graph.decl(parent);

        if let Some(role) = decl.footprint.role_at(reference.location) {
            assignments.push((id, role));
        } else if decl.footprint.is_inherited_position(reference.location) {
            let target_kind = graph.decl_by_usr(reference.target).map(|d| graph.decl(d).kind);
            let role = match (decl.kind, target_kind) {
                (DeclKind::Class, Some(DeclKind::Class)) => Some(RefRole::InheritedClassType),
                (DeclKind::Protocol, Some(DeclKind::Protocol)) => Some(RefRole::RefinedProtocolType),
                _ => None,
            };
            if let Some(role) = role {
                assignments.push((id, role));
            }
        }
    }

    for (id, role) in assignments {
        graph.reference_mut(id).role = role;
    }
}
