//! Protocol conformance extension.
//!
//! The index records that a type conforms to a protocol, but not that using
//! a requirement through the protocol uses the concrete implementation.
//! This pass synthesizes related references between each protocol
//! requirement and the member satisfying it, in both directions, so a call
//! through the abstraction retains the implementation and a live
//! implementation keeps its requirement. Default implementations from
//! protocol extensions stand in when the conformer supplies no member.

use crate::analyze::{AnalyzerContext, GraphMutator, add_related_edge};
use crate::decl::DeclKind;
use crate::error::ScanResult;
use crate::graph::{Conformance, SourceGraph};
use crate::types::{CompactString, DeclId};
use std::collections::HashMap;

pub struct ProtocolConformanceExtender;

struct DiscoveredConformance {
    conformer: DeclId,
    protocol: Option<DeclId>,
    protocol_name: CompactString,
}

impl GraphMutator for ProtocolConformanceExtender {
    fn name(&self) -> &'static str {
        "protocol-conformance-extender"
    }

    fn mutate(&self, graph: &mut SourceGraph, _ctx: &AnalyzerContext) -> ScanResult<()> {
        let ids = graph.declaration_ids();
        let extensions_of = collect_extensions(graph, &ids);
        let discovered = collect_conformances(graph, &ids);

        for conformance in discovered {
            graph.conformances.push(Conformance {
                conformer: conformance.conformer,
                protocol: conformance.protocol,
                protocol_name: conformance.protocol_name.clone(),
            });
            let Some(protocol) = conformance.protocol else {
                continue;
            };

            let requirements: Vec<DeclId> = graph
                .decl(protocol)
                .children
                .iter()
                .copied()
                .filter(|&m| graph.decl(m).kind.is_protocol_member_candidate())
                .collect();
            let implementations = members_including_extensions(
                graph,
                conformance.conformer,
                &extensions_of,
            );
            let defaults: Vec<DeclId> = extensions_of
                .get(&protocol)
                .into_iter()
                .flatten()
                .flat_map(|&ext| graph.decl(ext).children.iter().copied())
                .collect();

            for requirement in requirements {
                let req = graph.decl(requirement);
                let req_name = req.name.clone();
                let req_kind = req.kind;

                let satisfied = implementations.iter().copied().find(|&m| {
                    let member = graph.decl(m);
                    member.name == req_name && member_kind_matches(req_kind, member.kind)
                });
                if let Some(member) = satisfied {
                    add_related_edge(graph, requirement, member);
                    add_related_edge(graph, member, requirement);
                    continue;
                }

                let default = defaults.iter().copied().find(|&m| {
                    let member = graph.decl(m);
                    member.name == req_name && member_kind_matches(req_kind, member.kind)
                });
                if let Some(member) = default {
                    add_related_edge(graph, requirement, member);
                }
            }
        }
        Ok(())
    }
}

/// extended type → its extension declarations
fn collect_extensions(graph: &SourceGraph, ids: &[DeclId]) -> HashMap<DeclId, Vec<DeclId>> {
    let mut extensions_of: HashMap<DeclId, Vec<DeclId>> = HashMap::new();
    for &id in ids {
        let decl = graph.decl(id);
        if !decl.kind.is_extension() {
            continue;
        }
        for &rid in decl.related.iter() {
            let reference = graph.reference(rid);
            if let Some(extended) = graph.decl_by_usr(reference.target) {
                let extended_kind = graph.decl(extended).kind;
                if matches!(
                    extended_kind,
                    DeclKind::Class | DeclKind::Struct | DeclKind::Enum | DeclKind::Protocol
                ) && graph.decl(extended).name == decl.name
                {
                    extensions_of.entry(extended).or_default().push(id);
                    break;
                }
            }
        }
    }
    extensions_of
}

fn collect_conformances(graph: &SourceGraph, ids: &[DeclId]) -> Vec<DiscoveredConformance> {
    let mut discovered = Vec::new();
    for &id in ids {
        let decl = graph.decl(id);
        if !decl.kind.is_conformable() {
            continue;
        }
        for &rid in decl.related.iter() {
            let reference = graph.reference(rid);
            if reference.kind != DeclKind::Protocol {
                continue;
            }
            let protocol = graph.decl_by_usr(reference.target);
            // An extension's link to the protocol it extends is structure,
            // not conformance.
            if decl.kind == DeclKind::ExtensionProtocol
                && protocol.is_some_and(|p| graph.decl(p).name == decl.name)
            {
                continue;
            }
            let protocol_name = protocol
                .and_then(|p| graph.decl(p).name.clone())
                .or_else(|| reference.name.clone());
            let Some(protocol_name) = protocol_name else {
                continue;
            };
            discovered.push(DiscoveredConformance {
                conformer: id,
                protocol,
                protocol_name,
            });
        }
    }
    discovered
}

fn members_including_extensions(
    graph: &SourceGraph,
    owner: DeclId,
    extensions_of: &HashMap<DeclId, Vec<DeclId>>,
) -> Vec<DeclId> {
    let mut members: Vec<DeclId> = graph.decl(owner).children.iter().copied().collect();
    for &ext in extensions_of.get(&owner).into_iter().flatten() {
        members.extend(graph.decl(ext).children.iter().copied());
    }
    members
}

fn member_kind_matches(requirement: DeclKind, member: DeclKind) -> bool {
    requirement == member
        || (requirement.is_function() && member.is_function())
        || (requirement.is_variable() && member.is_variable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::types::{Location, compact_string};
    use std::path::Path;
    use std::sync::Arc;

    fn ctx() -> AnalyzerContext {
        AnalyzerContext::new(Arc::new(Settings::default()))
    }

    struct Fixture {
        graph: SourceGraph,
        file: crate::types::FileId,
        next_line: u32,
    }

    impl Fixture {
        fn new() -> Self {
            let mut graph = SourceGraph::new();
            let file = graph.add_file(Path::new("/src/P.swift"), [compact_string("App")]);
            Self { graph, file, next_line: 1 }
        }

        fn decl(&mut self, kind: DeclKind, name: &str, usr: &str) -> DeclId {
            let line = self.next_line;
            self.next_line += 1;
            let id = self
                .graph
                .add_declaration(kind, Location::new(self.file, line, 1), Some(name));
            let usr = self.graph.intern_usr(usr);
            self.graph.bind_usr(id, usr);
            id
        }

        fn relate(&mut self, from: DeclId, to: DeclId) {
            add_related_edge(&mut self.graph, from, to);
        }

        fn has_related_edge(&self, from: DeclId, to: DeclId) -> bool {
            let target_usrs = &self.graph.decl(to).usrs;
            self.graph.decl(from).related.iter().any(|&rid| {
                let r = self.graph.reference(rid);
                target_usrs.contains(&r.target)
            })
        }
    }

    #[test]
    fn test_requirement_linked_to_implementation_both_ways() {
        let mut fx = Fixture::new();
        let protocol = fx.decl(DeclKind::Protocol, "P", "s:3App1PP");
        let requirement = fx.decl(DeclKind::MethodInstance, "f()", "s:3App1PP1fyyF");
        fx.graph.set_parent(requirement, protocol);

        let conformer = fx.decl(DeclKind::Struct, "S", "s:3App1SV");
        let implementation = fx.decl(DeclKind::MethodInstance, "f()", "s:3App1SV1fyyF");
        fx.graph.set_parent(implementation, conformer);
        fx.relate(conformer, protocol);

        ProtocolConformanceExtender.mutate(&mut fx.graph, &ctx()).unwrap();

        assert!(fx.has_related_edge(requirement, implementation));
        assert!(fx.has_related_edge(implementation, requirement));
        assert_eq!(fx.graph.conformances.len(), 1);
        assert_eq!(&*fx.graph.conformances[0].protocol_name, "P");
    }

    #[test]
    fn test_default_implementation_from_protocol_extension() {
        let mut fx = Fixture::new();
        let protocol = fx.decl(DeclKind::Protocol, "P", "s:3App1PP");
        let requirement = fx.decl(DeclKind::MethodInstance, "f()", "s:3App1PP1fyyF");
        fx.graph.set_parent(requirement, protocol);

        let extension = fx.decl(DeclKind::ExtensionProtocol, "P", "s:e:3App1PPext");
        let default_impl = fx.decl(DeclKind::MethodInstance, "f()", "s:3App1PPE1fyyF");
        fx.graph.set_parent(default_impl, extension);
        fx.relate(extension, protocol);

        // S conforms but supplies no f().
        let conformer = fx.decl(DeclKind::Struct, "S", "s:3App1SV");
        fx.relate(conformer, protocol);

        ProtocolConformanceExtender.mutate(&mut fx.graph, &ctx()).unwrap();

        assert!(fx.has_related_edge(requirement, default_impl));
    }

    #[test]
    fn test_implementation_found_in_type_extension() {
        let mut fx = Fixture::new();
        let protocol = fx.decl(DeclKind::Protocol, "P", "s:3App1PP");
        let requirement = fx.decl(DeclKind::MethodInstance, "f()", "s:3App1PP1fyyF");
        fx.graph.set_parent(requirement, protocol);

        let conformer = fx.decl(DeclKind::Struct, "S", "s:3App1SV");
        fx.relate(conformer, protocol);

        let extension = fx.decl(DeclKind::ExtensionStruct, "S", "s:e:3App1SVext");
        let implementation = fx.decl(DeclKind::MethodInstance, "f()", "s:3App1SVE1fyyF");
        fx.graph.set_parent(implementation, extension);
        fx.relate(extension, conformer);

        ProtocolConformanceExtender.mutate(&mut fx.graph, &ctx()).unwrap();

        assert!(fx.has_related_edge(requirement, implementation));
    }

    #[test]
    fn test_external_protocol_recorded_without_edges() {
        let mut fx = Fixture::new();
        let conformer = fx.decl(DeclKind::Enum, "E", "s:3App1EO");
        // Codable never resolves to a declaration.
        let codable = fx.graph.intern_usr("s:s7CodableP");
        let mut reference = crate::decl::Reference::new(
            DeclKind::Protocol,
            codable,
            Location::new(fx.file, 1, 10),
        );
        reference.name = Some("Codable".into());
        reference.is_related = true;
        fx.graph.add_reference(reference, conformer);

        ProtocolConformanceExtender.mutate(&mut fx.graph, &ctx()).unwrap();

        assert_eq!(fx.graph.conformances.len(), 1);
        assert!(fx.graph.conformances[0].protocol.is_none());
        assert_eq!(&*fx.graph.conformances[0].protocol_name, "Codable");
    }
}
