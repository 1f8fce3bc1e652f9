//! Retention of compiler-synthesized members.
//!
//! Conformance to Codable, Hashable, CaseIterable, or RawRepresentable
//! synthesizes members the index may show no explicit use of. The members
//! themselves arrive implicit (and so retained at ingest); this pass keeps
//! the declarations they read: stored properties for coding conformances,
//! cases for CaseIterable, and user-written replacements for the
//! synthesized member names.

use crate::analyze::{AnalyzerContext, GraphMutator};
use crate::decl::DeclKind;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;

pub struct SynthesizedMemberRetainer;

const ENCODABLE: &[&str] = &["Codable", "Encodable"];
const DECODABLE: &[&str] = &["Codable", "Decodable"];

impl GraphMutator for SynthesizedMemberRetainer {
    fn name(&self) -> &'static str {
        "synthesized-member-retainer"
    }

    fn mutate(&self, graph: &mut SourceGraph, ctx: &AnalyzerContext) -> ScanResult<()> {
        let external = &ctx.settings.analysis.external_encodable_protocols;
        let conformances: Vec<(DeclId, String)> = graph
            .conformances
            .iter()
            .map(|c| (c.conformer, c.protocol_name.to_string()))
            .collect();

        for (conformer, protocol) in conformances {
            let is_encodable =
                ENCODABLE.contains(&protocol.as_str()) || external.iter().any(|p| *p == protocol);
            let is_decodable = DECODABLE.contains(&protocol.as_str());

            if is_encodable || is_decodable {
                if is_decodable {
                    retain_members_named(graph, conformer, &["init(from:)"]);
                }
                if is_encodable {
                    retain_members_named(graph, conformer, &["encode(to:)"]);
                }
                // Coding reads every stored property.
                retain_members_of_kind(graph, conformer, |k| {
                    matches!(k, DeclKind::VariableInstance | DeclKind::EnumCase)
                });
            }

            match protocol.as_str() {
                "Hashable" => {
                    retain_members_named(graph, conformer, &["hash(into:)", "hashValue"]);
                }
                "CaseIterable" => {
                    retain_members_named(graph, conformer, &["allCases"]);
                    retain_members_of_kind(graph, conformer, |k| k == DeclKind::EnumCase);
                }
                "RawRepresentable" => {
                    retain_members_named(graph, conformer, &["rawValue", "init(rawValue:)"]);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn retain_members_named(graph: &mut SourceGraph, owner: DeclId, names: &[&str]) {
    let members: Vec<DeclId> = graph
        .decl(owner)
        .children
        .iter()
        .copied()
        .filter(|&m| graph.decl(m).name_str().is_some_and(|n| names.contains(&n)))
        .collect();
    for member in members {
        graph.retain(member);
    }
}

fn retain_members_of_kind(
    graph: &mut SourceGraph,
    owner: DeclId,
    predicate: impl Fn(DeclKind) -> bool,
) {
    let members: Vec<DeclId> = graph
        .decl(owner)
        .children
        .iter()
        .copied()
        .filter(|&m| predicate(graph.decl(m).kind))
        .collect();
    for member in members {
        graph.retain(member);
    }
}
