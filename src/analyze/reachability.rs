//! Transitive reachability: the closure over outgoing references, plain and
//! related, from the retained set. Every declaration reached is live.

use crate::analyze::{AnalyzerContext, GraphMutator};
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;
use std::collections::VecDeque;
use tracing::info;

pub struct Reachability;

impl GraphMutator for Reachability {
    fn name(&self) -> &'static str {
        "reachability"
    }

    fn mutate(&self, graph: &mut SourceGraph, ctx: &AnalyzerContext) -> ScanResult<()> {
        let retain_assign_only = ctx.settings.analysis.retain_assign_only_properties;
        let mut queue: VecDeque<DeclId> = graph.retained().collect();

        while let Some(id) = queue.pop_front() {
            if !graph.mark_live(id) {
                continue;
            }
            let decl = graph.decl(id);
            let outgoing: Vec<_> = decl
                .references
                .iter()
                .chain(decl.related.iter())
                .copied()
                .collect();
            for rid in outgoing {
                let reference = graph.reference(rid);
                let Some(target) = graph.decl_by_usr(reference.target) else {
                    continue;
                };
                // A pure assignment is not a use of a property; the value
                // never escapes through it.
                if reference.is_write_only
                    && !retain_assign_only
                    && graph.decl(target).kind.is_variable()
                {
                    continue;
                }
                if !graph.is_live(target) {
                    queue.push_back(target);
                }
            }
        }

        info!(
            live = graph.declaration_ids().iter().filter(|&&id| graph.is_live(id)).count(),
            total = graph.declaration_count(),
            "reachability complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::decl::{DeclKind, Reference};
    use crate::types::{Location, compact_string};
    use std::path::Path;
    use std::sync::Arc;

    fn run(graph: &mut SourceGraph, retain_assign_only: bool) {
        let mut settings = Settings::default();
        settings.analysis.retain_assign_only_properties = retain_assign_only;
        let ctx = AnalyzerContext::new(Arc::new(settings));
        Reachability.mutate(graph, &ctx).unwrap();
    }

    #[test]
    fn test_closure_from_retained_set() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/src/M.swift"), [compact_string("App")]);

        let main = graph.add_declaration(DeclKind::FreeFunction, Location::new(file, 1, 6), Some("main()"));
        let used = graph.add_declaration(DeclKind::FreeFunction, Location::new(file, 4, 6), Some("used()"));
        let used_usr = graph.intern_usr("s:3App4usedyyF");
        graph.bind_usr(used, used_usr);
        let unused =
            graph.add_declaration(DeclKind::FreeFunction, Location::new(file, 8, 6), Some("unused()"));
        let unused_usr = graph.intern_usr("s:3App6unusedyyF");
        graph.bind_usr(unused, unused_usr);
        // unused() calls used() too; an edge from dead code must not confer
        // liveness.
        graph.add_reference(
            Reference::new(DeclKind::FreeFunction, used_usr, Location::new(file, 9, 5)),
            unused,
        );
        graph.add_reference(
            Reference::new(DeclKind::FreeFunction, used_usr, Location::new(file, 2, 5)),
            main,
        );
        graph.retain(main);

        run(&mut graph, false);

        assert!(graph.is_live(main));
        assert!(graph.is_live(used));
        assert!(!graph.is_live(unused));
    }

    #[test]
    fn test_write_only_reference_does_not_propagate() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/src/M.swift"), [compact_string("App")]);

        let main = graph.add_declaration(DeclKind::FreeFunction, Location::new(file, 1, 6), Some("main()"));
        let property = graph.add_declaration(
            DeclKind::VariableInstance,
            Location::new(file, 5, 9),
            Some("cache"),
        );
        let usr = graph.intern_usr("s:3App5cacheSSvp");
        graph.bind_usr(property, usr);

        let mut write = Reference::new(DeclKind::VariableInstance, usr, Location::new(file, 2, 5));
        write.is_write_only = true;
        graph.add_reference(write, main);
        graph.retain(main);

        run(&mut graph, false);
        assert!(!graph.is_live(property));

        // With the option set, assignment counts as use.
        let mut graph2 = SourceGraph::new();
        let file = graph2.add_file(Path::new("/src/M.swift"), [compact_string("App")]);
        let main = graph2.add_declaration(DeclKind::FreeFunction, Location::new(file, 1, 6), Some("main()"));
        let property = graph2.add_declaration(
            DeclKind::VariableInstance,
            Location::new(file, 5, 9),
            Some("cache"),
        );
        let usr = graph2.intern_usr("s:3App5cacheSSvp");
        graph2.bind_usr(property, usr);
        let mut write = Reference::new(DeclKind::VariableInstance, usr, Location::new(file, 2, 5));
        write.is_write_only = true;
        graph2.add_reference(write, main);
        graph2.retain(main);

        run(&mut graph2, true);
        assert!(graph2.is_live(property));
    }

    #[test]
    fn test_related_edges_propagate() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/src/M.swift"), [compact_string("App")]);

        let requirement =
            graph.add_declaration(DeclKind::MethodInstance, Location::new(file, 2, 10), Some("f()"));
        let implementation =
            graph.add_declaration(DeclKind::MethodInstance, Location::new(file, 6, 10), Some("f()"));
        let impl_usr = graph.intern_usr("s:3App1SV1fyyF");
        graph.bind_usr(implementation, impl_usr);

        let mut related =
            Reference::new(DeclKind::MethodInstance, impl_usr, Location::new(file, 6, 10));
        related.is_related = true;
        graph.add_reference(related, requirement);
        graph.retain(requirement);

        run(&mut graph, false);
        assert!(graph.is_live(implementation));
    }
}
