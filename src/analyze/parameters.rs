//! Unused-parameter analysis.
//!
//! The parser reports, per function location, the parameter names never
//! read inside the body. This pass attaches each as a parameter declaration
//! under its function and retains the ones policy says must keep their
//! slot: objc-exposed signatures, protocol requirements and their
//! implementations, overrides, `_` placeholders, and parameters named by an
//! `ignore-parameters` command.

use crate::analyze::{AnalyzerContext, GraphMutator};
use crate::decl::DeclKind;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;
use tracing::debug;

pub struct UnusedParameterAnalyzer;

impl GraphMutator for UnusedParameterAnalyzer {
    fn name(&self) -> &'static str {
        "unused-parameter-analyzer"
    }

    fn mutate(&self, graph: &mut SourceGraph, ctx: &AnalyzerContext) -> ScanResult<()> {
        let analysis = &ctx.settings.analysis;
        for (location, names) in &ctx.unused_parameters {
            let Some(function) = graph.decl_at(*location) else {
                debug!(?location, "no function at unused-parameter record");
                continue;
            };
            if !graph.decl(function).kind.is_function() {
                continue;
            }
            let protocol_member = is_protocol_requirement_or_implementation(graph, function);

            for name in names {
                let param =
                    graph.add_declaration(DeclKind::VariableParameter, *location, Some(name));
                if param == function {
                    continue;
                }
                graph.set_parent(param, function);
                graph.decl_mut(function).unused_parameters.insert(param);

                let function_decl = graph.decl(function);
                let retained = &**name == "_"
                    || function_decl.commands.iter().any(|c| c.ignores_parameter(name))
                    || function_decl.is_override()
                    || (function_decl.is_objc_accessible && analysis.retain_objc_accessible)
                    || (analysis.retain_unused_protocol_func_params && protocol_member)
                    || graph.is_retained(function);
                if retained {
                    graph.retain(param);
                }
            }
        }
        Ok(())
    }
}

/// The function is a protocol requirement, or satisfies one (its related
/// edges point at a member parented by a protocol).
fn is_protocol_requirement_or_implementation(graph: &SourceGraph, function: DeclId) -> bool {
    let decl = graph.decl(function);
    if decl
        .parent
        .is_some_and(|p| graph.decl(p).kind == DeclKind::Protocol)
    {
        return true;
    }
    decl.related.iter().any(|&rid| {
        graph
            .decl_by_usr(graph.reference(rid).target)
            .and_then(|target| graph.decl(target).parent)
            .is_some_and(|p| graph.decl(p).kind == DeclKind::Protocol)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::syntax::CommentCommand;
    use crate::types::{Location, compact_string};
    use std::path::Path;
    use std::sync::Arc;

    struct Fixture {
        graph: SourceGraph,
        file: crate::types::FileId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut graph = SourceGraph::new();
            let file = graph.add_file(Path::new("/src/F.swift"), [compact_string("App")]);
            Self { graph, file }
        }

        fn function(&mut self, line: u32, name: &str) -> (DeclId, Location) {
            let location = Location::new(self.file, line, 6);
            let id = self
                .graph
                .add_declaration(DeclKind::FreeFunction, location, Some(name));
            (id, location)
        }

        fn run(&mut self, settings: Settings, unused: Vec<(Location, Vec<&str>)>) {
            let mut ctx = AnalyzerContext::new(Arc::new(settings));
            ctx.unused_parameters = unused
                .into_iter()
                .map(|(l, names)| (l, names.into_iter().map(Into::into).collect()))
                .collect();
            UnusedParameterAnalyzer.mutate(&mut self.graph, &ctx).unwrap();
        }

        fn params_of(&self, function: DeclId) -> Vec<(String, bool)> {
            self.graph
                .decl(function)
                .unused_parameters
                .iter()
                .map(|&p| {
                    (
                        self.graph.decl(p).name_str().unwrap().to_string(),
                        self.graph.is_retained(p),
                    )
                })
                .collect()
        }
    }

    #[test]
    fn test_unused_parameter_attached_and_unretained() {
        let mut fx = Fixture::new();
        let (f, location) = fx.function(1, "f(a:b:)");

        fx.run(Settings::default(), vec![(location, vec!["b"])]);

        let params = fx.params_of(f);
        assert_eq!(params, vec![("b".to_string(), false)]);
    }

    #[test]
    fn test_ignore_parameters_command_retains_named() {
        let mut fx = Fixture::new();
        let (f, location) = fx.function(1, "f(a:b:)");
        fx.graph
            .decl_mut(f)
            .commands
            .push(CommentCommand::IgnoreParameters(vec!["b".into()]));

        fx.run(Settings::default(), vec![(location, vec!["a", "b"])]);

        let params = fx.params_of(f);
        assert_eq!(
            params,
            vec![("a".to_string(), false), ("b".to_string(), true)]
        );
    }

    #[test]
    fn test_underscore_and_override_parameters_retained() {
        let mut fx = Fixture::new();
        let (f, location) = fx.function(1, "f(_:)");
        fx.run(Settings::default(), vec![(location, vec!["_"])]);
        assert_eq!(fx.params_of(f), vec![("_".to_string(), true)]);

        let (g, g_location) = fx.function(5, "g(x:)");
        fx.graph.decl_mut(g).modifiers.insert("override".into());
        fx.run(Settings::default(), vec![(g_location, vec!["x"])]);
        assert_eq!(fx.params_of(g), vec![("x".to_string(), true)]);
    }

    #[test]
    fn test_protocol_requirement_parameters_follow_option() {
        let mut fx = Fixture::new();
        let protocol = fx.graph.add_declaration(
            DeclKind::Protocol,
            Location::new(fx.file, 1, 10),
            Some("P"),
        );
        let location = Location::new(fx.file, 2, 10);
        let req = fx
            .graph
            .add_declaration(DeclKind::MethodInstance, location, Some("f(a:)"));
        fx.graph.set_parent(req, protocol);

        fx.run(Settings::default(), vec![(location, vec!["a"])]);
        assert_eq!(fx.params_of(req), vec![("a".to_string(), true)]);

        let mut fx = Fixture::new();
        let protocol = fx.graph.add_declaration(
            DeclKind::Protocol,
            Location::new(fx.file, 1, 10),
            Some("P"),
        );
        let location = Location::new(fx.file, 2, 10);
        let req = fx
            .graph
            .add_declaration(DeclKind::MethodInstance, location, Some("f(a:)"));
        fx.graph.set_parent(req, protocol);

        let mut settings = Settings::default();
        settings.analysis.retain_unused_protocol_func_params = false;
        fx.run(settings, vec![(location, vec!["a"])]);
        assert_eq!(fx.params_of(req), vec![("a".to_string(), false)]);
    }

    #[test]
    fn test_objc_function_parameters_follow_option() {
        let mut fx = Fixture::new();
        let (f, location) = fx.function(1, "handle(sender:)");
        fx.graph.decl_mut(f).is_objc_accessible = true;

        let mut settings = Settings::default();
        settings.analysis.retain_objc_accessible = true;
        fx.run(settings, vec![(location, vec!["sender"])]);
        assert_eq!(fx.params_of(f), vec![("sender".to_string(), true)]);
    }
}
