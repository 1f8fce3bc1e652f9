//! Entry-point retention: declarations the program starts from, or that
//! frameworks and runtimes invoke reflectively, are live by definition.

use crate::analyze::{AnalyzerContext, GraphMutator};
use crate::decl::DeclKind;
use crate::error::ScanResult;
use crate::graph::SourceGraph;
use crate::types::DeclId;
use std::collections::HashMap;

pub struct EntryPointRetainer;

const MAIN_ATTRIBUTES: &[&str] = &["main", "NSApplicationMain", "UIApplicationMain"];
const INTERFACE_BUILDER_ATTRIBUTES: &[&str] =
    &["IBAction", "IBOutlet", "IBInspectable", "IBDesignable", "IBSegueAction"];
const EXPORT_ATTRIBUTES: &[&str] = &["_cdecl", "cdecl", "_dynamicReplacement"];

impl GraphMutator for EntryPointRetainer {
    fn name(&self) -> &'static str {
        "entry-point-retainer"
    }

    fn mutate(&self, graph: &mut SourceGraph, _ctx: &AnalyzerContext) -> ScanResult<()> {
        let ids = graph.declaration_ids();
        let mut test_class_memo: HashMap<DeclId, bool> = HashMap::new();

        for id in ids {
            let decl = graph.decl(id);

            if MAIN_ATTRIBUTES.iter().any(|a| decl.has_attribute(a)) {
                graph.retain(id);
                retain_members_named(graph, id, "main");
                continue;
            }

            if INTERFACE_BUILDER_ATTRIBUTES.iter().any(|a| decl.has_attribute(a))
                || EXPORT_ATTRIBUTES.iter().any(|a| decl.has_attribute(a))
            {
                graph.retain(id);
                continue;
            }

            // Top-level code in main.swift runs at launch.
            let decl = graph.decl(id);
            if decl.parent.is_none()
                && graph
                    .file_path(decl.location.file)
                    .file_name()
                    .is_some_and(|n| n == "main.swift")
            {
                graph.retain(id);
                continue;
            }

            if decl.kind == DeclKind::Class && is_test_class(graph, id, &mut test_class_memo) {
                graph.retain(id);
                let test_methods: Vec<DeclId> = graph
                    .decl(id)
                    .children
                    .iter()
                    .copied()
                    .filter(|&m| {
                        let member = graph.decl(m);
                        member.kind == DeclKind::MethodInstance
                            && member.base_name().is_some_and(|n| n.starts_with("test"))
                    })
                    .collect();
                for method in test_methods {
                    graph.retain(method);
                }
            }
        }
        Ok(())
    }
}

fn retain_members_named(graph: &mut SourceGraph, owner: DeclId, base_name: &str) {
    let members: Vec<DeclId> = graph
        .decl(owner)
        .children
        .iter()
        .copied()
        .filter(|&m| graph.decl(m).base_name() == Some(base_name))
        .collect();
    for member in members {
        graph.retain(member);
    }
}

/// Whether a class inherits XCTestCase, directly or through indexed bases.
fn is_test_class(graph: &SourceGraph, id: DeclId, memo: &mut HashMap<DeclId, bool>) -> bool {
    if let Some(&known) = memo.get(&id) {
        return known;
    }
    // Guards cycles in malformed inheritance chains.
    memo.insert(id, false);

    let decl = graph.decl(id);
    let mut result = false;
    for &rid in decl.related.iter() {
        let reference = graph.reference(rid);
        if reference.kind != DeclKind::Class {
            continue;
        }
        if reference.name.as_deref() == Some("XCTestCase") {
            result = true;
            break;
        }
        if let Some(base) = graph.decl_by_usr(reference.target) {
            if graph.decl(base).name_str() == Some("XCTestCase")
                || is_test_class(graph, base, memo)
            {
                result = true;
                break;
            }
        }
    }
    memo.insert(id, result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::add_related_edge;
    use crate::config::Settings;
    use crate::decl::Reference;
    use crate::types::{Location, compact_string};
    use std::path::Path;
    use std::sync::Arc;

    fn run(graph: &mut SourceGraph) {
        let ctx = AnalyzerContext::new(Arc::new(Settings::default()));
        EntryPointRetainer.mutate(graph, &ctx).unwrap();
    }

    #[test]
    fn test_main_attribute_retains_type_and_main() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/src/App.swift"), [compact_string("App")]);

        let app = graph.add_declaration(DeclKind::Struct, Location::new(file, 2, 8), Some("App"));
        graph.decl_mut(app).attributes.insert("main".into());
        let main_fn = graph.add_declaration(
            DeclKind::MethodStatic,
            Location::new(file, 3, 17),
            Some("main()"),
        );
        let other = graph.add_declaration(
            DeclKind::MethodInstance,
            Location::new(file, 7, 10),
            Some("helper()"),
        );
        graph.set_parent(main_fn, app);
        graph.set_parent(other, app);

        run(&mut graph);

        assert!(graph.is_retained(app));
        assert!(graph.is_retained(main_fn));
        assert!(!graph.is_retained(other));
    }

    #[test]
    fn test_main_swift_top_level_retained() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/src/main.swift"), [compact_string("App")]);

        let top = graph.add_declaration(DeclKind::VariableGlobal, Location::new(file, 1, 5), Some("app"));
        let nested =
            graph.add_declaration(DeclKind::VariableLocal, Location::new(file, 3, 9), Some("x"));
        let holder = graph.add_declaration(DeclKind::FreeFunction, Location::new(file, 2, 6), Some("run()"));
        graph.set_parent(nested, holder);

        run(&mut graph);

        assert!(graph.is_retained(top));
        assert!(graph.is_retained(holder));
        assert!(!graph.is_retained(nested));
    }

    #[test]
    fn test_interface_builder_members_retained() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/src/VC.swift"), [compact_string("App")]);

        let action = graph.add_declaration(
            DeclKind::MethodInstance,
            Location::new(file, 9, 10),
            Some("didTap(_:)"),
        );
        graph.decl_mut(action).attributes.insert("IBAction".into());

        run(&mut graph);
        assert!(graph.is_retained(action));
    }

    #[test]
    fn test_xctest_subclass_and_test_methods_retained() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/tests/T.swift"), [compact_string("AppTests")]);

        let tests = graph.add_declaration(DeclKind::Class, Location::new(file, 1, 13), Some("AppTests"));
        let xctest = graph.intern_usr("c:objc(cs)XCTestCase");
        let mut inherit = Reference::new(DeclKind::Class, xctest, Location::new(file, 1, 24));
        inherit.name = Some("XCTestCase".into());
        inherit.is_related = true;
        graph.add_reference(inherit, tests);

        let test_m = graph.add_declaration(
            DeclKind::MethodInstance,
            Location::new(file, 2, 10),
            Some("testLogin()"),
        );
        let helper = graph.add_declaration(
            DeclKind::MethodInstance,
            Location::new(file, 6, 10),
            Some("makeUser()"),
        );
        graph.set_parent(test_m, tests);
        graph.set_parent(helper, tests);

        run(&mut graph);

        assert!(graph.is_retained(tests));
        assert!(graph.is_retained(test_m));
        assert!(!graph.is_retained(helper));
    }

    #[test]
    fn test_indirect_xctest_subclass_detected() {
        let mut graph = SourceGraph::new();
        let file = graph.add_file(Path::new("/tests/T.swift"), [compact_string("AppTests")]);

        let base = graph.add_declaration(DeclKind::Class, Location::new(file, 1, 13), Some("BaseTestCase"));
        let xctest = graph.intern_usr("c:objc(cs)XCTestCase");
        let mut inherit = Reference::new(DeclKind::Class, xctest, Location::new(file, 1, 30));
        inherit.name = Some("XCTestCase".into());
        inherit.is_related = true;
        graph.add_reference(inherit, base);

        let base_usr = graph.intern_usr("s:8AppTests12BaseTestCaseC");
        graph.bind_usr(base, base_usr);
        let derived =
            graph.add_declaration(DeclKind::Class, Location::new(file, 8, 13), Some("LoginTests"));
        add_related_edge(&mut graph, derived, base);

        run(&mut graph);
        assert!(graph.is_retained(derived));
    }
}
