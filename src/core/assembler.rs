use std::collections::HashMap;

use tracing::debug;

use super::extractor::{FileExtraction, SymbolRecord};
use super::graph::{
    CodeContextGraph, DiagnosticKind, EdgeKind, ImportClass, ImportReference, Node, SymbolKind,
};

/// Merges per-file extraction results into a single code context graph
///
/// Assembly is two-phase: all nodes are inserted first, all reference
/// edges are resolved second, so forward references across files
/// resolve regardless of file order.
pub struct GraphAssembler;

impl GraphAssembler {
    pub fn assemble(extractions: &[FileExtraction]) -> CodeContextGraph {
        let mut graph = CodeContextGraph::new();

        for extraction in extractions {
            Self::insert_nodes(&mut graph, extraction);
        }

        for extraction in extractions {
            Self::insert_parent_placeholders(&mut graph, extraction);
        }

        let function_index = Self::function_name_index(&graph);
        for extraction in extractions {
            Self::resolve_references(&mut graph, extraction, &function_index);
        }

        debug!(
            "Assembled graph: {} nodes, {} edges, {} import references",
            graph.node_count(),
            graph.edge_count(),
            graph.import_refs.len()
        );
        graph
    }

    /// Phase 1: insert the module node and every extracted symbol,
    /// keyed by fully-qualified name; first definition wins
    fn insert_nodes(graph: &mut CodeContextGraph, extraction: &FileExtraction) {
        let module_node = Node {
            qualified_name: extraction.module.clone(),
            kind: SymbolKind::Module,
            file_path: extraction.file_path.clone(),
            line_start: 1,
            line_end: extraction.line_count,
            complexity: None,
            base_classes: vec![],
            branch_tokens: 0,
        };
        Self::insert_or_diagnose(graph, module_node, &extraction.file_path);

        for record in &extraction.symbols {
            let node = Node {
                qualified_name: Self::qualified_name(&extraction.module, record),
                kind: record.kind,
                file_path: extraction.file_path.clone(),
                line_start: record.line_start,
                line_end: record.line_end,
                complexity: None,
                base_classes: record.base_classes.clone(),
                branch_tokens: record.branch_tokens,
            };
            Self::insert_or_diagnose(graph, node, &extraction.file_path);
        }
    }

    fn insert_or_diagnose(graph: &mut CodeContextGraph, node: Node, file_path: &str) {
        let qualified_name = node.qualified_name.clone();
        if !graph.add_node(node) {
            graph.push_diagnostic(
                DiagnosticKind::DuplicateSymbol,
                format!(
                    "duplicate symbol '{}' in {}; keeping first definition",
                    qualified_name, file_path
                ),
            );
        }
    }

    /// A method whose enclosing type was never extracted (e.g. an impl
    /// for a type defined elsewhere) still needs a parent node for its
    /// `contains` edge; insert one with unknown kind
    fn insert_parent_placeholders(graph: &mut CodeContextGraph, extraction: &FileExtraction) {
        for record in &extraction.symbols {
            if let Some(parent) = &record.parent {
                let parent_fqn = format!("{}.{}", extraction.module, parent);
                if !graph.contains_node(&parent_fqn) {
                    graph.add_node(Node {
                        qualified_name: parent_fqn,
                        kind: SymbolKind::Unknown,
                        file_path: extraction.file_path.clone(),
                        line_start: record.line_start,
                        line_end: record.line_end,
                        complexity: None,
                        base_classes: vec![],
                        branch_tokens: 0,
                    });
                }
            }
        }
    }

    /// Phase 2: emit `contains`, `inherits`, `calls` and `imports`
    /// edges against the complete node set
    fn resolve_references(
        graph: &mut CodeContextGraph,
        extraction: &FileExtraction,
        function_index: &HashMap<String, Vec<String>>,
    ) {
        let module = &extraction.module;

        for record in &extraction.symbols {
            let fqn = Self::qualified_name(module, record);
            let parent_fqn = match &record.parent {
                Some(parent) => format!("{}.{}", module, parent),
                None => module.clone(),
            };
            graph.add_edge(&parent_fqn, &fqn, EdgeKind::Contains);
            if record.parent.is_some() {
                graph.add_edge(module, &parent_fqn, EdgeKind::Contains);
            }

            if record.kind == SymbolKind::Class {
                Self::resolve_base_classes(graph, extraction, record, &fqn);
            }

            if record.kind == SymbolKind::Function {
                Self::resolve_calls(graph, extraction, record, &fqn, function_index);
            }
        }

        for token in &extraction.imports {
            if Self::push_import_ref(graph, token, module, &extraction.language) {
                graph.add_edge(module, token, EdgeKind::Imports);
            }
        }
    }

    /// Record one unresolved reference per (declaring module, token)
    /// pair; returns false if it was already recorded
    fn push_import_ref(
        graph: &mut CodeContextGraph,
        token: &str,
        module: &str,
        language: &str,
    ) -> bool {
        let already_recorded = graph
            .import_refs
            .iter()
            .any(|r| r.declaring_module == module && r.token == token);
        if already_recorded {
            return false;
        }
        graph.import_refs.push(ImportReference {
            token: token.to_string(),
            declaring_module: module.to_string(),
            language: language.to_string(),
            classification: ImportClass::Unresolved,
        });
        true
    }

    /// Resolve base-class tokens to node identities; unresolved tokens
    /// become unresolved import candidates for the discovery engine
    fn resolve_base_classes(
        graph: &mut CodeContextGraph,
        extraction: &FileExtraction,
        record: &SymbolRecord,
        class_fqn: &str,
    ) {
        for token in &record.base_classes {
            let resolved = Self::resolve_identity(graph, token, &extraction.module)
                .filter(|target| target != class_fqn);
            match resolved {
                Some(target) => {
                    graph.add_edge(class_fqn, &target, EdgeKind::Inherits);
                }
                None => {
                    Self::push_import_ref(graph, token, &extraction.module, &extraction.language);
                }
            }
        }
    }

    /// Resolve a raw name token against recorded identities: the
    /// declaring module first, then an exact identity, then the
    /// lexicographically smallest suffix match
    fn resolve_identity(
        graph: &CodeContextGraph,
        token: &str,
        module: &str,
    ) -> Option<String> {
        let local = format!("{}.{}", module, token);
        if graph.contains_node(&local) {
            return Some(local);
        }
        if graph.contains_node(token) {
            return Some(token.to_string());
        }

        let suffix = format!(".{}", token.trim_start_matches('.'));
        let mut candidates: Vec<&String> = graph
            .nodes
            .keys()
            .filter(|identity| identity.ends_with(&suffix))
            .collect();
        candidates.sort_unstable();
        candidates.first().map(|identity| identity.to_string())
    }

    /// Best-effort call resolution by bare name; unmatched tokens are
    /// dropped so `calls` edges never dangle
    fn resolve_calls(
        graph: &mut CodeContextGraph,
        extraction: &FileExtraction,
        record: &SymbolRecord,
        caller_fqn: &str,
        function_index: &HashMap<String, Vec<String>>,
    ) {
        for token in &record.calls {
            let Some(candidates) = function_index.get(token) else {
                continue;
            };

            let same_file = candidates.iter().find(|fqn| {
                graph
                    .get_node(fqn)
                    .map(|node| node.file_path == extraction.file_path)
                    .unwrap_or(false)
            });
            let target = same_file.or_else(|| candidates.first());

            if let Some(target) = target {
                if target != caller_fqn {
                    let target = target.clone();
                    graph.add_edge(caller_fqn, &target, EdgeKind::Calls);
                }
            }
        }
    }

    /// Bare function name -> identities carrying it, ascending for
    /// deterministic tie-breaking
    fn function_name_index(graph: &CodeContextGraph) -> HashMap<String, Vec<String>> {
        let mut index: HashMap<String, Vec<String>> = HashMap::new();
        for node in graph.nodes.values() {
            if node.kind == SymbolKind::Function {
                if let Some(bare_name) = node.qualified_name.rsplit('.').next() {
                    index
                        .entry(bare_name.to_string())
                        .or_default()
                        .push(node.qualified_name.clone());
                }
            }
        }
        for candidates in index.values_mut() {
            candidates.sort_unstable();
        }
        index
    }

    fn qualified_name(module: &str, record: &SymbolRecord) -> String {
        match &record.parent {
            Some(parent) => format!("{}.{}.{}", module, parent, record.name),
            None => format!("{}.{}", module, record.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::graph::SymbolKind;

    fn class(name: &str, bases: &[&str]) -> SymbolRecord {
        let mut record = SymbolRecord::new(name, SymbolKind::Class);
        record.base_classes = bases.iter().map(|b| b.to_string()).collect();
        record
    }

    fn function(name: &str, calls: &[&str]) -> SymbolRecord {
        let mut record = SymbolRecord::new(name, SymbolKind::Function);
        record.calls = calls.iter().map(|c| c.to_string()).collect();
        record
    }

    fn extraction(path: &str, symbols: Vec<SymbolRecord>, imports: &[&str]) -> FileExtraction {
        FileExtraction {
            file_path: path.to_string(),
            language: "python".to_string(),
            module: super::super::source::module_path(path),
            line_count: 10,
            symbols,
            imports: imports.iter().map(|i| i.to_string()).collect(),
        }
    }

    #[test]
    fn test_cross_file_inheritance_resolves() {
        let extractions = vec![
            extraction("a.py", vec![class("Base", &[])], &[]),
            extraction("b.py", vec![class("Child", &["Base"])], &[]),
        ];

        let graph = GraphAssembler::assemble(&extractions);

        assert!(graph
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Inherits
                && e.source == "b.Child"
                && e.target == "a.Base"));
        assert_eq!(graph.subclasses_of("a.Base"), vec!["b.Child"]);
    }

    #[test]
    fn test_unresolved_base_becomes_import_candidate() {
        let extractions = vec![extraction("b.py", vec![class("Child", &["Mystery"])], &[])];
        let graph = GraphAssembler::assemble(&extractions);

        assert!(!graph.edges.iter().any(|e| e.kind == EdgeKind::Inherits));
        assert!(graph
            .import_refs
            .iter()
            .any(|r| r.token == "Mystery" && r.classification == ImportClass::Unresolved));
    }

    #[test]
    fn test_calls_prefer_same_file_and_never_dangle() {
        let extractions = vec![
            extraction(
                "a.py",
                vec![function("helper", &[]), function("run", &["helper", "ghost"])],
                &[],
            ),
            extraction("z.py", vec![function("helper", &[])], &[]),
        ];

        let graph = GraphAssembler::assemble(&extractions);

        let calls: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Calls)
            .collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source, "a.run");
        assert_eq!(calls[0].target, "a.helper");
    }

    #[test]
    fn test_duplicate_symbol_keeps_first_and_diagnoses() {
        let mut first = function("work", &[]);
        first.line_start = 5;
        first.line_end = 9;
        let second = function("work", &[]);

        let extractions = vec![
            extraction("a.py", vec![first], &[]),
            extraction("a.py", vec![second], &[]),
        ];

        let graph = GraphAssembler::assemble(&extractions);

        assert_eq!(graph.get_node("a.work").unwrap().line_start, 5);
        assert!(graph
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateSymbol));
    }

    #[test]
    fn test_method_of_unseen_type_gets_placeholder_parent() {
        let mut method = function("poke", &[]);
        method.parent = Some("Remote".to_string());

        let graph = GraphAssembler::assemble(&[extraction("a.py", vec![method], &[])]);

        let placeholder = graph.get_node("a.Remote").unwrap();
        assert_eq!(placeholder.kind, SymbolKind::Unknown);
        assert!(graph
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Contains
                && e.source == "a.Remote"
                && e.target == "a.Remote.poke"));
    }

    #[test]
    fn test_imports_recorded_once_per_module() {
        let graph =
            GraphAssembler::assemble(&[extraction("a.py", vec![], &["os", "os", "requests"])]);

        assert_eq!(graph.import_refs.len(), 2);
        let import_edges = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Imports)
            .count();
        assert_eq!(import_edges, 2);
    }
}
