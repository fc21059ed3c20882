use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Kind of symbol a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    /// Extraction could not determine what the construct is; kept as a
    /// distinct bucket rather than guessing
    Unknown,
}

/// Relationship type of a graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Contains,
    Inherits,
    Calls,
    Imports,
}

/// Node in the code context graph, keyed by fully-qualified dotted name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Fully-qualified name: module path + optional class + optional function
    pub qualified_name: String,

    pub kind: SymbolKind,

    /// Path of the file the symbol was extracted from
    pub file_path: String,

    pub line_start: usize,
    pub line_end: usize,

    /// Estimated cyclomatic complexity (functions only)
    pub complexity: Option<u32>,

    /// Raw base-class name tokens in declaration order (classes only)
    pub base_classes: Vec<String>,

    /// Count of branching constructs recorded during extraction; input
    /// to the complexity estimator
    pub branch_tokens: u32,
}

/// Directed edge between two symbol identities
///
/// `imports` edges are allowed to dangle: the target may be a raw
/// import token that never resolves to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Classification of an import reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportClass {
    Unresolved,
    Internal,
    Stdlib,
    External,
}

/// A raw import token awaiting classification by the discovery engine
///
/// Created `Unresolved` during extraction; mutated only by the
/// discovery engine; frozen once classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReference {
    /// Raw token as written in the source, e.g. "os.path" or ".utils"
    pub token: String,

    /// Fully-qualified module that declared the import
    pub declaring_module: String,

    /// Language of the declaring file; selects the stdlib name set
    pub language: String,

    pub classification: ImportClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateSymbol,
    NonConvergence,
}

/// Non-fatal condition recorded while building the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// In-memory representation of symbols and their relationships
///
/// Owned exclusively by one pipeline run; discarded after the
/// statistics reporter and the renderer have consumed it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeContextGraph {
    /// All nodes, keyed by fully-qualified name
    pub nodes: HashMap<String, Node>,

    /// All edges, deduplicated on (source, target, kind)
    pub edges: Vec<Edge>,

    /// Import references collected during extraction
    pub import_refs: Vec<ImportReference>,

    /// Non-fatal diagnostics accumulated across all stages
    pub diagnostics: Vec<Diagnostic>,

    /// Whether dependency discovery converged naturally
    pub discovery_complete: bool,

    #[serde(skip)]
    edge_index: HashSet<(String, String, EdgeKind)>,
}

impl CodeContextGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; on identity collision the first definition wins
    /// and `false` is returned
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.qualified_name) {
            return false;
        }
        self.nodes.insert(node.qualified_name.clone(), node);
        true
    }

    /// Insert an edge; re-inserting the same (source, target, kind)
    /// triple is a no-op
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        // A deserialized graph arrives without its index
        if self.edge_index.len() != self.edges.len() {
            self.rebuild_edge_index();
        }
        let key = (source.to_string(), target.to_string(), kind);
        if !self.edge_index.insert(key) {
            return false;
        }
        self.edges.push(Edge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
        });
        true
    }

    fn rebuild_edge_index(&mut self) {
        self.edge_index = self
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone(), e.kind))
            .collect();
    }

    pub fn get_node(&self, qualified_name: &str) -> Option<&Node> {
        self.nodes.get(qualified_name)
    }

    pub fn contains_node(&self, qualified_name: &str) -> bool {
        self.nodes.contains_key(qualified_name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn push_diagnostic(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            kind,
            message: message.into(),
        });
    }

    /// All symbols with a `calls` edge into `target`, sorted by name
    pub fn callers_of(&self, target: &str) -> Vec<&str> {
        self.edge_sources(target, EdgeKind::Calls)
    }

    /// All classes with an `inherits` edge into `base`, sorted by name
    pub fn subclasses_of(&self, base: &str) -> Vec<&str> {
        self.edge_sources(base, EdgeKind::Inherits)
    }

    fn edge_sources(&self, target: &str, kind: EdgeKind) -> Vec<&str> {
        let mut sources: Vec<&str> = self
            .edges
            .iter()
            .filter(|e| e.kind == kind && e.target == target)
            .map(|e| e.source.as_str())
            .collect();
        sources.sort_unstable();
        sources
    }

    /// In-degree of `calls` edges per function identity
    pub fn call_in_degrees(&self) -> HashMap<&str, usize> {
        let mut degrees: HashMap<&str, usize> = HashMap::new();
        for edge in &self.edges {
            if edge.kind == EdgeKind::Calls {
                *degrees.entry(edge.target.as_str()).or_insert(0) += 1;
            }
        }
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_node(name: &str) -> Node {
        Node {
            qualified_name: name.to_string(),
            kind: SymbolKind::Function,
            file_path: "a.py".to_string(),
            line_start: 1,
            line_end: 5,
            complexity: None,
            base_classes: vec![],
            branch_tokens: 0,
        }
    }

    #[test]
    fn test_first_definition_wins() {
        let mut graph = CodeContextGraph::new();
        let mut first = function_node("a.foo");
        first.line_start = 3;

        assert!(graph.add_node(first));
        assert!(!graph.add_node(function_node("a.foo")));

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get_node("a.foo").unwrap().line_start, 3);
    }

    #[test]
    fn test_edge_insertion_is_idempotent() {
        let mut graph = CodeContextGraph::new();
        assert!(graph.add_edge("a.foo", "a.bar", EdgeKind::Calls));
        assert!(!graph.add_edge("a.foo", "a.bar", EdgeKind::Calls));
        // Same endpoints, different kind is a distinct edge
        assert!(graph.add_edge("a.foo", "a.bar", EdgeKind::Imports));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_deserialized_graph_keeps_edge_dedup() {
        let mut graph = CodeContextGraph::new();
        graph.add_edge("a.foo", "a.bar", EdgeKind::Calls);
        graph.add_edge("a.foo", "a.bar", EdgeKind::Imports);

        let json = serde_json::to_string(&graph).unwrap();
        let mut restored: CodeContextGraph = serde_json::from_str(&json).unwrap();

        assert!(!restored.add_edge("a.foo", "a.bar", EdgeKind::Calls));
        assert!(restored.add_edge("a.foo", "a.baz", EdgeKind::Calls));
        assert_eq!(restored.edge_count(), 3);
    }

    #[test]
    fn test_callers_are_sorted() {
        let mut graph = CodeContextGraph::new();
        graph.add_edge("b.second", "a.target", EdgeKind::Calls);
        graph.add_edge("a.first", "a.target", EdgeKind::Calls);
        graph.add_edge("a.other", "a.target", EdgeKind::Inherits);

        assert_eq!(graph.callers_of("a.target"), vec!["a.first", "b.second"]);
        assert_eq!(graph.subclasses_of("a.target"), vec!["a.other"]);
    }
}
