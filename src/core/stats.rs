use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use super::graph::{CodeContextGraph, EdgeKind, ImportClass, SymbolKind};

/// Node counts by symbol kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub total: usize,
    pub modules: usize,
    pub classes: usize,
    pub functions: usize,
    pub unknown: usize,
}

/// Edge counts by relationship kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounts {
    pub total: usize,
    pub contains: usize,
    pub inherits: usize,
    pub calls: usize,
    pub imports: usize,
}

/// Import reference counts by classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCounts {
    pub total: usize,
    pub internal: usize,
    pub stdlib: usize,
    pub external: usize,
    pub unresolved: usize,
}

/// A function at or above the complexity threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityHotspot {
    pub qualified_name: String,
    pub complexity: u32,
}

/// A function ranked by incoming `calls` edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallHotspot {
    pub qualified_name: String,
    pub call_count: usize,
}

/// Aggregate statistics over a finished graph, consumed by the
/// rendering collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub nodes: NodeCounts,
    pub edges: EdgeCounts,
    pub references: ReferenceCounts,
    pub discovery_complete: bool,
    pub complexity_hotspots: Vec<ComplexityHotspot>,
    pub most_called: Vec<CallHotspot>,
}

/// Read-only aggregation over the finished graph
pub struct StatsReporter {
    complexity_threshold: u32,
    hotspot_limit: usize,
}

impl StatsReporter {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            complexity_threshold: config.complexity_threshold,
            hotspot_limit: config.hotspot_limit,
        }
    }

    pub fn report(&self, graph: &CodeContextGraph) -> GraphStatistics {
        GraphStatistics {
            nodes: Self::count_nodes(graph),
            edges: Self::count_edges(graph),
            references: Self::count_references(graph),
            discovery_complete: graph.discovery_complete,
            complexity_hotspots: self.complexity_hotspots(graph),
            most_called: self.most_called(graph),
        }
    }

    fn count_nodes(graph: &CodeContextGraph) -> NodeCounts {
        let mut counts = NodeCounts {
            total: graph.node_count(),
            ..Default::default()
        };
        for node in graph.nodes.values() {
            match node.kind {
                SymbolKind::Module => counts.modules += 1,
                SymbolKind::Class => counts.classes += 1,
                SymbolKind::Function => counts.functions += 1,
                SymbolKind::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    fn count_edges(graph: &CodeContextGraph) -> EdgeCounts {
        let mut counts = EdgeCounts {
            total: graph.edge_count(),
            ..Default::default()
        };
        for edge in &graph.edges {
            match edge.kind {
                EdgeKind::Contains => counts.contains += 1,
                EdgeKind::Inherits => counts.inherits += 1,
                EdgeKind::Calls => counts.calls += 1,
                EdgeKind::Imports => counts.imports += 1,
            }
        }
        counts
    }

    fn count_references(graph: &CodeContextGraph) -> ReferenceCounts {
        let mut counts = ReferenceCounts {
            total: graph.import_refs.len(),
            ..Default::default()
        };
        for reference in &graph.import_refs {
            match reference.classification {
                ImportClass::Internal => counts.internal += 1,
                ImportClass::Stdlib => counts.stdlib += 1,
                ImportClass::External => counts.external += 1,
                ImportClass::Unresolved => counts.unresolved += 1,
            }
        }
        counts
    }

    /// Functions at or above the threshold, most complex first, names
    /// ascending on ties
    fn complexity_hotspots(&self, graph: &CodeContextGraph) -> Vec<ComplexityHotspot> {
        let mut hotspots: Vec<ComplexityHotspot> = graph
            .nodes
            .values()
            .filter(|node| node.kind == SymbolKind::Function)
            .filter_map(|node| {
                let complexity = node.complexity?;
                (complexity >= self.complexity_threshold).then(|| ComplexityHotspot {
                    qualified_name: node.qualified_name.clone(),
                    complexity,
                })
            })
            .collect();

        hotspots.sort_by(|a, b| {
            b.complexity
                .cmp(&a.complexity)
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });
        hotspots
    }

    /// Most-called functions by `calls` in-degree, names ascending on
    /// ties for determinism
    fn most_called(&self, graph: &CodeContextGraph) -> Vec<CallHotspot> {
        let mut hotspots: Vec<CallHotspot> = graph
            .call_in_degrees()
            .into_iter()
            .map(|(qualified_name, call_count)| CallHotspot {
                qualified_name: qualified_name.to_string(),
                call_count,
            })
            .collect();

        hotspots.sort_by(|a, b| {
            b.call_count
                .cmp(&a.call_count)
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });
        hotspots.truncate(self.hotspot_limit);
        hotspots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::graph::Node;

    fn reporter() -> StatsReporter {
        StatsReporter::new(&crate::config::Config::default().report)
    }

    fn node(name: &str, kind: SymbolKind, complexity: Option<u32>) -> Node {
        Node {
            qualified_name: name.to_string(),
            kind,
            file_path: "a.py".to_string(),
            line_start: 1,
            line_end: 2,
            complexity,
            base_classes: vec![],
            branch_tokens: 0,
        }
    }

    #[test]
    fn test_empty_graph_reports_all_zeros() {
        let stats = reporter().report(&CodeContextGraph::new());

        assert_eq!(stats.nodes, NodeCounts::default());
        assert_eq!(stats.edges, EdgeCounts::default());
        assert_eq!(stats.references, ReferenceCounts::default());
        assert!(stats.complexity_hotspots.is_empty());
        assert!(stats.most_called.is_empty());
    }

    #[test]
    fn test_counts_by_kind_including_unknown() {
        let mut graph = CodeContextGraph::new();
        graph.add_node(node("a", SymbolKind::Module, None));
        graph.add_node(node("a.K", SymbolKind::Class, None));
        graph.add_node(node("a.K.m", SymbolKind::Function, Some(1)));
        graph.add_node(node("a.Mystery", SymbolKind::Unknown, None));
        graph.add_edge("a", "a.K", EdgeKind::Contains);
        graph.add_edge("a", "os", EdgeKind::Imports);

        let stats = reporter().report(&graph);

        assert_eq!(stats.nodes.total, 4);
        assert_eq!(stats.nodes.modules, 1);
        assert_eq!(stats.nodes.classes, 1);
        assert_eq!(stats.nodes.functions, 1);
        assert_eq!(stats.nodes.unknown, 1);
        assert_eq!(stats.edges.contains, 1);
        assert_eq!(stats.edges.imports, 1);
    }

    #[test]
    fn test_most_called_ties_break_by_name() {
        let mut graph = CodeContextGraph::new();
        for name in ["a.alpha", "a.beta", "a.caller1", "a.caller2"] {
            graph.add_node(node(name, SymbolKind::Function, Some(1)));
        }
        graph.add_edge("a.caller1", "a.beta", EdgeKind::Calls);
        graph.add_edge("a.caller2", "a.beta", EdgeKind::Calls);
        graph.add_edge("a.caller1", "a.alpha", EdgeKind::Calls);
        graph.add_edge("a.caller2", "a.alpha", EdgeKind::Calls);

        let stats = reporter().report(&graph);

        assert_eq!(stats.most_called.len(), 2);
        assert_eq!(stats.most_called[0].qualified_name, "a.alpha");
        assert_eq!(stats.most_called[1].qualified_name, "a.beta");
    }

    #[test]
    fn test_complexity_hotspots_sorted_desc() {
        let mut config = crate::config::Config::default().report;
        config.complexity_threshold = 5;
        let reporter = StatsReporter::new(&config);

        let mut graph = CodeContextGraph::new();
        graph.add_node(node("a.mild", SymbolKind::Function, Some(4)));
        graph.add_node(node("a.warm", SymbolKind::Function, Some(5)));
        graph.add_node(node("a.hot", SymbolKind::Function, Some(9)));

        let hotspots = reporter.report(&graph).complexity_hotspots;

        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].qualified_name, "a.hot");
        assert_eq!(hotspots[1].qualified_name, "a.warm");
    }
}
