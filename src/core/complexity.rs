use tracing::debug;

use super::graph::{CodeContextGraph, SymbolKind};

/// Annotates function nodes with an approximate cyclomatic complexity
///
/// Score = 1 (single linear path) + the branching-construct count
/// recorded during extraction. Pure annotation: node identities and
/// edges are never touched.
pub struct ComplexityEstimator;

impl ComplexityEstimator {
    pub fn annotate(graph: &mut CodeContextGraph) {
        let mut annotated = 0;
        for node in graph.nodes.values_mut() {
            if node.kind == SymbolKind::Function {
                node.complexity = Some(1 + node.branch_tokens);
                annotated += 1;
            }
        }
        debug!("Annotated complexity for {} functions", annotated);
    }
}
