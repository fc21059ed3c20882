use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{CodeAtlasError, Result};
use super::assembler::GraphAssembler;
use super::complexity::ComplexityEstimator;
use super::discovery::{DiscoveryEngine, DiscoveryOutcome};
use super::extractor::{FileExtraction, SymbolExtractor};
use super::graph::CodeContextGraph;
use super::source::SourceFile;
use super::stats::{GraphStatistics, StatsReporter};

/// Output of one pipeline run: the finished graph plus its statistics,
/// handed to the rendering collaborator as plain data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub graph: CodeContextGraph,
    pub stats: GraphStatistics,
    pub discovery: DiscoveryOutcome,
}

/// Main orchestration engine for the analysis pipeline
///
/// Each `analyze` call owns its graph exclusively; nothing is shared
/// across runs.
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Run the full pipeline over the given source files
    pub async fn analyze(&self, files: Vec<SourceFile>) -> Result<Analysis> {
        info!("Analyzing {} source files", files.len());

        let extractions = self.extract_all(files).await?;

        let mut graph = GraphAssembler::assemble(&extractions);
        ComplexityEstimator::annotate(&mut graph);

        let discovery = DiscoveryEngine::new(&self.config.discovery).run(&mut graph);
        let stats = StatsReporter::new(&self.config.report).report(&graph);

        info!(
            "Analysis complete: {} nodes, {} edges, discovery_complete={}",
            graph.node_count(),
            graph.edge_count(),
            graph.discovery_complete
        );

        Ok(Analysis {
            graph,
            stats,
            discovery,
        })
    }

    /// Fan per-file extraction out over blocking worker tasks; results
    /// are collected back in submission order
    async fn extract_all(&self, files: Vec<SourceFile>) -> Result<Vec<FileExtraction>> {
        let mut handles = Vec::with_capacity(files.len());
        for file in files {
            let config = self.config.extraction.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                SymbolExtractor::new(&config).extract_file(&file)
            }));
        }

        let mut extractions = Vec::with_capacity(handles.len());
        for handle in handles {
            let extraction = handle
                .await
                .map_err(|e| CodeAtlasError::Pipeline(format!("extraction task failed: {}", e)))?;
            extractions.push(extraction);
        }
        Ok(extractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_yields_empty_graph() {
        let analysis = Engine::with_defaults().analyze(vec![]).await.unwrap();

        assert_eq!(analysis.graph.node_count(), 0);
        assert_eq!(analysis.graph.edge_count(), 0);
        assert_eq!(analysis.stats.nodes.total, 0);
        assert_eq!(analysis.stats.edges.total, 0);
        assert!(analysis.stats.discovery_complete);
    }

    #[tokio::test]
    async fn test_runs_share_no_state() {
        let engine = Engine::with_defaults();
        let file = SourceFile::new("a.py", "import os\n", "python");

        let first = engine.analyze(vec![file.clone()]).await.unwrap();
        let second = engine.analyze(vec![file]).await.unwrap();

        assert_eq!(first.graph.node_count(), second.graph.node_count());
        assert_eq!(
            first.graph.import_refs.len(),
            second.graph.import_refs.len()
        );
        assert!(first.graph.diagnostics.is_empty());
        assert!(second.graph.diagnostics.is_empty());
    }
}
