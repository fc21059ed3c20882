//! Codeatlas builds a code context graph (CCG) from the source tree of
//! an arbitrary repository: modules, classes and functions, the
//! relationships among them (contains, inherits, calls, imports), and
//! derived statistics used to drive downstream documentation rendering.
//!
//! The crate is the model-building core only. Repository acquisition
//! hands in `(path, text, language)` tuples; rendering consumes the
//! finished [`CodeContextGraph`] and [`GraphStatistics`]. There is no
//! network, filesystem or CLI surface in here.
//!
//! ```no_run
//! use codeatlas::{Engine, SourceFile};
//!
//! # async fn run() -> codeatlas::Result<()> {
//! let engine = Engine::with_defaults();
//! let analysis = engine
//!     .analyze(vec![SourceFile::new("a.py", "import os\n", "python")])
//!     .await?;
//! println!("{} nodes", analysis.stats.nodes.total);
//! # Ok(())
//! # }
//! ```

mod config;
mod core;
mod error;

pub use config::{Config, DiscoveryConfig, ExtractionConfig, ReportConfig};
pub use self::core::{
    Analysis, CallHotspot, CodeContextGraph, ComplexityEstimator, ComplexityHotspot, Diagnostic,
    DiagnosticKind, DiscoveryEngine, DiscoveryOutcome, Edge, EdgeCounts, EdgeKind, Engine,
    FileExtraction, GraphAssembler, GraphStatistics, ImportClass, ImportReference,
    LanguageExtractor, LexicalExtractor, Node, NodeCounts, PythonExtractor, ReferenceCounts,
    RustExtractor, SourceFile, StatsReporter, SymbolExtractor, SymbolKind, SymbolRecord,
    module_path,
};
pub use error::{CodeAtlasError, Result};
