mod assembler;
mod complexity;
mod discovery;
mod engine;
mod extractor;
mod graph;
mod source;
mod stats;

// Language-specific extractors
mod languages;

pub use assembler::GraphAssembler;
pub use complexity::ComplexityEstimator;
pub use discovery::{DiscoveryEngine, DiscoveryOutcome};
pub use extractor::{FileExtraction, SymbolExtractor, SymbolRecord};
pub use graph::{
    CodeContextGraph, Diagnostic, DiagnosticKind, Edge, EdgeKind, ImportClass, ImportReference,
    Node, SymbolKind,
};
pub use languages::{LanguageExtractor, LexicalExtractor, PythonExtractor, RustExtractor};
pub use source::{module_path, SourceFile};
pub use stats::{
    CallHotspot, ComplexityHotspot, EdgeCounts, GraphStatistics, NodeCounts, ReferenceCounts,
    StatsReporter,
};

// Export the main engine
pub use engine::{Analysis, Engine};
