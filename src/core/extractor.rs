use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExtractionConfig;
use super::graph::SymbolKind;
use super::languages::{LanguageExtractor, LexicalExtractor, PythonExtractor, RustExtractor};
use super::source::{module_path, SourceFile};

/// One candidate symbol found in a single file
///
/// Purely lexical: cross-file resolution happens later in the
/// graph assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Bare symbol name as written in the source
    pub name: String,

    pub kind: SymbolKind,

    /// Enclosing class name, if the symbol is a method
    pub parent: Option<String>,

    pub line_start: usize,
    pub line_end: usize,

    /// Raw base-class name tokens (classes only)
    pub base_classes: Vec<String>,

    /// Count of branching constructs in the symbol body (functions only)
    pub branch_tokens: u32,

    /// Bare callee tokens found in the symbol body (functions only)
    pub calls: Vec<String>,
}

impl SymbolRecord {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            line_start: 1,
            line_end: 1,
            base_classes: vec![],
            branch_tokens: 0,
            calls: vec![],
        }
    }
}

/// Everything extracted from one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileExtraction {
    pub file_path: String,
    pub language: String,

    /// Dotted module path derived from the file path
    pub module: String,

    pub line_count: usize,
    pub symbols: Vec<SymbolRecord>,

    /// Raw import tokens in declaration order
    pub imports: Vec<String>,
}

/// Per-file symbol extractor dispatching to language-specific extractors
///
/// Stateless across files: one instance per extraction task is fine.
pub struct SymbolExtractor {
    config: ExtractionConfig,
}

impl SymbolExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Extract symbols and import tokens from one file
    ///
    /// Never fails: a file the tree-sitter extractor cannot handle is
    /// re-scanned with the lexical fallback, and an oversized file
    /// degrades to its bare module record.
    pub fn extract_file(&self, file: &SourceFile) -> FileExtraction {
        let module = module_path(&file.path);
        let line_count = file.content.lines().count().max(1);

        let mut extraction = FileExtraction {
            file_path: file.path.clone(),
            language: file.language.clone(),
            module,
            line_count,
            symbols: vec![],
            imports: vec![],
        };

        if file.content.len() > self.config.max_file_size {
            debug!(
                "Skipping symbol extraction for oversized file {} ({} bytes)",
                file.path,
                file.content.len()
            );
            return extraction;
        }

        let result = match self.build_extractor(&file.language) {
            Ok(mut extractor) => extractor.extract(&file.content),
            Err(e) => Err(e),
        };

        let (symbols, imports) = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(
                    "Extractor failed for {} ({}); using lexical fallback",
                    file.path, e
                );
                LexicalExtractor::new()
                    .and_then(|mut lexical| lexical.extract(&file.content))
                    .unwrap_or_default()
            }
        };

        extraction.symbols = symbols;
        extraction.imports = imports;
        extraction
    }

    fn build_extractor(
        &self,
        language: &str,
    ) -> crate::error::Result<Box<dyn LanguageExtractor>> {
        if !self.config.languages.iter().any(|l| l == language) {
            return Ok(Box::new(LexicalExtractor::new()?));
        }

        match language {
            "python" => Ok(Box::new(PythonExtractor::new()?)),
            "rust" => Ok(Box::new(RustExtractor::new()?)),
            _ => Ok(Box::new(LexicalExtractor::new()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SymbolExtractor {
        SymbolExtractor::new(&crate::config::Config::default().extraction)
    }

    #[test]
    fn test_oversized_file_degrades_to_module_record() {
        let mut config = crate::config::Config::default().extraction;
        config.max_file_size = 8;
        let extractor = SymbolExtractor::new(&config);

        let file = SourceFile::new("big.py", "def f():\n    pass\n", "python");
        let extraction = extractor.extract_file(&file);

        assert_eq!(extraction.module, "big");
        assert!(extraction.symbols.is_empty());
        assert!(extraction.imports.is_empty());
    }

    #[test]
    fn test_unknown_language_uses_lexical_fallback() {
        let file = SourceFile::new(
            "app.js",
            "function greet() {\n  console.log('hi');\n}\n",
            "javascript",
        );
        let extraction = extractor().extract_file(&file);

        assert_eq!(extraction.module, "app");
        assert!(extraction
            .symbols
            .iter()
            .any(|s| s.name == "greet" && s.kind == SymbolKind::Function));
    }
}
