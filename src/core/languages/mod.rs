//! Language-specific symbol extractors
//!
//! Each language gets its own module with a consistent interface for
//! turning source text into symbol records and import tokens.

mod lexical;
mod python;
mod rust;

pub use lexical::LexicalExtractor;
pub use python::PythonExtractor;
pub use rust::RustExtractor;

use crate::error::Result;
use super::SymbolRecord;

/// Trait that all language extractors must implement
pub trait LanguageExtractor {
    /// Extract symbol records and raw import tokens from source text
    ///
    /// An error here means the whole file could not be handled; the
    /// caller falls back to the lexical extractor. Individual
    /// malformed constructs must be skipped, not reported.
    fn extract(&mut self, content: &str) -> Result<(Vec<SymbolRecord>, Vec<String>)>;

    /// Get the language name
    fn language_name(&self) -> &str;
}
