use regex::Regex;

use crate::error::{CodeAtlasError, Result};
use super::super::graph::SymbolKind;
use super::{LanguageExtractor, SymbolRecord};

/// Keyword tokens that look like calls but never are
const CALL_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "switch", "case", "match", "catch",
    "except", "return", "def", "fn", "function", "func", "class", "new",
    "import", "require", "print", "super", "this", "self",
];

/// Line-oriented fallback extractor for languages without a dedicated
/// tree-sitter extractor
///
/// Best-effort by design: declarations are matched by shape, symbols
/// stay flat (no class nesting), and anything unmatched is ignored.
pub struct LexicalExtractor {
    class_re: Regex,
    function_re: Regex,
    import_re: Regex,
    from_import_re: Regex,
    use_re: Regex,
    branch_re: Regex,
    call_re: Regex,
}

impl LexicalExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            class_re: Self::compile(
                r"^\s*(?:export\s+|public\s+|abstract\s+|final\s+)*class\s+(\w+)(?:\s*\(([^)]*)\))?(?:\s+extends\s+([\w.]+))?",
            )?,
            function_re: Self::compile(
                r"^\s*(?:export\s+|public\s+|static\s+|async\s+)*(?:def|fn|function|func)\s+(\w+)",
            )?,
            import_re: Self::compile(r"^\s*import\s+([\w.]+)")?,
            from_import_re: Self::compile(r"^\s*from\s+([.\w]+)\s+import")?,
            use_re: Self::compile(r"^\s*use\s+([\w:]+)")?,
            branch_re: Self::compile(
                r"\b(?:if|elif|for|while|case|when|except|catch|and|or)\b|&&|\|\|",
            )?,
            call_re: Self::compile(r"\b([A-Za-z_]\w*)\s*\(")?,
        })
    }

    fn compile(pattern: &str) -> Result<Regex> {
        Regex::new(pattern)
            .map_err(|e| CodeAtlasError::Extractor(format!("Invalid lexical pattern: {}", e)))
    }
}

impl LanguageExtractor for LexicalExtractor {
    fn extract(&mut self, content: &str) -> Result<(Vec<SymbolRecord>, Vec<String>)> {
        let mut symbols: Vec<SymbolRecord> = Vec::new();
        let mut imports: Vec<String> = Vec::new();
        // Index into `symbols` of the function currently being scanned
        let mut open_function: Option<usize> = None;
        let mut last_line = 0;

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            last_line = line_number;

            if let Some(captures) = self.class_re.captures(line) {
                self.close_function(&mut symbols, &mut open_function, line_number);

                let mut base_classes = Vec::new();
                for group in [2, 3] {
                    if let Some(bases) = captures.get(group) {
                        base_classes.extend(
                            bases
                                .as_str()
                                .split(',')
                                .map(str::trim)
                                .filter(|b| !b.is_empty() && *b != "object")
                                .map(str::to_string),
                        );
                    }
                }

                let mut record = SymbolRecord::new(&captures[1], SymbolKind::Class);
                record.line_start = line_number;
                record.line_end = line_number;
                record.base_classes = base_classes;
                symbols.push(record);
            } else if let Some(captures) = self.function_re.captures(line) {
                self.close_function(&mut symbols, &mut open_function, line_number);

                let mut record = SymbolRecord::new(&captures[1], SymbolKind::Function);
                record.line_start = line_number;
                record.line_end = line_number;
                open_function = Some(symbols.len());
                symbols.push(record);
            } else if let Some(captures) = self
                .import_re
                .captures(line)
                .or_else(|| self.from_import_re.captures(line))
            {
                imports.push(captures[1].to_string());
            } else if let Some(captures) = self.use_re.captures(line) {
                imports.push(captures[1].replace("::", "."));
            } else if let Some(position) = open_function {
                let function = &mut symbols[position];
                function.branch_tokens += self.branch_re.find_iter(line).count() as u32;
                for captures in self.call_re.captures_iter(line) {
                    let token = &captures[1];
                    if !CALL_KEYWORDS.contains(&token) {
                        function.calls.push(token.to_string());
                    }
                }
            }
        }

        if let Some(position) = open_function {
            symbols[position].line_end = last_line;
        }

        Ok((symbols, imports))
    }

    fn language_name(&self) -> &str {
        "lexical"
    }
}

impl LexicalExtractor {
    /// Close the currently open function record at the line before
    /// `line_number`
    fn close_function(
        &self,
        symbols: &mut [SymbolRecord],
        open_function: &mut Option<usize>,
        line_number: usize,
    ) {
        if let Some(position) = open_function.take() {
            symbols[position].line_end = line_number.saturating_sub(1).max(1);
        }
    }
}
