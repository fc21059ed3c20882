use tree_sitter::{Node, Parser};

use crate::error::{CodeAtlasError, Result};
use super::super::graph::SymbolKind;
use super::{LanguageExtractor, SymbolRecord};

/// Node kinds counted as branching constructs for complexity estimation
const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "boolean_operator",
    "except_clause",
    "conditional_expression",
];

/// Python-specific symbol extractor using Tree-sitter
pub struct PythonExtractor {
    parser: Parser,
}

impl PythonExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser.set_language(&python_language).map_err(|e| {
            CodeAtlasError::Extractor(format!("Failed to set Python language: {}", e))
        })?;

        Ok(Self { parser })
    }
}

impl LanguageExtractor for PythonExtractor {
    fn extract(&mut self, content: &str) -> Result<(Vec<SymbolRecord>, Vec<String>)> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| CodeAtlasError::Extractor("Failed to parse Python code".to_string()))?;

        let mut symbols = Vec::new();
        let mut imports = Vec::new();
        self.walk_items(tree.root_node(), content, &mut symbols, &mut imports);

        Ok((symbols, imports))
    }

    fn language_name(&self) -> &str {
        "python"
    }
}

impl PythonExtractor {
    /// Walk top-level items; function bodies are not descended into, so
    /// nested defs contribute to their enclosing function instead of
    /// becoming symbols of their own
    fn walk_items(
        &self,
        node: Node,
        source: &str,
        symbols: &mut Vec<SymbolRecord>,
        imports: &mut Vec<String>,
    ) {
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_definition" => {
                    if let Some(class_record) = self.parse_class(child, source) {
                        let class_name = class_record.name.clone();
                        symbols.push(class_record);
                        self.collect_methods(child, source, &class_name, symbols, imports);
                    }
                }
                "function_definition" => {
                    if let Some(function) = self.parse_function(child, source, None, imports) {
                        symbols.push(function);
                    }
                }
                "import_statement" | "future_import_statement" => {
                    self.collect_import_tokens(child, source, imports);
                }
                "import_from_statement" => {
                    if let Some(module_node) = child.child_by_field_name("module_name") {
                        imports.push(self.node_text(module_node, source));
                    }
                }
                _ => {
                    // Covers decorated definitions, conditional blocks
                    // around defs, and similar wrappers
                    self.walk_items(child, source, symbols, imports);
                }
            }
        }
    }

    /// Parse a class definition; a node without a name is skipped
    fn parse_class(&self, node: Node, source: &str) -> Option<SymbolRecord> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node, source);

        let mut base_classes = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for arg in superclasses.children(&mut cursor) {
                if matches!(arg.kind(), "identifier" | "attribute") {
                    let base = self.node_text(arg, source);
                    if base != "object" {
                        base_classes.push(base);
                    }
                }
            }
        }

        Some(SymbolRecord {
            name,
            kind: SymbolKind::Class,
            parent: None,
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
            base_classes,
            branch_tokens: 0,
            calls: vec![],
        })
    }

    /// Record every method defined directly in a class body
    fn collect_methods(
        &self,
        class_node: Node,
        source: &str,
        class_name: &str,
        symbols: &mut Vec<SymbolRecord>,
        imports: &mut Vec<String>,
    ) {
        let Some(body) = class_node.child_by_field_name("body") else {
            return;
        };

        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "function_definition" => {
                    if let Some(method) =
                        self.parse_function(child, source, Some(class_name), imports)
                    {
                        symbols.push(method);
                    }
                }
                "decorated_definition" => {
                    let mut inner = child.walk();
                    for wrapped in child.children(&mut inner) {
                        if wrapped.kind() == "function_definition" {
                            if let Some(method) =
                                self.parse_function(wrapped, source, Some(class_name), imports)
                            {
                                symbols.push(method);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Parse a function definition; a node without a name is skipped
    ///
    /// Function-local import statements count toward the module's
    /// imports like top-level ones
    fn parse_function(
        &self,
        node: Node,
        source: &str,
        parent_class: Option<&str>,
        imports: &mut Vec<String>,
    ) -> Option<SymbolRecord> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node, source);

        let body = node.child_by_field_name("body").unwrap_or(node);
        let branch_tokens = self.count_branches(body);
        let mut calls = Vec::new();
        self.collect_calls(body, source, &mut calls);
        self.collect_nested_imports(body, source, imports);

        Some(SymbolRecord {
            name,
            kind: SymbolKind::Function,
            parent: parent_class.map(|s| s.to_string()),
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
            base_classes: vec![],
            branch_tokens,
            calls,
        })
    }

    /// Count branching constructs under a node
    fn count_branches(&self, node: Node) -> u32 {
        let mut count = 0;
        if BRANCH_KINDS.contains(&node.kind()) {
            count += 1;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            count += self.count_branches(child);
        }
        count
    }

    /// Collect bare callee tokens from call expressions
    fn collect_calls(&self, node: Node, source: &str, calls: &mut Vec<String>) {
        if node.kind() == "call" {
            if let Some(function) = node.child_by_field_name("function") {
                match function.kind() {
                    "identifier" => calls.push(self.node_text(function, source)),
                    "attribute" => {
                        // obj.method(...) keeps only the attribute name
                        if let Some(attribute) = function.child_by_field_name("attribute") {
                            calls.push(self.node_text(attribute, source));
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_calls(child, source, calls);
        }
    }

    /// Collect import statements anywhere under a function body
    fn collect_nested_imports(&self, node: Node, source: &str, imports: &mut Vec<String>) {
        match node.kind() {
            "import_statement" | "future_import_statement" => {
                self.collect_import_tokens(node, source, imports);
                return;
            }
            "import_from_statement" => {
                if let Some(module_node) = node.child_by_field_name("module_name") {
                    imports.push(self.node_text(module_node, source));
                }
                return;
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_nested_imports(child, source, imports);
        }
    }

    /// Collect dotted module tokens from a plain import statement
    fn collect_import_tokens(&self, node: Node, source: &str, imports: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "dotted_name" => imports.push(self.node_text(child, source)),
                "aliased_import" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        imports.push(self.node_text(name, source));
                    }
                }
                _ => {}
            }
        }
    }

    /// Extract text content of a node
    fn node_text(&self, node: Node, source: &str) -> String {
        source[node.byte_range()].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> (Vec<SymbolRecord>, Vec<String>) {
        PythonExtractor::new().unwrap().extract(source).unwrap()
    }

    #[test]
    fn test_classes_functions_and_methods() {
        let source = r#"
class Base:
    def ping(self):
        return 1

class Child(Base):
    pass

def main():
    c = Child()
    c.ping()
"#;
        let (symbols, _) = extract(source);

        let base = symbols.iter().find(|s| s.name == "Base").unwrap();
        assert_eq!(base.kind, SymbolKind::Class);
        assert!(base.base_classes.is_empty());

        let child = symbols.iter().find(|s| s.name == "Child").unwrap();
        assert_eq!(child.base_classes, vec!["Base".to_string()]);

        let ping = symbols.iter().find(|s| s.name == "ping").unwrap();
        assert_eq!(ping.parent.as_deref(), Some("Base"));

        let main = symbols.iter().find(|s| s.name == "main").unwrap();
        assert!(main.calls.contains(&"Child".to_string()));
        assert!(main.calls.contains(&"ping".to_string()));
    }

    #[test]
    fn test_branch_token_counting() {
        let source = r#"
def busy(x):
    if x and x > 1:
        for i in range(x):
            while i > 0:
                i -= 1
    try:
        pass
    except ValueError:
        pass
    return x
"#;
        let (symbols, _) = extract(source);
        let busy = symbols.iter().find(|s| s.name == "busy").unwrap();
        // if + and + for + while + except
        assert_eq!(busy.branch_tokens, 5);
    }

    #[test]
    fn test_import_tokens() {
        let source = r#"
import os
import os.path
import numpy as np
from pathlib import Path
from .sibling import helper
"#;
        let (_, imports) = extract(source);
        assert_eq!(
            imports,
            vec!["os", "os.path", "numpy", "pathlib", ".sibling"]
        );
    }

    #[test]
    fn test_function_local_imports_are_collected() {
        let source = r#"
def lazy():
    import json
    from collections import OrderedDict
    return json.dumps({})

class Holder:
    def load(self):
        import pickle
        return pickle
"#;
        let (_, imports) = extract(source);
        assert!(imports.contains(&"json".to_string()));
        assert!(imports.contains(&"collections".to_string()));
        assert!(imports.contains(&"pickle".to_string()));
    }

    #[test]
    fn test_malformed_constructs_are_skipped() {
        let source = "def broken(:\n    pass\n\ndef fine():\n    return 2\n";
        let (symbols, _) = extract(source);
        assert!(symbols.iter().any(|s| s.name == "fine"));
    }
}
