use tree_sitter::{Node, Parser};

use crate::error::{CodeAtlasError, Result};
use super::super::graph::SymbolKind;
use super::{LanguageExtractor, SymbolRecord};

/// Node kinds counted as branching constructs for complexity estimation
const BRANCH_KINDS: &[&str] = &[
    "if_expression",
    "while_expression",
    "for_expression",
    "loop_expression",
    "match_arm",
];

/// Rust-specific symbol extractor using Tree-sitter
///
/// Structs, enums and traits are recorded as class-kind symbols; impl
/// methods nest under their impl type.
pub struct RustExtractor {
    parser: Parser,
}

impl RustExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let rust_language = tree_sitter_rust::language();
        parser.set_language(&rust_language).map_err(|e| {
            CodeAtlasError::Extractor(format!("Failed to set Rust language: {}", e))
        })?;

        Ok(Self { parser })
    }
}

impl LanguageExtractor for RustExtractor {
    fn extract(&mut self, content: &str) -> Result<(Vec<SymbolRecord>, Vec<String>)> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| CodeAtlasError::Extractor("Failed to parse Rust code".to_string()))?;

        let mut symbols = Vec::new();
        let mut imports = Vec::new();
        self.walk_items(tree.root_node(), content, &mut symbols, &mut imports);

        Ok((symbols, imports))
    }

    fn language_name(&self) -> &str {
        "rust"
    }
}

impl RustExtractor {
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
                "function_item" => {
                    if let Some(function) = self.parse_function(child, source, None) {
                        symbols.push(function);
                    }
                }
                "struct_item" | "enum_item" | "trait_item" => {
                    if let Some(record) = self.parse_type(child, source) {
                        symbols.push(record);
                    }
                }
                "impl_item" => {
                    self.collect_impl_methods(child, source, symbols);
                }
                "use_declaration" => {
                    if let Some(argument) = child.child_by_field_name("argument") {
                        imports.push(self.use_token(argument, source));
                    }
                }
                "mod_item" => {
                    if let Some(body) = child.child_by_field_name("body") {
                        self.walk_items(body, source, symbols, imports);
                    }
                }
                _ => {}
            }
        }
    }

    /// Parse a struct/enum/trait item as a class-kind record
    fn parse_type(&self, node: Node, source: &str) -> Option<SymbolRecord> {
        let name_node = node.child_by_field_name("name")?;

        Some(SymbolRecord {
            name: self.node_text(name_node, source),
            kind: SymbolKind::Class,
            parent: None,
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
            base_classes: vec![],
            branch_tokens: 0,
            calls: vec![],
        })
    }

    /// Record every method defined in an impl block, nested under the
    /// impl type name
    fn collect_impl_methods(&self, node: Node, source: &str, symbols: &mut Vec<SymbolRecord>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let type_name = self
            .node_text(type_node, source)
            .split('<')
            .next()
            .unwrap_or_default()
            .to_string();
        if type_name.is_empty() {
            return;
        }

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "function_item" {
                if let Some(method) = self.parse_function(child, source, Some(&type_name)) {
                    symbols.push(method);
                }
            }
        }
    }

    fn parse_function(
        &self,
        node: Node,
        source: &str,
        parent_type: Option<&str>,
    ) -> Option<SymbolRecord> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.node_text(name_node, source);

        let body = node.child_by_field_name("body").unwrap_or(node);
        let branch_tokens = self.count_branches(body, source);
        let mut calls = Vec::new();
        self.collect_calls(body, source, &mut calls);

        Some(SymbolRecord {
            name,
            kind: SymbolKind::Function,
            parent: parent_type.map(|s| s.to_string()),
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
            base_classes: vec![],
            branch_tokens,
            calls,
        })
    }

    /// Count branching constructs under a node, including lazy boolean
    /// operators
    fn count_branches(&self, node: Node, source: &str) -> u32 {
        let mut count = 0;

        if BRANCH_KINDS.contains(&node.kind()) {
            count += 1;
        } else if node.kind() == "binary_expression" {
            if let Some(operator) = node.child_by_field_name("operator") {
                let text = self.node_text(operator, source);
                if text == "&&" || text == "||" {
                    count += 1;
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            count += self.count_branches(child, source);
        }
        count
    }

    /// Collect bare callee tokens from call expressions
    fn collect_calls(&self, node: Node, source: &str, calls: &mut Vec<String>) {
        if node.kind() == "call_expression" {
            if let Some(function) = node.child_by_field_name("function") {
                match function.kind() {
                    "identifier" => calls.push(self.node_text(function, source)),
                    "scoped_identifier" => {
                        if let Some(name) = function.child_by_field_name("name") {
                            calls.push(self.node_text(name, source));
                        }
                    }
                    "field_expression" => {
                        if let Some(field) = function.child_by_field_name("field") {
                            calls.push(self.node_text(field, source));
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

    /// Flatten a use tree into one dotted token
    ///
    /// `use std::collections::HashMap` yields "std.collections.HashMap";
    /// a braced list keeps only the shared prefix, so
    /// `use std::{io, fmt}` yields "std".
    fn use_token(&self, node: Node, source: &str) -> String {
        let text = self.node_text(node, source);
        let prefix = text.split("::{").next().unwrap_or(&text);
        let prefix = prefix.split(" as ").next().unwrap_or(prefix);
        prefix.trim().trim_end_matches("::*").replace("::", ".")
    }

    fn node_text(&self, node: Node, source: &str) -> String {
        source[node.byte_range()].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> (Vec<SymbolRecord>, Vec<String>) {
        RustExtractor::new().unwrap().extract(source).unwrap()
    }

    #[test]
    fn test_types_and_impl_methods() {
        let source = r#"
use std::collections::HashMap;
use serde::{Serialize, Deserialize};

pub struct Counter {
    counts: HashMap<String, usize>,
}

impl Counter {
    pub fn bump(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }
}

fn main() {
    let mut counter = Counter::default();
    counter.bump("a");
}
"#;
        let (symbols, imports) = extract(source);

        let counter = symbols.iter().find(|s| s.name == "Counter").unwrap();
        assert_eq!(counter.kind, SymbolKind::Class);

        let bump = symbols.iter().find(|s| s.name == "bump").unwrap();
        assert_eq!(bump.parent.as_deref(), Some("Counter"));

        let main = symbols.iter().find(|s| s.name == "main").unwrap();
        assert!(main.calls.contains(&"bump".to_string()));

        assert_eq!(imports, vec!["std.collections.HashMap", "serde"]);
    }

    #[test]
    fn test_branch_token_counting() {
        let source = r#"
fn decide(x: i32, flag: bool) -> i32 {
    if x > 0 && flag {
        for i in 0..x {
            let _ = i;
        }
    }
    match x {
        0 => 0,
        _ => 1,
    }
}
"#;
        let (symbols, _) = extract(source);
        let decide = symbols.iter().find(|s| s.name == "decide").unwrap();
        // if + && + for + two match arms
        assert_eq!(decide.branch_tokens, 5);
    }
}
