//! JavaScript / TypeScript / JSX parser.
//!
//! Imports are found lexically (two independent patterns). Exports come from a
//! tree-sitter syntax tree built with the TSX grammar, which accepts plain
//! module JavaScript, type annotations, and JSX.

use crate::domain::ExportEntry;
use crate::error::Skipped;
use crate::parser::SourceParser;
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Language, Node, Parser};

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+(?:[^"';]+?\s+from\s+)?["']([^"'\n]+?)["']"#)
        .expect("valid import regex")
});
static REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"require\(\s*["']([^"'\n]+?)["']\s*\)"#).expect("valid require regex")
});

pub struct EcmaScriptParser;

impl Default for EcmaScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EcmaScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for EcmaScriptParser {
    fn dialect(&self) -> &'static str {
        "ecmascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs"]
    }

    fn extract_imports(&self, content: &str) -> Vec<String> {
        let imports = IMPORT_RE.captures_iter(content).filter_map(|c| c.get(1));
        let requires = REQUIRE_RE.captures_iter(content).filter_map(|c| c.get(1));

        imports
            .chain(requires)
            .map(|m| m.as_str().trim().to_string())
            .filter(|spec| spec.starts_with('.'))
            .collect()
    }

    fn extract_exports(&self, content: &str) -> Result<Vec<ExportEntry>, Skipped> {
        let language: Language = tree_sitter_typescript::LANGUAGE_TSX.into();
        let mut parser = Parser::new();
        parser.set_language(&language).map_err(|_| Skipped::ParseFailed)?;

        let tree = parser.parse(content, None).ok_or(Skipped::ParseFailed)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(Skipped::ParseFailed);
        }

        let source = content.as_bytes();
        let mut exports = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() == "export_statement" {
                collect_export(&node, source, &mut exports);
            }
        }
        Ok(exports)
    }
}

fn collect_export(node: &Node, source: &[u8], out: &mut Vec<ExportEntry>) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();

    if children.iter().any(|child| child.kind() == "default") {
        out.push(ExportEntry::DefaultExport);
        return;
    }

    if let Some(decl) = node.child_by_field_name("declaration") {
        match decl.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_text(&decl, "name", source) {
                    out.push(ExportEntry::Function(name));
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = field_text(&decl, "name", source) {
                    out.push(ExportEntry::Class(name));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut decl_cursor = decl.walk();
                for declarator in decl.named_children(&mut decl_cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    // Destructuring patterns have no single name
                    let Some(name_node) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    if name_node.kind() == "identifier" {
                        if let Ok(name) = name_node.utf8_text(source) {
                            out.push(ExportEntry::Variable(name.to_string()));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    for child in &children {
        match child.kind() {
            "export_clause" => {
                let mut clause_cursor = child.walk();
                for spec in child.named_children(&mut clause_cursor) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    let exported = field_text(&spec, "alias", source)
                        .or_else(|| field_text(&spec, "name", source));
                    if let Some(name) = exported {
                        out.push(ExportEntry::Reexport(unquote(&name)));
                    }
                }
            }
            "namespace_export" => {
                if let Some(name) = child.named_child(0).and_then(|n| n.utf8_text(source).ok()) {
                    out.push(ExportEntry::Reexport(unquote(name)));
                }
            }
            _ => {}
        }
    }
}

fn field_text(node: &Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)?.utf8_text(source).ok().map(str::to_string)
}

fn unquote(name: &str) -> String {
    name.trim_matches(|c| c == '"' || c == '\'').to_string()
}
