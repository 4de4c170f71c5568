//! Tree-sitter-backed parsers, one per supported language. Each module
//! exposes a `parse(content: &str) -> Vec<ParsedChunk>` that chunks by
//! top-level definition boundaries (function/class/struct/impl/...),
//! falling back to the line-budget chunker if the source fails to parse.

/// JavaScript (and, with `jsx=true`, JSX) chunker.
pub mod javascript;
/// Python chunker.
pub mod python;
/// Rust chunker.
pub mod rust;
/// TypeScript (and TSX) chunker.
pub mod typescript;

use super::fallback;
use super::registry::ParsedChunk;
use tree_sitter::{Node, Parser};

/// Parse `content` with `language`, and emit one [`ParsedChunk`] per direct
/// child of the root node whose kind is in `top_level_kinds`. Any source
/// lines not covered by such a child are left uncovered — the callers here
/// only chunk definitions, so non-definition lines (imports, comments
/// between definitions) are simply absent from the result. Falls back to
/// the line-budget chunker if the tree-sitter parser can't be constructed
/// or parsing fails outright.
pub(super) fn chunk_by_top_level_kinds(
    content: &str,
    language: tree_sitter::Language,
    top_level_kinds: &[&str],
    name_field: &str,
) -> Vec<ParsedChunk> {
    let mut parser = Parser::new();
    if parser.set_language(&language).is_err() {
        return fallback::chunk(content);
    }
    let Some(tree) = parser.parse(content, None) else {
        return fallback::chunk(content);
    };

    let root = tree.root_node();
    let bytes = content.as_bytes();
    let mut chunks = Vec::new();
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        if !top_level_kinds.contains(&child.kind()) {
            continue;
        }
        let start_line = child.start_position().row as u32 + 1;
        let end_line = child.end_position().row as u32 + 1;
        let text = child.utf8_text(bytes).unwrap_or_default().trim();
        if text.len() < 10 {
            continue;
        }
        let symbol = symbol_name(child, name_field, bytes);
        chunks.push(ParsedChunk {
            content: text.to_string(),
            start_line,
            end_line,
            symbols: symbol.into_iter().collect(),
            imports: Vec::new(),
        });
    }

    if chunks.is_empty() {
        return fallback::chunk(content);
    }
    chunks
}

fn symbol_name(node: Node, name_field: &str, bytes: &[u8]) -> Option<String> {
    node.child_by_field_name(name_field)
        .and_then(|n| n.utf8_text(bytes).ok())
        .map(|s| s.to_string())
}

/// Extract `use`/`import`-style lines via a simple line prefix match. Used
/// by every language module; precise import-graph extraction lives in
/// [`super::edges`], this is only for populating `Chunk::imports`.
pub(super) fn extract_import_lines<'a>(content: &'a str, prefixes: &[&str]) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| prefixes.iter().any(|p| l.starts_with(p)))
        .map(|l| l.to_string())
        .collect()
}
