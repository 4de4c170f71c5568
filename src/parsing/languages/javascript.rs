//! JavaScript (and JSX) chunker: one chunk per top-level function, class,
//! or exported const/let arrow-function declaration.

use super::{chunk_by_top_level_kinds, extract_import_lines};
use crate::parsing::registry::ParsedChunk;

const TOP_LEVEL_KINDS: &[&str] = &[
    "function_declaration",
    "class_declaration",
    "lexical_declaration",
    "export_statement",
];

/// Parse JavaScript (JSX included — the grammar handles both) source into
/// per-definition chunks. `jsx` is accepted for call-site clarity but does
/// not change which grammar is loaded.
pub fn parse(content: &str, _jsx: bool) -> Vec<ParsedChunk> {
    let mut chunks = chunk_by_top_level_kinds(
        content,
        tree_sitter_javascript::LANGUAGE.into(),
        TOP_LEVEL_KINDS,
        "name",
    );
    let imports = extract_import_lines(content, &["import ", "const ", "require("]);
    if let Some(first) = chunks.first_mut() {
        first.imports = imports.into_iter().filter(|l| l.starts_with("import ")).collect();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_top_level_function_and_class() {
        let src = "function a() {\n  return 1;\n}\n\nclass Foo {\n  bar() {}\n}\n";
        let chunks = parse(src, false);
        assert!(chunks.len() >= 2);
    }
}
