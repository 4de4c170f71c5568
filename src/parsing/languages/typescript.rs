//! TypeScript chunker: one chunk per top-level function, class, interface,
//! type alias, or enum.

use super::{chunk_by_top_level_kinds, extract_import_lines};
use crate::parsing::registry::ParsedChunk;

const TOP_LEVEL_KINDS: &[&str] = &[
    "function_declaration",
    "class_declaration",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
    "export_statement",
];

/// Parse TypeScript source into per-definition chunks.
pub fn parse(content: &str) -> Vec<ParsedChunk> {
    let mut chunks = chunk_by_top_level_kinds(
        content,
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        TOP_LEVEL_KINDS,
        "name",
    );
    let imports = extract_import_lines(content, &["import "]);
    if let Some(first) = chunks.first_mut() {
        first.imports = imports;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_interfaces_and_functions() {
        let src = "interface Foo {\n  bar: string;\n}\n\nfunction baz(): number {\n  return 1;\n}\n";
        let chunks = parse(src);
        assert!(chunks.len() >= 2);
    }
}
