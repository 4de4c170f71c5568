//! Rust chunker: one chunk per top-level `fn`, `struct`, `enum`, `trait`,
//! `impl`, or `mod` item.

use super::{chunk_by_top_level_kinds, extract_import_lines};
use crate::parsing::registry::ParsedChunk;

const TOP_LEVEL_KINDS: &[&str] = &[
    "function_item",
    "struct_item",
    "enum_item",
    "trait_item",
    "impl_item",
    "mod_item",
];

/// Parse Rust source into per-item chunks.
pub fn parse(content: &str) -> Vec<ParsedChunk> {
    let mut chunks = chunk_by_top_level_kinds(
        content,
        tree_sitter_rust::LANGUAGE.into(),
        TOP_LEVEL_KINDS,
        "name",
    );
    let imports = extract_import_lines(content, &["use "]);
    if let Some(first) = chunks.first_mut() {
        first.imports = imports;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_top_level_functions() {
        let src = "fn one() {\n    1\n}\n\nfn two() {\n    2\n}\n";
        let chunks = parse(src);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbols, vec!["one".to_string()]);
        assert_eq!(chunks[1].symbols, vec!["two".to_string()]);
    }

    #[test]
    fn falls_back_on_unparseable_input() {
        let chunks = parse("not even close to rust {{{ ??? ");
        assert!(!chunks.is_empty());
    }
}
