//! Python chunker: one chunk per top-level `def` or `class`.

use super::{chunk_by_top_level_kinds, extract_import_lines};
use crate::parsing::registry::ParsedChunk;

const TOP_LEVEL_KINDS: &[&str] = &["function_definition", "class_definition"];

/// Parse Python source into per-definition chunks.
pub fn parse(content: &str) -> Vec<ParsedChunk> {
    let mut chunks = chunk_by_top_level_kinds(
        content,
        tree_sitter_python::LANGUAGE.into(),
        TOP_LEVEL_KINDS,
        "name",
    );
    let imports = extract_import_lines(content, &["import ", "from "]);
    if let Some(first) = chunks.first_mut() {
        first.imports = imports;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_top_level_def_and_class() {
        let src = "def a():\n    return 1\n\nclass Foo:\n    def bar(self):\n        pass\n";
        let chunks = parse(src);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbols, vec!["a".to_string()]);
        assert_eq!(chunks[1].symbols, vec!["Foo".to_string()]);
    }
}
