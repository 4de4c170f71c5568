//! Anchor Builder (C7).
//!
//! Builds the deterministic header prepended to a chunk's content before it
//! is sent to the embedding provider. The header is never stored: `Chunk`
//! always carries raw content, and the anchor is computed fresh at embed
//! time from the chunk's own fields.

use crate::domain::types::{Chunk, ChunkKind};

/// Comment prefix used for a chunk kind's anchor lines: `//` for code and
/// contracts, `#` for docs/config (markdown, yaml, toml, json, env).
fn comment_prefix(kind: ChunkKind) -> &'static str {
    match kind {
        ChunkKind::Docs | ChunkKind::Config => "#",
        _ => "//",
    }
}

/// Build the anchor text for `chunk` and return it concatenated with the
/// chunk's content, ready to hand to an embedding provider. The stored
/// `chunk.content` is never mutated.
pub fn anchor_text(chunk: &Chunk) -> String {
    let p = comment_prefix(chunk.chunk_type);
    let mut lines = Vec::with_capacity(4);

    lines.push(format!(
        "{p} File: {} [{}]",
        chunk.file,
        chunk.chunk_type.collection_suffix()
    ));

    if let Some(service) = &chunk.service {
        lines.push(format!("{p} Layer: {:?} | Service: {service}", chunk.layer));
    } else {
        lines.push(format!("{p} Layer: {:?}", chunk.layer));
    }

    if !chunk.symbols.is_empty() {
        let defines = chunk.symbols.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        lines.push(format!("{p} Defines: {defines}"));
    }

    if !chunk.imports.is_empty() {
        let imports = chunk.imports.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        lines.push(format!("{p} Imports: {imports}"));
    }

    let header = lines.join("\n");
    format!("{header}\n{}", chunk.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Layer;
    use chrono::Utc;

    fn base_chunk() -> Chunk {
        Chunk {
            id: uuid::Uuid::new_v4(),
            file: "src/service/auth.rs".to_string(),
            start_line: 1,
            end_line: 10,
            language: "rust".to_string(),
            content: "fn login() {}".to_string(),
            chunk_type: ChunkKind::Code,
            layer: Layer::Service,
            service: Some("AuthService".to_string()),
            imports: vec!["std::io".to_string()],
            symbols: vec!["login".to_string()],
            chunk_index: 0,
            total_chunks: 1,
            project: "demo".to_string(),
            indexed_at: Utc::now(),
            file_hash: None,
            git_commit: None,
        }
    }

    #[test]
    fn code_anchor_uses_slash_slash_and_lists_defines_and_imports() {
        let chunk = base_chunk();
        let text = anchor_text(&chunk);
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "// File: src/service/auth.rs [code]");
        assert_eq!(lines.next().unwrap(), "// Layer: Service | Service: AuthService");
        assert_eq!(lines.next().unwrap(), "// Defines: login");
        assert_eq!(lines.next().unwrap(), "// Imports: std::io");
        assert_eq!(lines.next().unwrap(), "fn login() {}");
    }

    #[test]
    fn docs_anchor_uses_hash_prefix() {
        let mut chunk = base_chunk();
        chunk.chunk_type = ChunkKind::Docs;
        chunk.service = None;
        chunk.symbols.clear();
        chunk.imports.clear();
        let text = anchor_text(&chunk);
        assert!(text.starts_with("# File: src/service/auth.rs [docs]"));
        assert!(text.contains("# Layer: Service"));
    }

    #[test]
    fn symbols_and_imports_capped_at_five() {
        let mut chunk = base_chunk();
        chunk.symbols = (0..10).map(|i| format!("fn{i}")).collect();
        chunk.imports = (0..10).map(|i| format!("mod{i}")).collect();
        let text = anchor_text(&chunk);
        let defines_line = text.lines().find(|l| l.contains("Defines:")).unwrap();
        assert_eq!(defines_line.matches(',').count(), 4);
    }

    #[test]
    fn anchor_never_mutates_stored_content() {
        let chunk = base_chunk();
        let original = chunk.content.clone();
        let _ = anchor_text(&chunk);
        assert_eq!(chunk.content, original);
    }
}
