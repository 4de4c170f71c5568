//! Dispatch table from a file path to the parser that can chunk it.

use super::fallback;
use super::languages::{javascript, python, rust, typescript};
use crate::domain::types::ChunkKind;
use std::path::Path;

/// A chunk as produced by parsing, before the indexer attaches the fields
/// that depend on run context (project, layer, service, timestamps, ids).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedChunk {
    /// Raw chunk content, exactly as it appears in the source file.
    pub content: String,
    /// 1-based inclusive start line.
    pub start_line: u32,
    /// 1-based inclusive end line.
    pub end_line: u32,
    /// Symbols defined within this chunk's line range, if the parser could
    /// determine them.
    pub symbols: Vec<String>,
    /// Imports visible in this chunk's line range, if the parser could
    /// determine them.
    pub imports: Vec<String>,
}

/// Parses files into [`ParsedChunk`]s, dispatching by extension to a
/// tree-sitter-backed language parser and falling back to
/// [`fallback::chunk`] for anything else.
#[derive(Debug, Default)]
pub struct ParserRegistry;

impl ParserRegistry {
    /// Create a new registry. Stateless; parsers are constructed per call
    /// since tree-sitter parsers are cheap and not `Sync`.
    pub fn new() -> Self {
        Self
    }

    /// Parse `content` from `path`, producing chunks plus the detected
    /// language tag.
    pub fn parse(&self, content: &str, path: &str) -> (Vec<ParsedChunk>, String) {
        match language_for(path) {
            Some(Language::Rust) => (rust::parse(content), "rust".to_string()),
            Some(Language::Python) => (python::parse(content), "python".to_string()),
            Some(Language::JavaScript) => (javascript::parse(content, false), "javascript".to_string()),
            Some(Language::TypeScript) => (typescript::parse(content), "typescript".to_string()),
            None => (fallback::chunk(content), language_tag(path)),
        }
    }

    /// Classify a file's chunk kind from its path, independent of parsing.
    pub fn classify_file(&self, path: &str) -> ChunkKind {
        classify_file(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
}

fn language_for(path: &str) -> Option<Language> {
    let ext = Path::new(path).extension()?.to_str()?;
    match ext {
        "rs" => Some(Language::Rust),
        "py" => Some(Language::Python),
        "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
        "ts" | "tsx" => Some(Language::TypeScript),
        _ => None,
    }
}

fn language_tag(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("text")
        .to_string()
}

/// Classify a file's chunk kind purely from its path — extension and a few
/// well-known filenames (`Dockerfile`, `.env*`).
pub fn classify_file(path: &str) -> ChunkKind {
    let lower = path.to_lowercase();
    let file_name = Path::new(&lower)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if file_name.starts_with("dockerfile") || file_name.starts_with(".env") {
        return ChunkKind::Config;
    }

    match Path::new(&lower).extension().and_then(|e| e.to_str()) {
        Some("rs" | "py" | "js" | "jsx" | "ts" | "tsx" | "go" | "java" | "rb" | "c" | "cpp" | "h") => {
            ChunkKind::Code
        }
        Some("md" | "mdx" | "rst" | "txt") => ChunkKind::Docs,
        Some("yaml" | "yml" | "toml" | "json" | "ini" | "conf") => ChunkKind::Config,
        Some("proto" | "graphql" | "gql") => ChunkKind::Contracts,
        _ if lower.contains("openapi") || lower.contains("swagger") => ChunkKind::Contracts,
        _ => ChunkKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify_file("src/main.rs"), ChunkKind::Code);
        assert_eq!(classify_file("README.md"), ChunkKind::Docs);
        assert_eq!(classify_file("config/app.yaml"), ChunkKind::Config);
        assert_eq!(classify_file("api/schema.proto"), ChunkKind::Contracts);
        assert_eq!(classify_file("data.bin"), ChunkKind::Unknown);
    }

    #[test]
    fn dockerfile_and_dotenv_are_config() {
        assert_eq!(classify_file("Dockerfile"), ChunkKind::Config);
        assert_eq!(classify_file(".env.production"), ChunkKind::Config);
    }

    #[test]
    fn unsupported_extension_falls_back_with_real_line_numbers() {
        let registry = ParserRegistry::new();
        let (chunks, lang) = registry.parse("a\nb\nc\n", "notes.xyz");
        assert_eq!(lang, "xyz");
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].start_line, 1);
    }
}
