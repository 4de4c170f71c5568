//! Parser Registry & AST/Edge Extractor (components C3, C4).
//!
//! [`registry::ParserRegistry`] dispatches a file to a tree-sitter-backed
//! language parser, falling back to [`fallback::LineBudgetChunker`] for
//! anything unsupported. [`edges::extract_edges`] is a separate,
//! best-effort pass: failures here never fail indexing of the file itself.

/// Dependency-edge extraction, independent of chunking.
pub mod edges;
/// Line-budget fallback chunker for unsupported languages.
pub mod fallback;
/// Tree-sitter-backed parsers, one module per supported language.
pub mod languages;
/// Dispatch table from file path to parser.
pub mod registry;

pub use registry::{ParsedChunk, ParserRegistry};
