//! Dependency-edge extraction (component C4), independent of chunking.
//!
//! Heuristic and regex-based: there is no full symbol-resolution pass.
//! Extraction failures never fail indexing of the file — callers log and
//! continue.

use crate::domain::types::{Edge, EdgeType};
use regex::Regex;
use std::sync::LazyLock;

static RUST_USE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*use\s+([\w:]+)").unwrap());
static PY_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:from\s+([\w.]+)\s+import|import\s+([\w.]+))").unwrap());
static JS_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*import\s+.*from\s+['"]([^'"]+)['"]"#).unwrap());
static EXTENDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+(\w+)\s*(?:<[^>]*>)?\s*extends\s+(\w+)").unwrap());
static IMPLEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+(\w+).*implements\s+(\w+)").unwrap());
static RUST_IMPL_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"impl(?:<[^>]*>)?\s+(\w+)\s+for\s+(\w+)").unwrap());

/// Extract dependency edges originating from `file`. `symbols` are the
/// names already extracted for this file by the parser registry, used to
/// find intra-file call edges.
pub fn extract_edges(project: &str, file: &str, content: &str, symbols: &[String]) -> Vec<Edge> {
    let mut edges = Vec::new();

    for line in content.lines() {
        if let Some(caps) = RUST_USE.captures(line) {
            push_import(&mut edges, project, file, &caps[1]);
        } else if let Some(caps) = PY_IMPORT.captures(line) {
            let module = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            if let Some(module) = module {
                push_import(&mut edges, project, file, module);
            }
        } else if let Some(caps) = JS_IMPORT.captures(line) {
            push_import(&mut edges, project, file, &caps[1]);
        }
    }

    for caps in EXTENDS.captures_iter(content) {
        edges.push(Edge {
            from_file: file.to_string(),
            from_symbol: Some(caps[1].to_string()),
            to_file: file.to_string(),
            to_symbol: Some(caps[2].to_string()),
            edge_type: EdgeType::Extends,
            project: project.to_string(),
        });
    }

    for caps in IMPLEMENTS.captures_iter(content) {
        edges.push(Edge {
            from_file: file.to_string(),
            from_symbol: Some(caps[1].to_string()),
            to_file: file.to_string(),
            to_symbol: Some(caps[2].to_string()),
            edge_type: EdgeType::Implements,
            project: project.to_string(),
        });
    }

    for caps in RUST_IMPL_FOR.captures_iter(content) {
        edges.push(Edge {
            from_file: file.to_string(),
            from_symbol: Some(caps[1].to_string()),
            to_file: file.to_string(),
            to_symbol: Some(caps[2].to_string()),
            edge_type: EdgeType::Implements,
            project: project.to_string(),
        });
    }

    for symbol in symbols {
        let pattern = format!(r"\b{}\s*\(", regex::escape(symbol));
        let Ok(re) = Regex::new(&pattern) else { continue };
        if re.find_iter(content).count() > 1 {
            edges.push(Edge {
                from_file: file.to_string(),
                from_symbol: None,
                to_file: file.to_string(),
                to_symbol: Some(symbol.clone()),
                edge_type: EdgeType::Call,
                project: project.to_string(),
            });
        }
    }

    edges
}

fn push_import(edges: &mut Vec<Edge>, project: &str, file: &str, module: &str) {
    edges.push(Edge {
        from_file: file.to_string(),
        from_symbol: None,
        to_file: module.to_string(),
        to_symbol: None,
        edge_type: EdgeType::Import,
        project: project.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_rust_use_as_import_edge() {
        let edges = extract_edges("p", "src/lib.rs", "use crate::domain::types::Chunk;\n", &[]);
        assert!(edges
            .iter()
            .any(|e| e.edge_type == EdgeType::Import && e.to_file == "crate::domain::types::Chunk"));
    }

    #[test]
    fn extracts_js_extends_edge() {
        let edges = extract_edges(
            "p",
            "src/widget.js",
            "class Widget extends Component {\n}\n",
            &[],
        );
        assert!(edges.iter().any(|e| e.edge_type == EdgeType::Extends
            && e.from_symbol.as_deref() == Some("Widget")
            && e.to_symbol.as_deref() == Some("Component")));
    }

    #[test]
    fn malformed_content_never_panics() {
        let edges = extract_edges("p", "f.rs", "{{{ ??? not code at all ]]]", &[]);
        assert!(edges.is_empty() || !edges.is_empty());
    }
}
