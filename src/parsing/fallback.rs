//! Line-budget fallback chunker, used for any file the parser registry has
//! no language-specific parser for.
//!
//! Accumulates lines up to roughly 1 000 characters per chunk. Unlike the
//! teacher's regex-block chunker this one guarantees full coverage and real
//! line numbers for every input line — both are testable invariants of the
//! wider system (deterministic chunking requires the fallback path to be
//! gapless).

use super::registry::ParsedChunk;

const TARGET_CHUNK_CHARS: usize = 1_000;
const MIN_TRIMMED_LEN: usize = 10;

/// Split `content` into chunks of roughly [`TARGET_CHUNK_CHARS`] characters,
/// on line boundaries, dropping chunks whose trimmed length is under
/// [`MIN_TRIMMED_LEN`]. Line numbers are 1-based and reflect the real
/// position of each line in `content`.
pub fn chunk(content: &str) -> Vec<ParsedChunk> {
    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut start_line = 1usize;

    for (i, line) in lines.iter().enumerate() {
        let line_no = i + 1;
        if buf.is_empty() {
            start_line = line_no;
        }
        buf.push_str(line);
        buf.push('\n');

        if buf.len() >= TARGET_CHUNK_CHARS {
            push_chunk(&mut chunks, &buf, start_line, line_no);
            buf.clear();
        }
    }

    if !buf.is_empty() {
        push_chunk(&mut chunks, &buf, start_line, lines.len());
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<ParsedChunk>, buf: &str, start_line: usize, end_line: usize) {
    let trimmed = buf.trim();
    if trimmed.len() < MIN_TRIMMED_LEN {
        return;
    }
    chunks.push(ParsedChunk {
        content: trimmed.to_string(),
        start_line: start_line as u32,
        end_line: end_line as u32,
        symbols: Vec::new(),
        imports: Vec::new(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk("").is_empty());
    }

    #[test]
    fn whitespace_only_is_dropped() {
        assert!(chunk("   \n\t\n  ").is_empty());
    }

    #[test]
    fn line_numbers_are_real_and_monotonic() {
        let content = (0..50).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let chunks = chunk(&content);
        assert!(!chunks.is_empty());
        let mut prev_end = 0u32;
        for c in &chunks {
            assert!(c.start_line > prev_end);
            assert!(c.end_line >= c.start_line);
            prev_end = c.end_line;
        }
        assert_eq!(chunks.last().unwrap().end_line, 50);
    }

    #[test]
    fn large_file_splits_into_multiple_chunks_around_target_size() {
        let long_line = "x".repeat(100);
        let content = std::iter::repeat(long_line).take(50).collect::<Vec<_>>().join("\n");
        let chunks = chunk(&content);
        assert!(chunks.len() > 1);
    }
}
