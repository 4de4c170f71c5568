//! Step 6 — token-budget compression: greedy selection in rank order, with
//! a single truncate-and-stop step when the budget is nearly spent.

use super::fusion::RetrievedChunk;

const TRUNCATE_SUFFIX: &str = "\n… [truncated]";
const TRUNCATE_THRESHOLD: f32 = 0.8;

/// `⌈chars / 4⌉`, the token estimate used throughout this step.
fn estimate_tokens(content: &str) -> usize {
    content.chars().count().div_ceil(4)
}

/// Greedily select `candidates` (already ranked) within `max_tokens`.
///
/// A chunk that doesn't fit gets one chance: if `running_tokens` is still
/// below `0.8 * max_tokens`, it is truncated to fill the remaining budget
/// and selection stops; otherwise selection stops without it.
pub fn compress(candidates: Vec<RetrievedChunk>, max_tokens: usize) -> (Vec<RetrievedChunk>, usize) {
    let mut selected = Vec::new();
    let mut running = 0usize;
    let truncate_floor = (max_tokens as f32 * TRUNCATE_THRESHOLD) as usize;

    for mut chunk in candidates {
        let tokens = estimate_tokens(&chunk.content);
        if running + tokens <= max_tokens {
            running += tokens;
            selected.push(chunk);
            continue;
        }

        let suffix_tokens = estimate_tokens(TRUNCATE_SUFFIX);
        if running < truncate_floor && max_tokens - running > suffix_tokens {
            let remaining_tokens = max_tokens - running - suffix_tokens;
            let truncate_chars = remaining_tokens * 4;
            let truncated: String = chunk.content.chars().take(truncate_chars).collect();
            chunk.content = format!("{truncated}{TRUNCATE_SUFFIX}");
            running += estimate_tokens(&chunk.content);
            selected.push(chunk);
        }
        break;
    }

    (selected, running)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> RetrievedChunk {
        RetrievedChunk { file: "a.rs".to_string(), content: content.to_string(), language: "rust".to_string(), score: 1.0, facet: "code".to_string() }
    }

    #[test]
    fn chunks_that_fit_are_all_selected() {
        let candidates = vec![chunk(&"a".repeat(40)), chunk(&"b".repeat(40))];
        let (selected, tokens) = compress(candidates, 1000);
        assert_eq!(selected.len(), 2);
        assert_eq!(tokens, 20);
    }

    #[test]
    fn an_oversize_chunk_near_the_budget_is_truncated_and_stops_selection() {
        let candidates = vec![chunk(&"a".repeat(36)), chunk(&"b".repeat(400)), chunk(&"c".repeat(40))];
        let (selected, _) = compress(candidates, 40);
        assert_eq!(selected.len(), 2);
        assert!(selected[1].content.ends_with("[truncated]"));
    }

    #[test]
    fn a_chunk_that_doesnt_fit_past_the_truncate_floor_is_dropped() {
        let candidates = vec![chunk(&"a".repeat(144)), chunk(&"b".repeat(40))];
        let (selected, _) = compress(candidates, 40);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn three_eighty_token_chunks_at_a_two_hundred_budget_drop_the_third_whole() {
        let candidates = vec![chunk(&"a".repeat(320)), chunk(&"b".repeat(320)), chunk(&"c".repeat(320))];
        let (selected, tokens) = compress(candidates, 200);
        assert_eq!(selected.len(), 2);
        assert_eq!(tokens, 160);
        assert!(selected.iter().all(|c| !c.content.ends_with("[truncated]")));
    }
}
