//! Scoring metrics for the offline evaluation harness.
//!
//! Metrics are deliberately cheap and deterministic: keyword coverage
//! and fenced-code-block checks, no model-graded judging.

/// Fraction of expected topics mentioned in the answer.
///
/// Case-insensitive substring match. An empty topic list scores 1.0
/// since there is nothing to miss.
pub fn topic_coverage(answer: &str, topics: &[String]) -> f32 {
    if topics.is_empty() {
        return 1.0;
    }
    let lower = answer.to_lowercase();
    let hit = topics
        .iter()
        .filter(|t| lower.contains(&t.to_lowercase()))
        .count();
    hit as f32 / topics.len() as f32
}

/// Extract the bodies of fenced code blocks from markdown text.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            match current.take() {
                Some(block) => blocks.push(block),
                None => current = Some(String::new()),
            }
        } else if let Some(block) = current.as_mut() {
            if !block.is_empty() {
                block.push('\n');
            }
            block.push_str(line);
        }
    }

    blocks
}

/// True when the answer contains at least one closed, non-empty fenced
/// code block.
pub fn has_code_block(answer: &str) -> bool {
    let open_fences = answer
        .lines()
        .filter(|l| l.trim_start().starts_with("```"))
        .count();
    if open_fences % 2 != 0 {
        // Unterminated fence: the answer was cut off mid-block.
        return false;
    }
    extract_code_blocks(answer)
        .iter()
        .any(|b| !b.trim().is_empty())
}

/// Fraction of expected snippets (exact substrings, e.g. API names or
/// call syntax) appearing anywhere in the answer.
pub fn snippet_presence(answer: &str, snippets: &[String]) -> f32 {
    if snippets.is_empty() {
        return 1.0;
    }
    let hit = snippets.iter().filter(|s| answer.contains(s.as_str())).count();
    hit as f32 / snippets.len() as f32
}

/// Aggregate score for one answer.
///
/// Weighted mean over the components the question actually asks for:
/// topic coverage 0.5, snippet presence 0.3, closed code block 0.2.
/// Weights for absent components are redistributed.
pub fn question_score(
    answer: &str,
    topics: &[String],
    snippets: &[String],
    expects_code: bool,
) -> f32 {
    let mut total = 0.5 * topic_coverage(answer, topics);
    let mut weight = 0.5;

    if !snippets.is_empty() {
        total += 0.3 * snippet_presence(answer, snippets);
        weight += 0.3;
    }

    if expects_code {
        let code = if has_code_block(answer) { 1.0 } else { 0.0 };
        total += 0.2 * code;
        weight += 0.2;
    }

    total / weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_topic_coverage_partial() {
        let answer = "Checkpointers persist state. Use MemorySaver for tests.";
        let coverage = topic_coverage(answer, &topics(&["checkpointer", "MemorySaver", "thread_id"]));
        assert!((coverage - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_topic_coverage_case_insensitive() {
        assert_eq!(topic_coverage("memorysaver", &topics(&["MemorySaver"])), 1.0);
    }

    #[test]
    fn test_topic_coverage_no_topics_is_full() {
        assert_eq!(topic_coverage("anything", &[]), 1.0);
    }

    #[test]
    fn test_extract_code_blocks() {
        let text = "Intro\n```python\nx = 1\ny = 2\n```\nand\n```\nplain\n```\n";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "x = 1\ny = 2");
        assert_eq!(blocks[1], "plain");
    }

    #[test]
    fn test_has_code_block_rejects_unterminated() {
        assert!(!has_code_block("```python\nx = 1\n"));
        assert!(!has_code_block("no code at all"));
        assert!(!has_code_block("```\n\n```"));
        assert!(has_code_block("```rust\nlet x = 1;\n```"));
    }

    #[test]
    fn test_snippet_presence_exact_match() {
        let answer = "Call MemorySaver() and pass thread_id in the config.";
        let full = snippet_presence(answer, &topics(&["MemorySaver()", "thread_id"]));
        assert_eq!(full, 1.0);

        // Snippets are case-sensitive, unlike topics.
        let partial = snippet_presence(answer, &topics(&["memorysaver()", "thread_id"]));
        assert!((partial - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_question_score_weights_components() {
        let with_code = "checkpointer\n```python\nsaver = MemorySaver()\n```";
        let without_code = "checkpointer only";
        let t = topics(&["checkpointer"]);

        // Coverage only.
        assert_eq!(question_score(without_code, &t, &[], false), 1.0);

        // Coverage + code: 0.5/0.7 when the code block is missing.
        assert_eq!(question_score(with_code, &t, &[], true), 1.0);
        assert!((question_score(without_code, &t, &[], true) - 0.5 / 0.7).abs() < 1e-6);

        // All three components hit.
        let snippets = topics(&["MemorySaver()"]);
        assert_eq!(question_score(with_code, &t, &snippets, true), 1.0);
    }
}
