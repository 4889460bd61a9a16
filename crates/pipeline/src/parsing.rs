//! Text clean-up and list extraction for generated stage output.

use crate::StagePayload;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Default result parser for every analysis stage.
///
/// Removes `<think>…</think>` reasoning blocks, trims the remainder and
/// collects list items as highlights. Fails when nothing usable is left.
pub fn parse_findings(raw: &str) -> Result<StagePayload, String> {
    let cleaned = strip_reasoning(raw)?;
    let text = cleaned.trim();
    if text.is_empty() {
        return Err("generated text is empty after removing reasoning blocks".to_string());
    }
    Ok(StagePayload {
        text: text.to_string(),
        highlights: list_items(text),
    })
}

/// Removes every `<think>…</think>` block. An unclosed block is an error
/// because the visible answer cannot be located.
pub fn strip_reasoning(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find(THINK_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + THINK_OPEN.len()..];
        match after_open.find(THINK_CLOSE) {
            Some(end) => rest = &after_open[end + THINK_CLOSE.len()..],
            None => return Err("reasoning block is not closed".to_string()),
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Extracts bulleted (`-`, `*`, `•`) and numbered (`1.`, `1)`) list items,
/// with markers and surrounding emphasis removed.
pub fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| list_item(line.trim()))
        .map(clean_emphasis)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Returns `true` for markdown headings and horizontal rules.
pub fn is_heading(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('#')
        || (!line.is_empty() && line.chars().all(|c| matches!(c, '-' | '=' | '*' | '_')))
}

/// Removes leading/trailing markdown emphasis (`**`, `__`, `*`, `_`, `` ` ``).
pub fn clean_emphasis(s: &str) -> String {
    s.trim()
        .trim_matches(|c| matches!(c, '*' | '_' | '`'))
        .trim()
        .to_string()
}

fn list_item(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• "] {
        if let Some(item) = line.strip_prefix(marker) {
            return Some(item);
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_reasoning_blocks() {
        let raw = "<think>internal notes</think>\n## Findings\n- Strong video presence";
        let payload = parse_findings(raw).unwrap();
        assert_eq!(payload.text, "## Findings\n- Strong video presence");
        assert_eq!(payload.highlights, vec!["Strong video presence"]);
    }

    #[test]
    fn reasoning_only_output_is_malformed() {
        assert!(parse_findings("<think>only thinking</think>   ").is_err());
        assert!(parse_findings("<think>never closed").is_err());
        assert!(parse_findings("").is_err());
    }

    #[test]
    fn plain_text_has_no_highlights() {
        let payload = parse_findings("competitor_profiling: ok").unwrap();
        assert_eq!(payload.text, "competitor_profiling: ok");
        assert!(payload.highlights.is_empty());
    }

    #[test]
    fn numbered_and_bulleted_items_are_collected() {
        let text = "Intro\n1. **First gap**\n2) Second\n* third\n• fourth\n-not a bullet\n10. tenth";
        assert_eq!(
            list_items(text),
            vec!["First gap", "Second", "third", "fourth", "tenth"]
        );
    }

    #[test]
    fn headings_and_rules_are_detected() {
        assert!(is_heading("## 5. Competitive positioning"));
        assert!(is_heading("---"));
        assert!(!is_heading("Globex wins on video"));
    }
}
