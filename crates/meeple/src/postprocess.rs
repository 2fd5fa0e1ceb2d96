//! Output cleanup applied after generation.
//!
//! Recommendations are cut at the completion sentinel and checked against
//! the labels that were actually retrieved. Rule answers and summaries are
//! only trimmed.

use std::sync::LazyLock;

use regex::Regex;

pub use crate::prompt::templates::RECOMMENDATION_SENTINEL;

static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]\s+|\d+[.)]\s+)").expect("list marker pattern is valid"));

/// Drop everything from the first sentinel on, then trim.
pub fn finish_recommendation(raw: &str) -> String {
    let head = raw
        .split_once(RECOMMENDATION_SENTINEL)
        .map_or(raw, |(head, _)| head);
    head.trim().to_string()
}

pub fn finish_answer(raw: &str) -> String {
    raw.trim().to_string()
}

/// The game name of a `"<name>: <reason>"` line, if the line has that shape.
///
/// Tolerates list markers, bold markup, and bracketed names, since models
/// add them despite instructions.
pub fn recommendation_name(line: &str) -> Option<&str> {
    let line = line.trim();
    let line = LIST_MARKER_RE
        .find(line)
        .map_or(line, |m| line.get(m.end()..).unwrap_or(line));
    let (name, _) = line.split_once(':').or_else(|| line.split_once('：'))?;
    let name = name.trim().trim_matches('*').trim();
    let name = name
        .strip_prefix('[')
        .and_then(|n| n.strip_suffix(']'))
        .unwrap_or(name)
        .trim();
    (!name.is_empty()).then_some(name)
}

/// Names in `output` that are not among `labels`, in line order.
pub fn ungrounded_lines(output: &str, labels: &[String]) -> Vec<String> {
    output
        .lines()
        .filter_map(recommendation_name)
        .filter(|name| !labels.iter().any(|l| l == name))
        .map(str::to_string)
        .collect()
}

/// Remove recommendation lines that name games outside `labels`. Lines
/// without a `name:` shape are kept.
pub fn retain_grounded(output: &str, labels: &[String]) -> String {
    output
        .lines()
        .filter(|line| match recommendation_name(line) {
            Some(name) => labels.iter().any(|l| l == name),
            None => true,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sentinel_truncates_and_trims() {
        let raw = "A: x\nB: y\n추천 완료!\nextra";
        assert_eq!(finish_recommendation(raw), "A: x\nB: y");
    }

    #[test]
    fn first_sentinel_wins() {
        let raw = "  A: x 추천 완료! B: y 추천 완료! C";
        assert_eq!(finish_recommendation(raw), "A: x");
    }

    #[test]
    fn missing_sentinel_only_trims() {
        assert_eq!(finish_recommendation("\n카탄: 교역\n"), "카탄: 교역");
        assert_eq!(finish_answer("  답변 \n"), "답변");
    }

    #[test]
    fn name_extraction_handles_markup() {
        assert_eq!(recommendation_name("카탄: 교역이 재밌다"), Some("카탄"));
        assert_eq!(recommendation_name("1. 스플렌더: 가볍다"), Some("스플렌더"));
        assert_eq!(recommendation_name("- **[아줄]**: 예쁘다"), Some("아줄"));
        assert_eq!(recommendation_name("7 원더스: 문명"), Some("7 원더스"));
        assert_eq!(recommendation_name("킹 오브 도쿄： 주사위"), Some("킹 오브 도쿄"));
        assert_eq!(recommendation_name("좋은 게임들입니다"), None);
        assert_eq!(recommendation_name(": 이름 없음"), None);
    }

    #[test]
    fn ungrounded_names_are_reported() {
        let out = "카탄: a\n모노폴리: b\n설명 문장\n뱅: c";
        assert_eq!(
            ungrounded_lines(out, &labels(&["카탄", "뱅"])),
            vec!["모노폴리".to_string()]
        );
        assert!(ungrounded_lines("카탄: a", &labels(&["카탄"])).is_empty());
    }

    #[test]
    fn retain_grounded_drops_only_invented_lines() {
        let out = "카탄: a\n모노폴리: b\n뱅: c";
        assert_eq!(retain_grounded(out, &labels(&["카탄", "뱅"])), "카탄: a\n뱅: c");
    }
}
