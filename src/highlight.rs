use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use ratatui::style::Style;
use ratatui::text::Span;

/// Case-insensitive alternation of the filter words, longest first so
/// overlapping words highlight the widest match.
pub fn build_highlight_regex(filter: &str) -> Option<Regex> {
    let mut unique = Vec::new();
    let mut seen = HashSet::new();
    for word in filter.split_whitespace() {
        if seen.insert(word.to_lowercase()) {
            unique.push(word);
        }
    }
    if unique.is_empty() {
        return None;
    }
    unique.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = unique
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Splits `text` into spans, styling every regex match with `highlight`.
pub fn highlight_spans(
    text: &str,
    regex: Option<&Regex>,
    highlight: Style,
    base: Style,
) -> Vec<Span<'static>> {
    let Some(re) = regex else {
        return vec![Span::styled(text.to_string(), base)];
    };
    let mut spans = Vec::new();
    let mut last = 0;
    for mat in re.find_iter(text) {
        if mat.start() > last {
            spans.push(Span::styled(text[last..mat.start()].to_string(), base));
        }
        spans.push(Span::styled(mat.as_str().to_string(), highlight));
        last = mat.end();
    }
    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), base));
    }
    spans
}
