use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::contacts::capitalize;

static NAME_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\[names?\]|\{names?\}")
        .case_insensitive(true)
        .build()
        .expect("valid placeholder pattern")
});
static INDENTED_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]+").expect("valid indentation pattern"));

const LINE_BREAK_SHORTHANDS: [(&str, &str); 7] = [
    ("########", "\n\n"),
    ("####", "\n\n"),
    ("##", "\n"),
    ("||||", "\n\n"),
    ("||", "\n"),
    ("\\\\n", "\n"),
    ("\\n", "\n"),
];

/// Expands line-break shorthands typed on a single line and strips the
/// indentation that follows each resulting break.
pub fn normalize_message(raw: &str) -> String {
    let expanded = LINE_BREAK_SHORTHANDS
        .iter()
        .fold(raw.to_string(), |acc, (from, to)| acc.replace(from, to));
    INDENTED_BREAK.replace_all(&expanded, "\n").into_owned()
}

/// Substitutes the recipient's first name. `[name]`-style placeholders and a
/// standalone `-n` become the lowercase name; a standalone `-N` is capitalized.
pub fn personalize(template: &str, first: &str) -> String {
    let first_lower = first.to_lowercase();
    let replaced = NAME_PLACEHOLDER.replace_all(template, regex::NoExpand(first_lower.as_str()));
    replace_name_flags(&replaced, &first_lower, &capitalize(&first_lower))
}

fn replace_name_flags(text: &str, lower: &str, title: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;
    while idx < chars.len() {
        let standalone = chars[idx] == '-'
            && matches!(chars.get(idx + 1), Some('n' | 'N'))
            && (idx == 0 || chars[idx - 1].is_whitespace())
            && chars
                .get(idx + 2)
                .map(|next| next.is_whitespace() || ".,;:!?".contains(*next))
                .unwrap_or(true);
        if standalone {
            out.push_str(if chars[idx + 1] == 'N' { title } else { lower });
            idx += 2;
        } else {
            out.push(chars[idx]);
            idx += 1;
        }
    }
    out
}
