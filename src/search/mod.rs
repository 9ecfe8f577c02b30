use std::cmp::Ordering;

/// Scores `query` against `haystack`. `None` means at least one query word is
/// not an ordered subsequence of the haystack (case-insensitive).
///
/// Each matched character is worth 1, plus 2 when it continues the previous
/// match, plus 2 when its run began at position 0. A word that also occurs as
/// a contiguous substring earns a flat `4 + len(word)`. Multi-word queries sum
/// their per-word scores.
pub fn fuzzy_score(query: &str, haystack: &str) -> Option<i64> {
    let hay: Vec<char> = haystack.chars().flat_map(char::to_lowercase).collect();
    let mut total = 0;
    for word in query.split_whitespace() {
        total += word_score(word, &hay)?;
    }
    Some(total)
}

fn word_score(word: &str, hay: &[char]) -> Option<i64> {
    let needle: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return Some(0);
    }

    let mut score = 0i64;
    let mut cursor = 0usize;
    let mut prev: Option<usize> = None;
    let mut run_start = 0usize;
    for &ch in &needle {
        let offset = hay[cursor..].iter().position(|&candidate| candidate == ch)?;
        let pos = cursor + offset;
        score += 1;
        let contiguous = prev.map(|p| p + 1 == pos).unwrap_or(false);
        if contiguous {
            score += 2;
        } else {
            run_start = pos;
        }
        if run_start == 0 {
            score += 2;
        }
        prev = Some(pos);
        cursor = pos + 1;
    }

    if contains_run(hay, &needle) {
        score += 4 + needle.len() as i64;
    }
    Some(score)
}

fn contains_run(hay: &[char], needle: &[char]) -> bool {
    needle.len() <= hay.len() && hay.windows(needle.len()).any(|window| window == needle)
}

/// Orders candidate indices for display. An empty filter keeps every
/// candidate in case-insensitive alphabetical order; otherwise non-matches
/// are dropped and the rest sorted by descending score, then by label.
pub fn rank<T, L, H>(items: &[T], filter: &str, label: L, haystack: H) -> Vec<usize>
where
    L: Fn(&T) -> String,
    H: Fn(&T) -> String,
{
    if filter.trim().is_empty() {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by_key(|&idx| label(&items[idx]).to_lowercase());
        return order;
    }

    let mut scored: Vec<(i64, String, usize)> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            fuzzy_score(filter, &haystack(item)).map(|score| (score, label(item).to_lowercase(), idx))
        })
        .collect();
    scored.sort_by(|a, b| match b.0.cmp(&a.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        other => other,
    });
    scored.into_iter().map(|(_, _, idx)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str], filter: &str) -> Vec<String> {
        rank(items, filter, |s| s.to_string(), |s| s.to_string())
            .into_iter()
            .map(|idx| items[idx].to_string())
            .collect()
    }

    #[test]
    fn a_string_matches_itself() {
        for query in ["a", "Ann", "Bay Michaels", "x y z"] {
            assert!(fuzzy_score(query, query).is_some(), "{query}");
        }
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(fuzzy_score("", "anything"), Some(0));
        assert_eq!(fuzzy_score("   ", ""), Some(0));
    }

    #[test]
    fn non_subsequence_is_rejected() {
        assert_eq!(fuzzy_score("xa", "ax"), None);
        assert_eq!(fuzzy_score("zz", "z"), None);
        assert_eq!(fuzzy_score("ann zed", "Ann Lee"), None);
    }

    #[test]
    fn scoring_follows_formula() {
        // a:1+2 (run at 0), n:1+2+2 -> 8, substring bonus 4+2 -> 14
        assert_eq!(fuzzy_score("an", "Anthony"), Some(14));
        // scattered match, no run at zero, no substring
        assert_eq!(fuzzy_score("ay", "Bay Michaels"), Some(1 + 1 + 2 + 4 + 2));
        assert_eq!(fuzzy_score("bm", "Bay Michaels"), Some(1 + 2 + 1));
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(fuzzy_score("ANN", "ann"), fuzzy_score("ann", "ann"));
    }

    #[test]
    fn multi_word_scores_sum() {
        let both = fuzzy_score("bay mich", "Bay Michaels").expect("match");
        let first = fuzzy_score("bay", "Bay Michaels").expect("match");
        let second = fuzzy_score("mich", "Bay Michaels").expect("match");
        assert_eq!(both, first + second);
    }

    #[test]
    fn equal_scores_fall_back_to_name_order() {
        assert_eq!(names(&["Anthony", "Anna", "Ann"], "an"), vec!["Ann", "Anna", "Anthony"]);
    }

    #[test]
    fn empty_filter_is_alphabetical() {
        assert_eq!(names(&["carl", "Bea", "adam"], ""), vec!["adam", "Bea", "carl"]);
    }

    #[test]
    fn higher_scores_rank_first_and_misses_drop() {
        assert_eq!(names(&["Xenia Ray", "Raymond", "Bob"], "ray"), vec!["Raymond", "Xenia Ray"]);
    }
}
