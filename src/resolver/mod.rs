use std::cmp::Ordering;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::contacts::{dedup_by_number, normalize_name, Contact};

static TARGETS_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(?:to\s+)?(.+?)\s*:\s*(.+)$").expect("valid targets pattern")
});
static COMMA_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid comma pattern"));

/// Match quality classes, weakest first so the derived ordering ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    Substring,
    WordPrefix,
    Initials,
    FirstOrLast,
    FullName,
    Alias,
}

/// `(tier, tiebreak)`; the tier always dominates and the tiebreak favors
/// shorter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub tier: MatchTier,
    pub tiebreak: i64,
}

impl Ord for MatchScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then(self.tiebreak.cmp(&other.tiebreak))
    }
}

impl PartialOrd for MatchScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: Vec<Contact>,
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Evaluates a normalized token against one contact.
pub fn match_tier(token: &str, contact: &Contact) -> Option<MatchTier> {
    if token.is_empty() {
        return None;
    }
    if contact.aliases.contains(token) {
        return Some(MatchTier::Alias);
    }
    if token == contact.name_key() {
        return Some(MatchTier::FullName);
    }
    if contact.first_word() == Some(token) || contact.last_word() == Some(token) {
        return Some(MatchTier::FirstOrLast);
    }
    if token.chars().count() <= 3 && token == contact.initials() {
        return Some(MatchTier::Initials);
    }
    if contact.name_words().any(|word| word.starts_with(token)) {
        return Some(MatchTier::WordPrefix);
    }
    if contact.name_key().contains(token) {
        return Some(MatchTier::Substring);
    }
    None
}

pub fn match_score(token: &str, contact: &Contact) -> Option<MatchScore> {
    match_tier(token, contact).map(|tier| MatchScore {
        tier,
        tiebreak: -(contact.name.chars().count() as i64),
    })
}

/// Resolves user tokens to contacts. `all` short-circuits to the whole roster.
/// Otherwise every token picks the first contact with the highest tier; the
/// output is deduplicated by number and unmatched tokens are kept in order.
pub fn resolve(tokens: &[String], contacts: &[Contact]) -> Resolution {
    if tokens.iter().any(|token| token.eq_ignore_ascii_case("all")) {
        return Resolution {
            resolved: dedup_by_number(contacts.iter().cloned()),
            missing: Vec::new(),
        };
    }

    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();
    for token in tokens {
        let normalized = normalize_name(token);
        let mut best: Option<(MatchTier, &Contact)> = None;
        for contact in contacts {
            let Some(tier) = match_tier(&normalized, contact) else {
                continue;
            };
            if best.map(|(current, _)| tier > current).unwrap_or(true) {
                best = Some((tier, contact));
            }
        }
        match best {
            Some((tier, contact)) => {
                tracing::trace!(%token, name = %contact.name, ?tier, "token resolved");
                if seen.insert(contact.number.clone()) {
                    resolution.resolved.push(contact.clone());
                }
            }
            None => resolution.missing.push(token.clone()),
        }
    }
    resolution
}

/// Phone numbers and `@` addresses are messaged as typed instead of matched.
pub fn is_raw_handle(token: &str) -> bool {
    token.contains('@') || token.chars().any(|ch| ch.is_ascii_digit())
}

/// Like [`resolve`], but raw handles go straight through ahead of the name
/// matches. A handle equal to a roster number picks up that contact.
pub fn resolve_with_handles(tokens: &[String], contacts: &[Contact]) -> Resolution {
    let (handles, names): (Vec<String>, Vec<String>) =
        tokens.iter().cloned().partition(|token| is_raw_handle(token));
    let by_name = resolve(&names, contacts);
    let direct = handles.iter().map(|raw| {
        let handle = Contact::from_handle(raw);
        contacts
            .iter()
            .find(|contact| contact.number == handle.number)
            .cloned()
            .unwrap_or(handle)
    });
    Resolution {
        resolved: dedup_by_number(direct.chain(by_name.resolved)),
        missing: by_name.missing,
    }
}

/// Every contact matching `token`, strongest first.
pub fn rank_matches<'a>(token: &str, contacts: &'a [Contact]) -> Vec<(MatchScore, &'a Contact)> {
    let normalized = normalize_name(token);
    let mut ranked: Vec<_> = contacts
        .iter()
        .filter_map(|contact| match_score(&normalized, contact).map(|score| (score, contact)))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
}

/// Splits raw recipient text on commas, then into shell-style words so that
/// quoted names stay together.
pub fn tokenize_names(raw: &str) -> Vec<String> {
    COMMA_SPLIT
        .split(raw.trim())
        .filter(|chunk| !chunk.is_empty())
        .flat_map(shell_words)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parses `[to] NAMES : MESSAGE`.
pub fn parse_targets_message(raw: &str) -> Option<(Vec<String>, String)> {
    let caps = TARGETS_MESSAGE.captures(raw.trim())?;
    let names = caps.get(1)?.as_str().trim();
    let message = caps.get(2)?.as_str().trim();
    if message.is_empty() {
        return None;
    }
    Some((tokenize_names(names), message.to_string()))
}

/// Shell-style words; unbalanced quotes fall back to plain whitespace splitting.
fn shell_words(chunk: &str) -> Vec<String> {
    shlex::split(chunk)
        .unwrap_or_else(|| chunk.split_whitespace().map(str::to_string).collect())
}
