use std::collections::HashSet;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static ALIAS_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s;/]+").expect("valid alias separator pattern"));

/// A single roster entry. Values are immutable once built; edits produce a
/// fresh roster that is persisted wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    /// Lowercase, accent-stripped first word of `name`.
    pub first: String,
    /// ASCII digits with an optional leading '+', or an `@` handle as typed.
    pub number: String,
    pub aliases: IndexSet<String>,
    name_key: String,
}

impl Contact {
    pub fn new(name: &str, number: &str, aliases_raw: &str) -> Self {
        let name = name.trim().to_string();
        let name_key = normalize_name(&name);
        let first = name_key
            .split(' ')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            first,
            number: normalize_number(number),
            aliases: parse_aliases(aliases_raw),
            name_key,
        }
    }

    /// A recipient given directly as a phone number or `@` handle rather
    /// than a roster name. It has no first name to personalize with.
    pub fn from_handle(raw: &str) -> Self {
        let raw = raw.trim();
        let number = if raw.contains('@') {
            raw.to_lowercase()
        } else {
            normalize_number(raw)
        };
        Self {
            name: raw.to_string(),
            first: String::new(),
            number,
            aliases: IndexSet::new(),
            name_key: String::new(),
        }
    }

    /// Normalized full name used for matching.
    pub fn name_key(&self) -> &str {
        &self.name_key
    }

    pub fn name_words(&self) -> impl Iterator<Item = &str> {
        self.name_key.split(' ').filter(|word| !word.is_empty())
    }

    pub fn first_word(&self) -> Option<&str> {
        self.name_words().next()
    }

    pub fn last_word(&self) -> Option<&str> {
        self.name_words().last()
    }

    pub fn initials(&self) -> String {
        self.name_words()
            .filter_map(|word| word.chars().next())
            .collect()
    }

    pub fn aliases_joined(&self, separator: &str) -> String {
        self.aliases
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// First name with its leading letter uppercased, for `-N` placeholders.
    pub fn first_capitalized(&self) -> String {
        capitalize(&self.first)
    }
}

/// NFKD-folds to ASCII, lowercases, turns `.` and `,` into spaces and
/// collapses runs of whitespace.
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|ch| match ch {
            '.' | ',' => ' ',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_number(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            out.push(ch);
        } else if ch == '+' && out.is_empty() {
            out.push(ch);
        }
    }
    out
}

pub fn parse_aliases(raw: &str) -> IndexSet<String> {
    ALIAS_SPLIT
        .split(raw.trim())
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Keeps the first contact seen for every number.
pub fn dedup_by_number<I>(contacts: I) -> Vec<Contact>
where
    I: IntoIterator<Item = Contact>,
{
    let mut seen = HashSet::new();
    contacts
        .into_iter()
        .filter(|contact| seen.insert(contact.number.clone()))
        .collect()
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(head) => head.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_folds_accents_and_punctuation() {
        assert_eq!(normalize_name("  José  O'Neil, Jr. "), "jose o'neil jr");
        assert_eq!(normalize_name("Zoë"), "zoe");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn normalize_number_keeps_only_leading_plus() {
        assert_eq!(normalize_number("+1 (555) 000-1234"), "+15550001234");
        assert_eq!(normalize_number("555+1"), "5551");
        assert_eq!(normalize_number("tel: +44 20"), "+4420");
    }

    #[test]
    fn aliases_split_on_mixed_separators() {
        let aliases = parse_aliases("Bay, B/bm;  bay");
        assert_eq!(aliases.into_iter().collect::<Vec<_>>(), vec!["bay", "b", "bm"]);
        assert!(parse_aliases("   ").is_empty());
    }

    #[test]
    fn contact_derives_first_name_and_initials() {
        let contact = Contact::new("Jordan Élan Lee", "+1 555 0001", "jel");
        assert_eq!(contact.first, "jordan");
        assert_eq!(contact.initials(), "jel");
        assert_eq!(contact.first_word(), Some("jordan"));
        assert_eq!(contact.last_word(), Some("lee"));
        assert_eq!(contact.number, "+15550001");
        assert_eq!(contact.first_capitalized(), "Jordan");
    }

    #[test]
    fn handles_keep_emails_and_normalize_numbers() {
        let phone = Contact::from_handle(" +1 (555) 012-3 ");
        assert_eq!(phone.name, "+1 (555) 012-3");
        assert_eq!(phone.number, "+15550123");
        assert_eq!(phone.first, "");
        assert_eq!(Contact::from_handle("Ann@Example.com").number, "ann@example.com");
    }

    #[test]
    fn dedup_keeps_first_by_number() {
        let people = vec![
            Contact::new("Ann", "1", ""),
            Contact::new("Anna", "2", ""),
            Contact::new("Ann Again", "1", ""),
        ];
        let names: Vec<_> = dedup_by_number(people)
            .into_iter()
            .map(|contact| contact.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Anna"]);
    }
}
