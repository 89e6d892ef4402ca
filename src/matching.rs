//! Filter matching for free-text course-plan filters.
//!
//! A filter typed by a user rarely equals the spreadsheet cell verbatim:
//! faculty and department names carry language suffixes in parentheses,
//! get abbreviated (`Bil. Müh.`) or are written as acronyms (`İTÜ`). The
//! matcher tries a fixed list of strategies, cheapest first, and reports
//! which one succeeded.

use crate::collation::fold;
use std::collections::HashSet;

/// The strategy that accepted a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The filter was blank.
    Any,
    Exact,
    Substring,
    WordSubset,
    ParentheticalPrefix,
    AbbreviationPrefix,
}

/// A folded filter value ready to be tested against many cells.
#[derive(Debug, Clone)]
pub struct Matcher {
    folded: String,
    words: Vec<String>,
    base: String,
}

impl Matcher {
    pub fn new(filter: &str) -> Self {
        let folded = fold(filter);
        let words = words(&folded);
        let base = parenthetical_base(&folded).to_string();
        Matcher {
            folded,
            words,
            base,
        }
    }

    /// True when the filter places no constraint.
    pub fn is_blank(&self) -> bool {
        self.folded.is_empty()
    }

    /// Tests `value` against the filter and returns the first strategy that accepts it.
    ///
    /// # Examples
    /// ```
    /// use tercih::matching::{MatchKind, Matcher};
    ///
    /// let matcher = Matcher::new("Bil. Müh.");
    /// assert_eq!(
    ///     matcher.matches("Bilgisayar Mühendisliği"),
    ///     Some(MatchKind::AbbreviationPrefix)
    /// );
    /// ```
    pub fn matches(&self, value: &str) -> Option<MatchKind> {
        if self.is_blank() {
            return Some(MatchKind::Any);
        }
        let value = fold(value);
        if value.is_empty() {
            return None;
        }

        if value == self.folded {
            return Some(MatchKind::Exact);
        }
        if value.contains(&self.folded) {
            return Some(MatchKind::Substring);
        }

        let value_words = words(&value);
        if !self.words.is_empty() {
            let present: HashSet<&str> = value_words.iter().map(String::as_str).collect();
            if self.words.iter().all(|w| present.contains(w.as_str())) {
                return Some(MatchKind::WordSubset);
            }
        }

        let value_base = parenthetical_base(&value);
        if !self.base.is_empty() && value_base.starts_with(&self.base) {
            return Some(MatchKind::ParentheticalPrefix);
        }

        if self.abbreviates(&words(value_base)) {
            return Some(MatchKind::AbbreviationPrefix);
        }

        None
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.matches(value).is_some()
    }

    fn abbreviates(&self, value_words: &[String]) -> bool {
        match self.words.as_slice() {
            [] => false,
            [single] => {
                single.chars().count() >= 2
                    && single.chars().all(char::is_alphabetic)
                    && value_words.len() >= 2
                    && value_words
                        .iter()
                        .filter_map(|w| w.chars().next())
                        .eq(single.chars())
            }
            tokens => {
                tokens.len() <= value_words.len()
                    && tokens
                        .iter()
                        .zip(value_words)
                        .all(|(token, word)| word.starts_with(token.as_str()))
            }
        }
    }
}

fn words(folded: &str) -> Vec<String> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn parenthetical_base(folded: &str) -> &str {
    match folded.find('(') {
        Some(idx) => folded[..idx].trim(),
        None => folded.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filter_matches_everything() {
        let matcher = Matcher::new("   ");
        assert!(matcher.is_blank());
        assert_eq!(matcher.matches(""), Some(MatchKind::Any));
        assert_eq!(matcher.matches("Tıp Fakültesi"), Some(MatchKind::Any));
    }

    #[test]
    fn blank_value_never_matches_a_filter() {
        assert_eq!(Matcher::new("tıp").matches("  "), None);
    }

    #[test]
    fn exact_match_ignores_case_and_accents() {
        let matcher = Matcher::new("TIP FAKÜLTESİ");
        assert_eq!(matcher.matches("Tıp Fakültesi"), Some(MatchKind::Exact));
    }

    #[test]
    fn substring_match() {
        let matcher = Matcher::new("mühendislik");
        assert_eq!(
            matcher.matches("Mühendislik ve Doğa Bilimleri Fakültesi"),
            Some(MatchKind::Substring)
        );
    }

    #[test]
    fn word_subset_match_is_order_insensitive() {
        let matcher = Matcher::new("fakültesi mühendislik");
        assert_eq!(
            matcher.matches("Mühendislik Fakültesi"),
            Some(MatchKind::WordSubset)
        );
    }

    #[test]
    fn parenthetical_suffix_is_ignored() {
        let matcher = Matcher::new("Bilgisayar Mühendisliği (İngilizce)");
        assert_eq!(
            matcher.matches("Bilgisayar Mühendisliği (İÖ)"),
            Some(MatchKind::ParentheticalPrefix)
        );
        assert_eq!(
            matcher.matches("Bilgisayar Mühendisliği"),
            Some(MatchKind::ParentheticalPrefix)
        );
        assert_eq!(matcher.matches("Elektrik Mühendisliği (İngilizce)"), None);
    }

    #[test]
    fn dotted_abbreviation_matches_word_prefixes() {
        let matcher = Matcher::new("Bil.Müh.");
        assert_eq!(
            matcher.matches("Bilgisayar Mühendisliği"),
            Some(MatchKind::AbbreviationPrefix)
        );
        assert_eq!(matcher.matches("Biyoloji Mühendisliği"), None);
    }

    #[test]
    fn acronym_ignores_parenthetical_suffix() {
        let matcher = Matcher::new("İTÜ");
        assert_eq!(
            matcher.matches("İstanbul Teknik Üniversitesi (İngilizce)"),
            Some(MatchKind::AbbreviationPrefix)
        );
        assert_eq!(
            Matcher::new("Bil. Müh.").matches("Bilgisayar Mühendisliği (İÖ)"),
            Some(MatchKind::AbbreviationPrefix)
        );
    }

    #[test]
    fn acronym_matches_word_initials() {
        let matcher = Matcher::new("İTÜ");
        assert_eq!(
            matcher.matches("İstanbul Teknik Üniversitesi"),
            Some(MatchKind::AbbreviationPrefix)
        );
        assert_eq!(matcher.matches("İstanbul Üniversitesi"), None);
    }

    #[test]
    fn unrelated_values_do_not_match() {
        let matcher = Matcher::new("hukuk");
        assert!(!matcher.is_match("Tıp Fakültesi"));
        assert!(!matcher.is_match("Hu"));
    }
}
