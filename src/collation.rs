use lazy_static::lazy_static;
use std::cmp::Ordering;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Turkish alphabet with q, w and x slotted into their Latin positions.
const ALPHABET: &str = "a b c ç d e f g ğ h ı i j k l m n o ö p q r s ş t u ü v w x y z";

lazy_static! {
    static ref ALPHABET_ORDER: HashMap<char, u32> = {
        let mut order: HashMap<char, u32> = ALPHABET
            .split_whitespace()
            .filter_map(|letter| letter.chars().next())
            .enumerate()
            .map(|(idx, c)| (c, idx as u32))
            .collect();
        // circumflexed vowels rank as their plain forms
        for (accented, plain) in [('â', 'a'), ('î', 'i'), ('û', 'u')] {
            if let Some(&rank) = order.get(&plain) {
                order.insert(accented, rank);
            }
        }
        order
    };
}

/// One element of a collation key: `(class, rank)`.
///
/// Classes order whitespace before other non-letters, those before the
/// alphabet, and the alphabet before letters it does not list.
pub type KeyElement = (u8, u32);

/// Lowercases text using Turkish casing rules (`I → ı`, `İ → i`).
pub fn turkish_lowercase(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}

/// Builds the collation key of `s` under the Turkish alphabet.
///
/// # Examples
/// ```
/// use tercih::collation::turkish_key;
///
/// assert!(turkish_key("Çanakkale") > turkish_key("Cumhuriyet"));
/// assert!(turkish_key("Iğdır") < turkish_key("İstanbul"));
/// ```
pub fn turkish_key(s: &str) -> Vec<KeyElement> {
    turkish_lowercase(s)
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                (0, 0)
            } else if let Some(&rank) = ALPHABET_ORDER.get(&c) {
                (2, rank)
            } else if c.is_alphabetic() {
                (3, c as u32)
            } else {
                (1, c as u32)
            }
        })
        .collect()
}

/// Compares two strings in Turkish alphabetical order.
pub fn compare(a: &str, b: &str) -> Ordering {
    turkish_key(a).cmp(&turkish_key(b)).then_with(|| a.cmp(b))
}

/// Sorts strings in place in Turkish alphabetical order.
pub fn sort_strings(values: &mut [String]) {
    values.sort_by_cached_key(|v| (turkish_key(v), v.clone()));
}

/// Folds text for accent- and case-insensitive comparison.
///
/// Lowercases, strips combining marks after NFKD decomposition, maps the
/// dotless `ı` onto `i` and collapses whitespace.
pub fn fold(s: &str) -> String {
    let stripped: String = s
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
