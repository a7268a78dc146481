//! Mixed Cyrillic/Latin token normalization.
//!
//! Customs descriptions are often typed with Latin look-alikes inside Russian
//! words ("ТРУБОПРОВОДНAЯ") or the reverse. Each mixed token is rewritten into
//! its majority script so lexicon lookups see a single alphabet.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Visually confusable pairs, Latin first.
const CONFUSABLES: &[(char, char)] = &[
    ('A', 'А'),
    ('a', 'а'),
    ('B', 'В'),
    ('E', 'Е'),
    ('e', 'е'),
    ('K', 'К'),
    ('k', 'к'),
    ('M', 'М'),
    ('m', 'м'),
    ('H', 'Н'),
    ('h', 'н'),
    ('O', 'О'),
    ('o', 'о'),
    ('P', 'Р'),
    ('p', 'р'),
    ('C', 'С'),
    ('c', 'с'),
    ('T', 'Т'),
    ('t', 'т'),
    ('X', 'Х'),
    ('x', 'х'),
    ('Y', 'У'),
    ('y', 'у'),
];

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-Za-zА-Яа-яЁё\-_/.]+").expect("valid token regex"));

/// Tokens that are domain codes rather than words.
static LEAVE_ALONE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"[A-Za-z]{2,}\d+",  // DN50, PN16, G3/4
        r"[A-Z]{3,}",        // FANUC, CNC, SIEMENS
        r"\d+[A-Za-z\-]+",   // LS59-1, 40Cr, 12X18H10T
        r"https?://|www\.", // URLs
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid skip regex"))
    .collect()
});

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{052F}')
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && matches!(c, '\u{00C0}'..='\u{024F}'))
}

fn to_cyrillic(c: char) -> char {
    CONFUSABLES
        .iter()
        .find(|(lat, _)| *lat == c)
        .map(|(_, cyr)| *cyr)
        .unwrap_or(c)
}

fn to_latin(c: char) -> char {
    CONFUSABLES
        .iter()
        .find(|(_, cyr)| *cyr == c)
        .map(|(lat, _)| *lat)
        .unwrap_or(c)
}

fn should_leave_alone(token: &str) -> bool {
    LEAVE_ALONE.iter().any(|re| re.is_match(token))
}

fn normalize_token(token: &str) -> String {
    let latin = token.chars().filter(|c| is_latin(*c)).count();
    let cyrillic = token.chars().filter(|c| is_cyrillic(*c)).count();
    if latin == 0 || cyrillic == 0 || should_leave_alone(token) {
        return token.to_string();
    }

    // A tie goes to Cyrillic.
    if cyrillic >= latin {
        token
            .chars()
            .map(|c| if is_latin(c) { to_cyrillic(c) } else { c })
            .collect()
    } else {
        token
            .chars()
            .map(|c| if is_cyrillic(c) { to_latin(c) } else { c })
            .collect()
    }
}

/// Apply NFKC, then rewrite every mixed-script token into its majority script.
///
/// Idempotent. Pure-script tokens and code-like tokens are returned untouched.
pub fn normalize_script(text: &str) -> String {
    let text: String = text.nfkc().collect();
    TOKEN_RE
        .replace_all(&text, |caps: &regex::Captures| normalize_token(&caps[0]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_letter_inside_russian_word() {
        assert_eq!(normalize_script("ТРУБОПРОВОДНAЯ"), "ТРУБОПРОВОДНАЯ");
        assert_eq!(normalize_script("KРАН шаровой"), "КРАН шаровой");
    }

    #[test]
    fn test_cyrillic_letter_inside_latin_word() {
        // Cyrillic С in front of a Latin word
        assert_eq!(normalize_script("Сisco valve"), "Cisco valve");
    }

    #[test]
    fn test_tie_prefers_cyrillic() {
        assert_eq!(normalize_script("Aб"), "Аб");
    }

    #[test]
    fn test_codes_left_alone() {
        assert_eq!(normalize_script("DN50 PN16"), "DN50 PN16");
        // Cyrillic Е inside an acronym stays put
        assert_eq!(normalize_script("SIEMЕNS"), "SIEMЕNS");
        assert_eq!(normalize_script("ЛС59-1 12X18H10T"), "ЛС59-1 12X18H10T");
    }

    #[test]
    fn test_pure_tokens_and_punctuation_untouched() {
        let text = "Кран шаровой, Ду50; valve body.";
        assert_eq!(normalize_script(text), text);
    }

    #[test]
    fn test_nfkc_applied() {
        // fullwidth digits fold to ASCII
        assert_eq!(normalize_script("ДУ５０"), "ДУ50");
    }

    #[test]
    fn test_idempotent() {
        for text in ["ТРУБОПРОВОДНAЯ арматура", "Сisco", "mixеd wоrds hеre", "Aб"] {
            let once = normalize_script(text);
            assert_eq!(normalize_script(&once), once);
        }
    }
}
