use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::unicode::{is_stripped_mark, DISALLOWED};

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Input with markup tags replaced by a space.
    pub clean: String,
    /// `clean` decomposed, stripped of marks and non-whitelisted characters.
    pub normalized: String,
}

pub fn normalize(text: &str) -> NormalizedText {
    let clean = strip_tags(text);

    let decomposed: String = clean.nfkd().filter(|ch| !is_stripped_mark(*ch)).collect();
    let whitelisted = DISALLOWED.replace_all(&decomposed, "");
    let normalized = WHITESPACE_REGEX
        .replace_all(&whitelisted, " ")
        .trim()
        .to_string();

    NormalizedText { clean, normalized }
}

pub fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_tags_with_space() {
        let out = normalize("hello<br>world <a href=\"x\">link</a>");
        assert_eq!(out.clean, "hello world  link ");
        assert_eq!(out.normalized, "hello world link");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Café déjà vu").normalized, "Cafe deja vu");
        assert_eq!(normalize("j\u{0336}u\u{0336}d\u{0336}i\u{0336}").normalized, "judi");
    }

    #[test]
    fn drops_symbols_outside_whitelist() {
        assert_eq!(normalize("win $$$ now ~~ §").normalized, "win now");
        assert_eq!(
            normalize("(ok) 'yes' \"no\" a-b, c. d! e? f; g: @h #i & j").normalized,
            "(ok) 'yes' \"no\" a-b, c. d! e? f; g: @h #i & j"
        );
    }

    #[test]
    fn ascii_emoji_members_only_survive_as_digits_or_hash() {
        assert_eq!(normalize("j*u*d*i o*n*l*i*n*e").normalized, "judi online");
        assert_eq!(normalize("#1 ***").normalized, "#1");
        assert_eq!(normalize("1\u{FE0F}\u{20E3}").normalized, "1\u{FE0F}\u{20E3}");
    }

    #[test]
    fn keeps_emoji_and_collapses_whitespace() {
        assert_eq!(normalize("  mantap \n\t 😀👍  ").normalized, "mantap 😀👍");
        assert_eq!(normalize("❤\u{FE0F}").normalized, "❤\u{FE0F}");
    }

    #[test]
    fn compatibility_forms_fold_to_ascii() {
        assert_eq!(normalize("ｊｕｄｉ").normalized, "judi");
        assert_eq!(normalize("\u{1D409}\u{1D414}").normalized, "JU");
    }
}
