//! Codepoint tables the classifier works from.
//!
//! Block ranges are listed explicitly; Unicode properties that span hundreds of
//! ranges (emoji, letters, numbers) come from the `regex` crate's tables.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inclusive codepoint range.
pub type CodepointRange = (u32, u32);

/// Mathematical Alphanumeric Symbols and Enclosed Alphanumeric Supplement.
pub const STYLIZED: &[CodepointRange] = &[(0x1D400, 0x1D7FF), (0x1F100, 0x1F1FF)];

pub const COMBINING_MARKS: &[CodepointRange] = &[
    (0x0300, 0x036F),
    (0x1AB0, 0x1AFF),
    (0x1DC0, 0x1DFF),
    (0x20D0, 0x20FF),
    (0xFE20, 0xFE2F),
];

/// Combining enclosing keycap, kept because it is part of keycap emoji.
pub const KEYCAP: char = '\u{20E3}';

/// Scripts the blocked-word list does not cover.
pub const EXCLUDED_SCRIPTS: &[CodepointRange] = &[
    // Arabic, Arabic Supplement, Arabic Extended-A
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    // Thai
    (0x0E00, 0x0E7F),
    // Hangul Jamo
    (0x1100, 0x11FF),
    // CJK Radicals through Katakana, Bopomofo, Hangul Compatibility Jamo, CJK Strokes
    (0x2E80, 0x31EF),
    // CJK Unified Ideographs Extension A
    (0x3400, 0x4DBF),
    // CJK Unified Ideographs
    (0x4E00, 0x9FFF),
    // Hangul Syllables
    (0xAC00, 0xD7AF),
    // CJK Compatibility Ideographs
    (0xF900, 0xFAFF),
    // Arabic Presentation Forms-A
    (0xFB50, 0xFDFF),
    // CJK Compatibility Forms
    (0xFE30, 0xFE4F),
    // Arabic Presentation Forms-B
    (0xFE70, 0xFEFF),
    // CJK Unified Ideographs Extension B onward
    (0x20000, 0x3134F),
];

pub static EMOJI_PRESENTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Emoji_Presentation}").expect("valid emoji presentation regex"));

/// `Emoji` without the ASCII members (digits, `#`, `*`).
pub static EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Emoji}--\p{ASCII}]").expect("valid emoji regex"));

pub static EXTENDED_PICTOGRAPHIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{Extended_Pictographic}").expect("valid extended pictographic regex")
});

/// Everything outside letters, numbers, whitespace, the allowed punctuation and
/// non-ASCII emoji. ASCII `*` is an emoji codepoint and must not survive.
pub static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"[^\p{L}\p{N}\s()'"\-,.!?;:@#&[\p{Emoji}--\p{ASCII}][\p{Emoji_Component}--\p{ASCII}]\p{Extended_Pictographic}]"#,
    )
    .expect("valid whitelist regex")
});

pub fn in_ranges(ch: char, ranges: &[CodepointRange]) -> bool {
    let cp = ch as u32;
    ranges.iter().any(|&(start, end)| cp >= start && cp <= end)
}

pub fn is_stylized(ch: char) -> bool {
    in_ranges(ch, STYLIZED)
}

pub fn is_stripped_mark(ch: char) -> bool {
    ch != KEYCAP && in_ranges(ch, COMBINING_MARKS)
}

pub fn is_excluded_script(ch: char) -> bool {
    in_ranges(ch, EXCLUDED_SCRIPTS)
}
