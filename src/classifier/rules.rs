use std::sync::Arc;

use crate::domain::Verdict;

use super::{
    normalize::normalize,
    unicode::{is_excluded_script, is_stylized, EMOJI, EMOJI_PRESENTATION, EXTENDED_PICTOGRAPHIC},
    words::BlockedWordList,
};

/// Below this share of surviving characters the text counts as obfuscated.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;
/// Longest raw text still treated as an emoji reaction.
pub const SHORT_REACTION_MAX_CHARS: usize = 15;
/// Normalized text must be longer than this for emoji to count as decoration.
pub const DECORATED_MIN_CHARS: usize = 5;

/// Rule-based judol detector. The rules are evaluated in order and the first
/// one that applies decides the verdict.
#[derive(Debug, Clone)]
pub struct SpamClassifier {
    words: Arc<BlockedWordList>,
}

impl SpamClassifier {
    pub fn new(words: Arc<BlockedWordList>) -> Self {
        Self { words }
    }

    pub fn is_spam(&self, text: &str) -> bool {
        self.classify(text).is_spam()
    }

    pub fn classify(&self, text: &str) -> Verdict {
        let normalized = normalize(text);
        let text_length = normalized.clean.chars().count();
        let norm_length = normalized.normalized.chars().count();
        let similarity = norm_length as f64 / text_length.max(1) as f64;

        if normalized.clean.chars().any(is_stylized) {
            return Verdict::StylizedCharacters;
        }
        if similarity < SIMILARITY_THRESHOLD {
            return Verdict::NormalizationMismatch { similarity };
        }

        if EMOJI_PRESENTATION.is_match(text) && norm_length > DECORATED_MIN_CHARS {
            return Verdict::DecoratedText;
        }
        if EMOJI.is_match(text) && text.chars().count() <= SHORT_REACTION_MAX_CHARS {
            return Verdict::ShortEmojiReaction;
        }
        if EXTENDED_PICTOGRAPHIC.is_match(text) {
            return Verdict::Pictographic;
        }
        // The word list is Latin-only, so any CJK/Arabic/Thai character opts
        // the whole comment out of word matching.
        if text.chars().any(is_excluded_script) {
            return Verdict::NonLatinScript;
        }

        let lowered = normalized.normalized.to_lowercase();
        match self.words.find(&lowered) {
            Some(word) => Verdict::BlockedWord {
                word: word.to_string(),
            },
            None => Verdict::Clean,
        }
    }
}
