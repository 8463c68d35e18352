use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The rule that decided a comment's fate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Verdict {
    StylizedCharacters,
    NormalizationMismatch { similarity: f64 },
    BlockedWord { word: String },
    Duplicate,
    DecoratedText,
    ShortEmojiReaction,
    Pictographic,
    NonLatinScript,
    Clean,
}

impl Verdict {
    pub fn is_spam(&self) -> bool {
        matches!(
            self,
            Verdict::StylizedCharacters
                | Verdict::NormalizationMismatch { .. }
                | Verdict::BlockedWord { .. }
                | Verdict::Duplicate
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::StylizedCharacters => f.write_str("stylized unicode characters"),
            Verdict::NormalizationMismatch { similarity } => {
                write!(f, "normalization similarity {similarity:.2}")
            }
            Verdict::BlockedWord { word } => write!(f, "blocked word \"{word}\""),
            Verdict::Duplicate => f.write_str("duplicate text"),
            Verdict::DecoratedText => f.write_str("text with emoji"),
            Verdict::ShortEmojiReaction => f.write_str("short emoji reaction"),
            Verdict::Pictographic => f.write_str("pictographic"),
            Verdict::NonLatinScript => f.write_str("non-latin script"),
            Verdict::Clean => f.write_str("clean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub comment_id: String,
    pub verdict: Verdict,
}

impl ClassificationResult {
    pub fn is_spam(&self) -> bool {
        self.verdict.is_spam()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanFailure {
    ListVideos { message: String },
    FetchComments { video_id: String, message: String },
    RemoveBatch { ids: Vec<String>, message: String },
}

/// Aggregate for a single scan pass. Logged once the pass finishes.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub videos_checked: usize,
    pub comments_checked: usize,
    pub spam_found: usize,
    pub spam_removed: usize,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            videos_checked: 0,
            comments_checked: 0,
            spam_found: 0,
            spam_removed: 0,
            failures: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failed_removals(&self) -> usize {
        self.failures
            .iter()
            .map(|failure| match failure {
                ScanFailure::RemoveBatch { ids, .. } => ids.len(),
                _ => 0,
            })
            .sum()
    }
}
