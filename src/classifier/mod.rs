pub mod duplicate;
pub mod normalize;
pub mod rules;
pub mod unicode;
pub mod words;

pub use duplicate::DuplicateTracker;
pub use rules::SpamClassifier;
pub use words::{BlockedWordList, WordListError, WordListLoader};

use crate::domain::{ClassificationResult, Comment, Verdict};

/// Classifies one fetched page. Repeated text within the page is spam even
/// when the rules alone would let it through.
pub fn classify_page(classifier: &SpamClassifier, comments: &[Comment]) -> Vec<ClassificationResult> {
    let mut tracker = DuplicateTracker::new();
    comments
        .iter()
        .map(|comment| {
            let repeated = tracker.observe(&comment.text);
            let verdict = match classifier.classify(&comment.text) {
                verdict if verdict.is_spam() => verdict,
                _ if repeated => Verdict::Duplicate,
                verdict => verdict,
            };
            ClassificationResult {
                comment_id: comment.id.clone(),
                verdict,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn comment(id: &str, text: &str) -> Comment {
        Comment {
            id: id.to_string(),
            text: text.to_string(),
            video_id: "vid".to_string(),
            author: None,
        }
    }

    #[test]
    fn second_identical_comment_is_spam() {
        let classifier = SpamClassifier::new(Arc::new(BlockedWordList::new(["judi"]).unwrap()));
        let page = vec![
            comment("a", "Ayo gabung sekarang"),
            comment("b", "Nice video"),
            comment("c", " Ayo gabung sekarang "),
            comment("d", "main judi yuk"),
            comment("e", "main judi yuk"),
        ];

        let results = classify_page(&classifier, &page);
        let verdicts: Vec<_> = results.iter().map(|r| r.verdict.clone()).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::Clean,
                Verdict::Clean,
                Verdict::Duplicate,
                Verdict::BlockedWord { word: "judi".into() },
                Verdict::BlockedWord { word: "judi".into() },
            ]
        );
        assert_eq!(results[2].comment_id, "c");
    }
}
