use std::collections::HashSet;

/// Remembers comment texts seen within one fetched page.
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashSet<String>,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `text` and reports whether identical trimmed text was seen before.
    pub fn observe(&mut self, text: &str) -> bool {
        let key = text.trim();
        if key.is_empty() {
            return false;
        }
        !self.seen.insert(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_second_and_later_occurrences() {
        let mut tracker = DuplicateTracker::new();
        assert!(!tracker.observe("mantap bang"));
        assert!(tracker.observe("  mantap bang\n"));
        assert!(tracker.observe("mantap bang"));
        assert!(!tracker.observe("Mantap bang"));
    }

    #[test]
    fn ignores_empty_text() {
        let mut tracker = DuplicateTracker::new();
        assert!(!tracker.observe("   "));
        assert!(!tracker.observe(""));
    }
}
