use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("failed to read blocked word list {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("blocked word list {path} is not a JSON array of strings: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to compile matcher for blocked word {word:?}: {source}")]
    Pattern {
        word: String,
        #[source]
        source: regex::Error,
    },
}

/// Operator-maintained words and phrases, each matched as a whole word.
#[derive(Debug, Default)]
pub struct BlockedWordList {
    entries: Vec<(String, Regex)>,
}

impl BlockedWordList {
    pub fn new<I, S>(words: I) -> Result<Self, WordListError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for word in words {
            let word = word.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            let pattern = format!(r"\b{}\b", regex::escape(&word.to_lowercase()));
            let matcher = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| WordListError::Pattern {
                    word: word.to_string(),
                    source,
                })?;
            entries.push((word.to_string(), matcher));
        }
        Ok(Self { entries })
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, WordListError> {
        let words: Vec<String> =
            serde_json::from_str(raw).map_err(|source| WordListError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::new(words)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry, in list order, that occurs as a whole word in `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, matcher)| matcher.is_match(text))
            .map(|(word, _)| word.as_str())
    }
}

struct CachedList {
    source: String,
    list: Arc<BlockedWordList>,
}

/// Reads the word list file at the start of each run and recompiles it only
/// when its contents changed.
pub struct WordListLoader {
    path: PathBuf,
    cache: Mutex<Option<CachedList>>,
}

impl WordListLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Result<Arc<BlockedWordList>, WordListError> {
        let mut cache = self.cache.lock();

        let loaded = read_source(&self.path).and_then(|raw| {
            if let Some(cached) = cache.as_ref() {
                if cached.source == raw {
                    return Ok(None);
                }
            }
            let list = BlockedWordList::parse(&self.path, &raw)?;
            Ok(Some((raw, list)))
        });

        match loaded {
            Ok(None) => {}
            Ok(Some((source, list))) => {
                tracing::info!(
                    target: "classifier",
                    path = %self.path.display(),
                    words = list.len(),
                    "blocked word list loaded"
                );
                if list.is_empty() {
                    tracing::warn!(
                        target: "classifier",
                        path = %self.path.display(),
                        "blocked word list is empty; only unicode rules will apply"
                    );
                }
                *cache = Some(CachedList {
                    source,
                    list: Arc::new(list),
                });
            }
            Err(err) => match cache.as_ref() {
                Some(_) => {
                    tracing::warn!(
                        target: "classifier",
                        error = %err,
                        "keeping previously loaded blocked word list"
                    );
                }
                None => return Err(err),
            },
        }

        cache
            .as_ref()
            .map(|cached| cached.list.clone())
            .ok_or_else(|| WordListError::Read {
                path: self.path.display().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "word list not loaded"),
            })
    }
}

fn read_source(path: &Path) -> Result<String, WordListError> {
    fs::read_to_string(path).map_err(|source| WordListError::Read {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_list(file: &mut NamedTempFile, body: &str) {
        let handle = file.as_file_mut();
        handle.set_len(0).unwrap();
        std::io::Seek::rewind(handle).unwrap();
        handle.write_all(body.as_bytes()).unwrap();
        handle.flush().unwrap();
    }

    #[test]
    fn matches_whole_words_only() {
        let list = BlockedWordList::new(["judi", "situs gacor"]).unwrap();
        assert_eq!(list.find("main judi online"), Some("judi"));
        assert_eq!(list.find("cek SITUS GACOR hari ini"), Some("situs gacor"));
        assert_eq!(list.find("judicial review"), None);
        assert_eq!(list.find("prejudice"), None);
    }

    #[test]
    fn escapes_metacharacters_and_skips_blank_entries() {
        let list = BlockedWordList::new(["slot88+", "  ", "", "a.b"]).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.find("axb"), None);
        assert_eq!(list.find("visit a.b now"), Some("a.b"));
    }

    #[test]
    fn loader_picks_up_edits() {
        let mut file = NamedTempFile::new().unwrap();
        write_list(&mut file, r#"["judi"]"#);
        let loader = WordListLoader::new(file.path());

        let first = loader.current().unwrap();
        assert_eq!(first.find("judi"), Some("judi"));
        assert!(Arc::ptr_eq(&first, &loader.current().unwrap()));

        write_list(&mut file, r#"["judi", "togel"]"#);
        let second = loader.current().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second.find("pasang togel"), Some("togel"));
    }

    #[test]
    fn loader_keeps_last_good_list_on_bad_edit() {
        let mut file = NamedTempFile::new().unwrap();
        write_list(&mut file, r#"["judi"]"#);
        let loader = WordListLoader::new(file.path());
        loader.current().unwrap();

        write_list(&mut file, "not json");
        let list = loader.current().unwrap();
        assert_eq!(list.find("judi"), Some("judi"));
    }

    #[test]
    fn loader_fails_without_any_list() {
        let dir = tempfile::tempdir().unwrap();
        let loader = WordListLoader::new(dir.path().join("missing.json"));
        assert!(matches!(loader.current(), Err(WordListError::Read { .. })));

        let mut file = NamedTempFile::new().unwrap();
        write_list(&mut file, r#"{"words": []}"#);
        let loader = WordListLoader::new(file.path());
        assert!(matches!(loader.current(), Err(WordListError::Parse { .. })));
    }
}
