//! Word sources for picking the hidden word of each round

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dictionary contains no usable words")]
    Empty,
}

/// Supplies hidden words, once per round, for as long as the server runs
pub trait WordSource {
    /// Returns a pseudo-random word among the first `size_hint` entries.
    fn next_word(&mut self, size_hint: usize) -> Result<String, DictionaryError>;

    /// Number of words available
    fn len(&self) -> usize;
}

/// In-memory word list loaded once and reused for every round
#[derive(Debug)]
pub struct WordList {
    words: Vec<String>,
    rng: StdRng,
}

impl WordList {
    /// Builds a list from raw entries, keeping only purely alphabetic words.
    pub fn new<I, S>(entries: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = entries
            .into_iter()
            .filter_map(|entry| {
                let word = normalize_word(entry.as_ref());
                if word.is_none() && !entry.as_ref().trim().is_empty() {
                    debug!("Skipping dictionary entry '{}'", entry.as_ref().trim());
                }
                word
            })
            .collect();

        if words.is_empty() {
            return Err(DictionaryError::Empty);
        }

        Ok(Self {
            words,
            rng: StdRng::from_entropy(),
        })
    }

    /// Loads a newline separated word file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DictionaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let list = Self::new(contents.lines())?;
        let skipped = contents.lines().filter(|l| !l.trim().is_empty()).count() - list.len();
        if skipped > 0 {
            warn!(
                "Ignored {} dictionary entries in {} that are not plain words",
                skipped,
                path.display()
            );
        }
        Ok(list)
    }

    /// Replaces the random source with a seeded one for reproducible rounds.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl WordSource for WordList {
    fn next_word(&mut self, size_hint: usize) -> Result<String, DictionaryError> {
        let bound = size_hint.clamp(1, self.words.len());
        let index = self.rng.gen_range(0..bound);
        Ok(self.words[index].clone())
    }

    fn len(&self) -> usize {
        self.words.len()
    }
}

fn normalize_word(entry: &str) -> Option<String> {
    let word = entry.trim();
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(word.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_word_list_filters_entries() {
        let list = WordList::new(["Apple", "  pear ", "", "two words", "c3po", "Kiwi"]).unwrap();
        assert_eq!(list.words(), &["apple", "pear", "kiwi"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_empty_word_list() {
        let result = WordList::new(["", "123", "   "]);
        assert!(matches!(result, Err(DictionaryError::Empty)));
    }

    #[test]
    fn test_next_word_respects_size_hint() {
        let mut list = WordList::new(["first", "second", "third"]).unwrap().with_seed(7);
        for _ in 0..20 {
            assert_eq!(list.next_word(1).unwrap(), "first");
        }
        for _ in 0..20 {
            let word = list.next_word(100).unwrap();
            assert!(list.words().contains(&word));
        }
    }

    #[test]
    fn test_seeded_lists_agree() {
        let mut a = WordList::new(["one", "two", "three", "four"]).unwrap().with_seed(42);
        let mut b = WordList::new(["one", "two", "three", "four"]).unwrap().with_seed(42);
        for _ in 0..10 {
            assert_eq!(a.next_word(4).unwrap(), b.next_word(4).unwrap());
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "hangman").unwrap();
        writeln!(file, "Socket\r").unwrap();
        writeln!(file, "C++").unwrap();

        let list = WordList::from_file(file.path()).unwrap();
        assert_eq!(list.words(), &["hangman", "socket"]);
    }

    #[test]
    fn test_missing_file() {
        let result = WordList::from_file("/definitely/not/a/dictionary");
        assert!(matches!(result, Err(DictionaryError::Read { .. })));
    }
}
