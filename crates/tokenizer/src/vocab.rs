//! Ordered token -> id mapping shared by the base, candidate and
//! reference tokenizer roles.
//!
//! Ids are dense, starting at 0, and insertion order assigns the id of
//! every appended token. The on-disk form is the BERT `vocab.txt`
//! layout: one token per line, line number = id.

use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Marker prefix of the replaceable placeholder entries that BERT-style
/// vocabularies carry ("[unused0]", "[unused1]", ...).
pub const RESERVED_PREFIX: &str = "[unused";

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `vocab.txt`. Duplicate lines are rejected: the merge
    /// machinery relies on token -> id lookups being unambiguous.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            Error::Artifact(format!(
                "cannot open vocabulary at {}: {err}",
                path.display()
            ))
        })?;
        let reader = BufReader::new(file);

        let mut vocab = Self::new();
        for line in reader.lines() {
            let line = line?;
            vocab.push(line.trim_end_matches(['\r', '\n']))?;
        }
        Ok(vocab)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|err| {
            Error::Artifact(format!(
                "cannot write vocabulary to {}: {err}",
                path.display()
            ))
        })?;
        let mut writer = BufWriter::new(file);
        for token in &self.tokens {
            writer.write_all(token.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Append a token under the next free id.
    pub fn push(&mut self, token: &str) -> Result<u32> {
        if self.index.contains_key(token) {
            return Err(Error::Validation(format!(
                "duplicate token '{token}' in vocabulary"
            )));
        }
        let id = self.tokens.len() as u32;
        self.index.insert(token.to_owned(), id);
        self.tokens.push(token.to_owned());
        Ok(id)
    }

    /// Rename the entry holding `old` to `new`, keeping its id. This is
    /// how reserved placeholder slots are repurposed without shifting
    /// any downstream id reference.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<u32> {
        if self.index.contains_key(new) {
            return Err(Error::Validation(format!(
                "cannot rename '{old}': token '{new}' is already present"
            )));
        }
        let id = self.index.remove(old).ok_or_else(|| {
            Error::Validation(format!("token '{old}' not present in vocabulary"))
        })?;
        self.tokens[id as usize] = new.to_owned();
        self.index.insert(new.to_owned(), id);
        Ok(id)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn token_at(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Reserved placeholder tokens in their existing vocabulary order.
    /// Matching is purely lexical; whether a slot was ever used in
    /// inference does not matter.
    pub fn reserved_slots(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter(|token| token.starts_with(RESERVED_PREFIX))
            .cloned()
            .collect()
    }
}

impl FromIterator<String> for Vocabulary {
    /// Builds a vocabulary from unique tokens; later duplicates are
    /// dropped. Intended for tests and reference vocabularies where
    /// lookups matter but ids do not.
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut vocab = Self::new();
        for token in iter {
            let _ = vocab.push(&token);
        }
        vocab
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        ["[PAD]", "[unused0]", "[unused1]", "[CLS]", "world"]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn push_assigns_dense_ids() {
        let vocab = sample();
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.id_of("[PAD]"), Some(0));
        assert_eq!(vocab.id_of("world"), Some(4));
        assert_eq!(vocab.token_at(3), Some("[CLS]"));
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut vocab = sample();
        assert!(vocab.push("world").is_err());
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn rename_preserves_id() {
        let mut vocab = sample();
        let id = vocab.rename("[unused0]", "protein").unwrap();
        assert_eq!(id, 1);
        assert_eq!(vocab.id_of("protein"), Some(1));
        assert_eq!(vocab.token_at(1), Some("protein"));
        assert!(!vocab.contains("[unused0]"));
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn rename_rejects_existing_target() {
        let mut vocab = sample();
        assert!(vocab.rename("[unused0]", "world").is_err());
        assert_eq!(vocab.token_at(1), Some("[unused0]"));
    }

    #[test]
    fn reserved_slots_in_vocabulary_order() {
        let vocab = sample();
        assert_eq!(vocab.reserved_slots(), vec!["[unused0]", "[unused1]"]);
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        let vocab = sample();
        vocab.save(&path).unwrap();

        let reloaded = Vocabulary::from_file(&path).unwrap();
        assert_eq!(reloaded.len(), vocab.len());
        for (id, token) in vocab.tokens().enumerate() {
            assert_eq!(reloaded.id_of(token), Some(id as u32));
        }
    }

    #[test]
    fn from_file_rejects_duplicate_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        std::fs::write(&path, "alpha\nbeta\nalpha\n").unwrap();
        assert!(Vocabulary::from_file(&path).is_err());
    }
}
