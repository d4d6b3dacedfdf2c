//! Vocabulary-merge core: decides which freshly learned tokens enter
//! the base vocabulary, in which order, and under which ids.
//!
//! The selection pipeline is deterministic given deterministic inputs:
//! candidate tokens unknown to the base vocabulary are optionally
//! re-ranked by a reference vocabulary, filtered by character length,
//! prefixed with curated prepared tokens, and finally consumed either
//! by renaming reserved `[unused…]` slots in place (ids preserved) or
//! by appending with fresh ids.

use crate::errors::{Error, Result};
use crate::vocab::Vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_LENGTH_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    /// Rename reserved placeholder slots in place, ids preserved.
    ReplaceUnused,
    /// Append new entries with fresh ids at the end of the vocabulary.
    AddNew,
}

impl FromStr for IntegrationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "replace_unused" => Ok(Self::ReplaceUnused),
            "add_new" => Ok(Self::AddNew),
            other => Err(Error::InvalidMode(other.to_owned())),
        }
    }
}

impl fmt::Display for IntegrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceUnused => f.write_str("replace_unused"),
            Self::AddNew => f.write_str("add_new"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Upper bound on replaced + appended tokens.
    pub target_count: usize,
    pub mode: IntegrationMode,
    /// Minimum character length for a learned token to be eligible.
    pub length_threshold: usize,
}

impl MergeOptions {
    pub fn new(target_count: usize, mode: IntegrationMode) -> Self {
        Self {
            target_count,
            mode,
            length_threshold: DEFAULT_LENGTH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub replaced: usize,
    pub appended: usize,
}

impl MergeOutcome {
    pub fn integrated(&self) -> usize {
        self.replaced + self.appended
    }
}

/// Merge candidate-vocabulary tokens into `base` in place.
///
/// `prepared` entries take priority over everything learned from the
/// corpus and bypass the length filter; they are curated, not mined.
/// `reference` is consulted read-only: tokens it knows move to the
/// front of the candidate order, nothing is dropped by the re-rank.
///
/// Running out of candidates before the budget is spent is not an
/// error; the merge simply stops early.
pub fn merge(
    base: &mut Vocabulary,
    candidate: &Vocabulary,
    opts: &MergeOptions,
    prepared: Option<&[String]>,
    reference: Option<&Vocabulary>,
) -> Result<MergeOutcome> {
    let reserved_slots = base.reserved_slots();

    // Candidate tokens the base does not know yet, candidate order.
    let mut new_tokens: Vec<&str> = candidate
        .tokens()
        .filter(|token| !base.contains(token))
        .collect();

    if let Some(reference) = reference {
        let (hits, misses): (Vec<&str>, Vec<&str>) = new_tokens
            .into_iter()
            .partition(|token| reference.contains(token));
        new_tokens = hits;
        new_tokens.extend(misses);
    }

    // Short subword fragments are unlikely to be whole-word domain terms.
    new_tokens.retain(|token| token.chars().count() >= opts.length_threshold);

    let mut queue: Vec<String> = match prepared {
        Some(prepared) => {
            let prepared: Vec<&str> = prepared
                .iter()
                .map(String::as_str)
                .filter(|token| !base.contains(token))
                .collect();
            let prepared_set: HashSet<&str> = prepared.iter().copied().collect();
            prepared
                .iter()
                .copied()
                .chain(
                    new_tokens
                        .iter()
                        .copied()
                        .filter(|token| !prepared_set.contains(token)),
                )
                .map(str::to_owned)
                .collect()
        }
        None => new_tokens.iter().map(|token| (*token).to_owned()).collect(),
    };

    // A prepared file may repeat a token; only its first occurrence may
    // enter the vocabulary.
    let mut seen: HashSet<String> = HashSet::with_capacity(queue.len());
    queue.retain(|token| seen.insert(token.clone()));

    let mut outcome = MergeOutcome::default();
    let mut budget = opts.target_count;

    if opts.mode == IntegrationMode::ReplaceUnused {
        let slots = budget.min(reserved_slots.len());
        let take = slots.min(queue.len());
        for (slot, token) in reserved_slots.iter().zip(queue.iter()).take(take) {
            base.rename(slot, token)?;
        }
        outcome.replaced = take;
        budget -= slots;
        queue.drain(..take);
    }

    if budget > 0 {
        let take = budget.min(queue.len());
        for token in queue.drain(..take) {
            base.push(&token)?;
        }
        outcome.appended = take;
    }

    Ok(outcome)
}

/// Read a prepared-token file: line-oriented free text, each line split
/// on whitespace into independent tokens. Duplicates and order are kept
/// as encountered.
pub fn load_prepared_tokens(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|err| {
        Error::Artifact(format!(
            "cannot open prepared tokens at {}: {err}",
            path.display()
        ))
    })?;

    let mut tokens = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        tokens.extend(line.split_whitespace().map(str::to_owned));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab_of(tokens: &[&str]) -> Vocabulary {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    /// 30000-entry base with 5 reserved slots interleaved near the front.
    fn big_base() -> Vocabulary {
        let mut vocab = Vocabulary::new();
        for token in ["[PAD]", "[CLS]", "[SEP]", "[MASK]", "[UNK]"] {
            vocab.push(token).unwrap();
        }
        for i in 0..5 {
            vocab.push(&format!("[unused{i}]")).unwrap();
        }
        for i in 0..29_990 {
            vocab.push(&format!("word{i}")).unwrap();
        }
        vocab
    }

    #[test]
    fn replace_mode_renames_by_position_and_preserves_ids() {
        let mut base = big_base();
        let candidate = vocab_of(&["word0", "enzyme", "word1", "benzene", "polymer"]);
        let slot_ids: Vec<u32> = (0..5)
            .map(|i| base.id_of(&format!("[unused{i}]")).unwrap())
            .collect();

        let opts = MergeOptions::new(10, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 3, appended: 0 });
        assert_eq!(base.len(), 30_000);
        assert_eq!(base.id_of("enzyme"), Some(slot_ids[0]));
        assert_eq!(base.id_of("benzene"), Some(slot_ids[1]));
        assert_eq!(base.id_of("polymer"), Some(slot_ids[2]));
        assert!(base.contains("[unused3]"));
        assert!(base.contains("[unused4]"));
    }

    #[test]
    fn add_mode_appends_sequential_ids_and_leaves_slots_alone() {
        let mut base = big_base();
        let tokens: Vec<String> = (0..12).map(|i| format!("compound{i:02}")).collect();
        let candidate: Vocabulary = tokens.iter().cloned().collect();

        let opts = MergeOptions::new(10, IntegrationMode::AddNew);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 0, appended: 10 });
        assert_eq!(base.len(), 30_010);
        for (offset, token) in tokens.iter().take(10).enumerate() {
            assert_eq!(base.id_of(token), Some(30_000 + offset as u32));
        }
        assert!(!base.contains("compound10"));
        for i in 0..5 {
            assert!(base.contains(&format!("[unused{i}]")));
        }
    }

    #[test]
    fn budget_spans_replacement_then_append() {
        let mut base = vocab_of(&["[unused0]", "[unused1]", "known"]);
        let candidate = vocab_of(&["alpha", "bravo", "charlie", "delta", "known"]);

        let opts = MergeOptions::new(3, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 2, appended: 1 });
        assert_eq!(base.len(), 4);
        assert_eq!(base.token_at(0), Some("alpha"));
        assert_eq!(base.token_at(1), Some("bravo"));
        assert_eq!(base.token_at(3), Some("charlie"));
        assert!(!base.contains("delta"));
    }

    #[test]
    fn base_tokens_are_never_treated_as_new() {
        let mut base = vocab_of(&["shared", "[unused0]"]);
        let candidate = vocab_of(&["shared", "novel"]);

        let opts = MergeOptions::new(5, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome.integrated(), 1);
        assert_eq!(base.id_of("novel"), Some(1));
        assert_eq!(base.id_of("shared"), Some(0));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn length_threshold_drops_short_fragments() {
        let mut base = vocab_of(&["[unused0]", "[unused1]", "[unused2]"]);
        let candidate = vocab_of(&["ab", "##x", "acid", "de", "amine"]);

        let opts = MergeOptions::new(3, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 3, appended: 0 });
        assert_eq!(base.token_at(0), Some("##x"));
        assert_eq!(base.token_at(1), Some("acid"));
        assert_eq!(base.token_at(2), Some("amine"));
    }

    #[test]
    fn length_threshold_counts_characters_not_bytes() {
        let mut base = vocab_of(&["[unused0]"]);
        // Three characters but nine bytes.
        let candidate = vocab_of(&["日本語"]);

        let opts = MergeOptions::new(1, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome.replaced, 1);
        assert_eq!(base.token_at(0), Some("日本語"));
    }

    #[test]
    fn reference_hits_move_to_front_keeping_relative_order() {
        let mut base = vocab_of(&["base"]);
        let candidate = vocab_of(&["omega", "gamma", "sigma", "kappa"]);
        let reference = vocab_of(&["gamma", "kappa"]);

        let opts = MergeOptions::new(4, IntegrationMode::AddNew);
        merge(&mut base, &candidate, &opts, None, Some(&reference)).unwrap();

        // gamma and kappa first (candidate order within the partition),
        // then omega and sigma, none dropped.
        assert_eq!(base.id_of("gamma"), Some(1));
        assert_eq!(base.id_of("kappa"), Some(2));
        assert_eq!(base.id_of("omega"), Some(3));
        assert_eq!(base.id_of("sigma"), Some(4));
    }

    #[test]
    fn reference_rerank_drops_nothing() {
        let mut base = vocab_of(&["base"]);
        let candidate = vocab_of(&["tokena", "tokenb", "tokenc"]);
        let reference = vocab_of(&["unrelated"]);

        let opts = MergeOptions::new(10, IntegrationMode::AddNew);
        let outcome = merge(&mut base, &candidate, &opts, None, Some(&reference)).unwrap();

        assert_eq!(outcome.appended, 3);
    }

    #[test]
    fn prepared_tokens_take_priority_over_learned_tokens() {
        let mut base = vocab_of(&["[unused0]", "[unused1]"]);
        let candidate = vocab_of(&["mined1", "mined2"]);
        let prepared = vec!["gene-x".to_owned(), "protein-y".to_owned()];

        let opts = MergeOptions::new(2, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, Some(&prepared), None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 2, appended: 0 });
        assert_eq!(base.token_at(0), Some("gene-x"));
        assert_eq!(base.token_at(1), Some("protein-y"));
        assert!(!base.contains("mined1"));
    }

    #[test]
    fn prepared_tokens_already_in_base_are_dropped() {
        let mut base = vocab_of(&["known", "[unused0]"]);
        let candidate = vocab_of(&["fresh"]);
        let prepared = vec!["known".to_owned(), "curated".to_owned()];

        let opts = MergeOptions::new(2, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, Some(&prepared), None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 1, appended: 1 });
        assert_eq!(base.token_at(1), Some("curated"));
        assert_eq!(base.id_of("fresh"), Some(2));
    }

    #[test]
    fn prepared_duplicates_of_learned_tokens_are_not_added_twice() {
        let mut base = vocab_of(&["base"]);
        let candidate = vocab_of(&["overlap", "extra"]);
        let prepared = vec!["overlap".to_owned(), "overlap".to_owned()];

        let opts = MergeOptions::new(5, IntegrationMode::AddNew);
        let outcome = merge(&mut base, &candidate, &opts, Some(&prepared), None).unwrap();

        assert_eq!(outcome.appended, 2);
        assert_eq!(base.id_of("overlap"), Some(1));
        assert_eq!(base.id_of("extra"), Some(2));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn zero_target_count_is_a_no_op() {
        let mut base = vocab_of(&["[unused0]", "anchor"]);
        let candidate = vocab_of(&["newtoken"]);

        let opts = MergeOptions::new(0, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome, MergeOutcome::default());
        assert_eq!(base.len(), 2);
        assert!(base.contains("[unused0]"));
    }

    #[test]
    fn exhausted_candidates_stop_early_without_error() {
        let mut base = vocab_of(&["[unused0]", "[unused1]", "[unused2]"]);
        let candidate = vocab_of(&["single"]);

        let opts = MergeOptions::new(100, IntegrationMode::ReplaceUnused);
        let outcome = merge(&mut base, &candidate, &opts, None, None).unwrap();

        assert_eq!(outcome, MergeOutcome { replaced: 1, appended: 0 });
        assert!(base.contains("[unused1]"));
        assert!(base.contains("[unused2]"));
    }

    #[test]
    fn length_filter_is_idempotent() {
        let tokens = ["ab", "abc", "x", "abcd", "yz"];
        let once: Vec<&&str> = tokens
            .iter()
            .filter(|t| t.chars().count() >= DEFAULT_LENGTH_THRESHOLD)
            .collect();
        let twice: Vec<&&str> = once
            .iter()
            .copied()
            .filter(|t| t.chars().count() >= DEFAULT_LENGTH_THRESHOLD)
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(
            "replace_unused".parse::<IntegrationMode>().unwrap(),
            IntegrationMode::ReplaceUnused
        );
        assert_eq!(
            "add_new".parse::<IntegrationMode>().unwrap(),
            IntegrationMode::AddNew
        );
        assert!(matches!(
            "append".parse::<IntegrationMode>(),
            Err(Error::InvalidMode(_))
        ));
    }

    #[test]
    fn prepared_file_splits_lines_on_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prepared_tokens.txt");
        std::fs::write(&path, "gene-x protein-y\n\n  benzene\tacid  \ngene-x\n").unwrap();

        let tokens = load_prepared_tokens(&path).unwrap();
        assert_eq!(
            tokens,
            vec!["gene-x", "protein-y", "benzene", "acid", "gene-x"]
        );
    }
}
