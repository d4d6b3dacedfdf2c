//! Domain adaptation of a pretrained WordPiece vocabulary.
//!
//! The crate covers the full pipeline: a fresh WordPiece tokenizer is
//! trained from a directory of raw text (subword statistics delegated
//! to the `tokenizers` crate), its vocabulary is merged into an
//! existing base tokenizer's vocabulary, and the result is persisted in
//! the standard BERT directory layout.
//!
//! # Merging
//!
//! [`merge::merge`] carries the decision logic: candidate tokens absent
//! from the base vocabulary are optionally re-ranked by a reference
//! vocabulary, filtered by character length, combined with curated
//! prepared tokens, and integrated either by renaming reserved
//! `[unused…]` placeholder slots in place (ids preserved) or by
//! appending under fresh ids. The whole run is single-threaded and
//! synchronous; persistence is the final step, so a failed run writes
//! no merged artifact.

use std::path::PathBuf;

pub mod artifacts;
pub mod config;
pub mod corpus;
pub mod errors;
pub mod merge;
pub mod trainer;
pub mod validate;
pub mod vocab;

pub use config::{ArtifactsCfg, Config, MergeCfg, TrainingCfg};
pub use errors::{Error, Result};
pub use merge::{IntegrationMode, MergeOptions, MergeOutcome};
pub use vocab::Vocabulary;

use artifacts::{ArtifactManifest, TokenizerMeta, MANIFEST_FILE};

/// Summary of a completed train-and-merge run.
#[derive(Debug)]
pub struct MergeReport {
    pub outcome: MergeOutcome,
    /// Final vocabulary size after the merge.
    pub vocab_len: usize,
    /// `vocab.txt` produced by training, kept as the handoff artifact.
    pub candidate_vocab: PathBuf,
    /// Files written into the final tokenizer directory.
    pub written: Vec<PathBuf>,
}

/// Run the full pipeline: train, merge, persist.
pub fn train_and_update(cfg: &Config) -> Result<MergeReport> {
    validate::validate_config(cfg)?;

    let candidate_vocab = trainer::train_wordpiece(&cfg.training)?;
    let candidate = Vocabulary::from_file(&candidate_vocab)?;
    println!(
        "Trained vocabulary of {} token(s) at {}",
        candidate.len(),
        candidate_vocab.display()
    );

    let base_path = artifacts::resolve_vocab_file(&cfg.artifacts.base_tokenizer);
    let mut base = Vocabulary::from_file(&base_path)?;

    let prepared = match cfg.merge.prepared_tokens.as_deref() {
        Some(path) => Some(merge::load_prepared_tokens(path)?),
        None => None,
    };
    let reference = match cfg.merge.reference_vocab.as_deref() {
        Some(path) => Some(Vocabulary::from_file(&artifacts::resolve_vocab_file(path))?),
        None => None,
    };

    let outcome = merge::merge(
        &mut base,
        &candidate,
        &cfg.merge.options(),
        prepared.as_deref(),
        reference.as_ref(),
    )?;
    println!(
        "Replaced {} unused token(s), appended {} token(s)",
        outcome.replaced, outcome.appended
    );

    let meta = TokenizerMeta {
        do_lower_case: cfg.training.lowercase,
        ..TokenizerMeta::default()
    };
    let written = artifacts::save_pretrained(&base, &meta, &cfg.artifacts.final_directory)?;

    let refs: Vec<&std::path::Path> = written.iter().map(PathBuf::as_path).collect();
    let manifest = ArtifactManifest {
        cfg_hash: artifacts::compute_run_hash(cfg, &refs)?,
        created_at: artifacts::unix_timestamp()?,
        token_count: base.len(),
    };
    artifacts::write_manifest(&cfg.artifacts.final_directory.join(MANIFEST_FILE), &manifest)?;

    println!(
        "Tokenizer updated and saved to {}",
        cfg.artifacts.final_directory.display()
    );

    Ok(MergeReport {
        outcome,
        vocab_len: base.len(),
        candidate_vocab,
        written,
    })
}
