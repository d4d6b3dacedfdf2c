//! WordPiece training over a streamed corpus.
//!
//! Subword statistics are delegated to the `tokenizers` crate; this
//! module wires its trainer to the chunked corpus feed and persists the
//! learned vocabulary. Training determinism is a property of that
//! library, not something guaranteed here.

use crate::config::TrainingCfg;
use crate::corpus::ChunkedCorpus;
use crate::errors::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::decoders::wordpiece::WordPiece as WordPieceDecoder;
use tokenizers::models::wordpiece::{WordPiece, WordPieceTrainer};
use tokenizers::models::{ModelWrapper, TrainerWrapper};
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::tokenizer::AddedToken;
use tokenizers::{Model, Tokenizer};

pub const BERT_SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

/// Train a fresh WordPiece tokenizer from the configured corpus
/// directory and write its model files into the trained-tokenizer
/// directory, creating it if absent. Returns the path of the produced
/// `vocab.txt`.
pub fn train_wordpiece(cfg: &TrainingCfg) -> Result<PathBuf> {
    let mut corpus = ChunkedCorpus::from_dir(&cfg.data_directory)?;
    println!(
        "Training WordPiece tokenizer on {} document(s) from {}",
        corpus.file_count(),
        cfg.data_directory.display()
    );

    let mut tokenizer = Tokenizer::new(WordPiece::default());
    tokenizer.with_normalizer(Some(BertNormalizer::new(
        true,
        true,
        Some(true),
        cfg.lowercase,
    )));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
    tokenizer.with_decoder(Some(WordPieceDecoder::default()));

    let special_tokens: Vec<AddedToken> = BERT_SPECIAL_TOKENS
        .iter()
        .map(|token| AddedToken::from(token.to_string(), true))
        .collect();

    let mut trainer: TrainerWrapper = WordPieceTrainer::builder()
        .vocab_size(cfg.vocab_size)
        .min_frequency(cfg.min_frequency.into())
        .show_progress(cfg.show_progress)
        .special_tokens(special_tokens)
        .build()
        .into();

    tokenizer.train(&mut trainer, corpus.by_ref())?;

    if let Some(err) = corpus.take_error() {
        return Err(err);
    }

    let output_dir = cfg.trained_tokenizer_directory.as_path();
    fs::create_dir_all(output_dir).map_err(|err| {
        Error::Artifact(format!(
            "cannot create trained tokenizer directory {}: {err}",
            output_dir.display()
        ))
    })?;

    save_wordpiece_vocab(tokenizer.get_model(), output_dir)
}

fn save_wordpiece_vocab(model: &ModelWrapper, dir: &Path) -> Result<PathBuf> {
    let saved = match model {
        ModelWrapper::WordPiece(wordpiece) => wordpiece.save(dir, None).map_err(Error::from)?,
        _ => {
            return Err(Error::Artifact(
                "training produced a non-WordPiece model".into(),
            ))
        }
    };

    saved
        .into_iter()
        .find(|path| path.file_name().map_or(false, |name| name == "vocab.txt"))
        .ok_or_else(|| Error::Artifact("WordPiece save did not produce vocab.txt".into()))
}
