use crate::merge::{IntegrationMode, MergeOptions, DEFAULT_LENGTH_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingCfg,
    pub merge: MergeCfg,
    pub artifacts: ArtifactsCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingCfg {
    /// Directory of raw `.txt` documents to learn from.
    pub data_directory: PathBuf,
    /// Where the intermediate trained tokenizer lands.
    pub trained_tokenizer_directory: PathBuf,
    pub vocab_size: usize,
    pub min_frequency: u32,
    pub lowercase: bool,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCfg {
    /// Upper bound on tokens integrated into the base vocabulary.
    pub target_count: usize,
    pub mode: IntegrationMode,
    pub length_threshold: usize,
    /// Optional curated token file; its entries outrank learned tokens.
    pub prepared_tokens: Option<PathBuf>,
    /// Optional reference `vocab.txt` used only to re-rank candidates.
    pub reference_vocab: Option<PathBuf>,
}

impl MergeCfg {
    pub fn new(target_count: usize, mode: IntegrationMode) -> Self {
        Self {
            target_count,
            mode,
            length_threshold: DEFAULT_LENGTH_THRESHOLD,
            prepared_tokens: None,
            reference_vocab: None,
        }
    }

    pub fn options(&self) -> MergeOptions {
        MergeOptions {
            target_count: self.target_count,
            mode: self.mode,
            length_threshold: self.length_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsCfg {
    /// Directory (or `vocab.txt` path) of the pretrained base tokenizer.
    pub base_tokenizer: PathBuf,
    /// Directory that receives the merged tokenizer.
    pub final_directory: PathBuf,
}
