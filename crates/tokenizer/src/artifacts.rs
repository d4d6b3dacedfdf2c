//! Persistence of the merged tokenizer: the BERT directory layout
//! (`vocab.txt`, `tokenizer_config.json`, `special_tokens_map.json`)
//! plus a manifest hashing the merge configuration and written files.

use crate::errors::{Error, Result};
use crate::vocab::Vocabulary;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const VOCAB_FILE: &str = "vocab.txt";
pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
pub const SPECIAL_TOKENS_FILE: &str = "special_tokens_map.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Auxiliary tokenizer configuration persisted next to the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerMeta {
    pub do_lower_case: bool,
    pub unk_token: String,
    pub sep_token: String,
    pub pad_token: String,
    pub cls_token: String,
    pub mask_token: String,
    pub model_max_length: usize,
}

impl Default for TokenizerMeta {
    fn default() -> Self {
        Self {
            do_lower_case: true,
            unk_token: "[UNK]".into(),
            sep_token: "[SEP]".into(),
            pad_token: "[PAD]".into(),
            cls_token: "[CLS]".into(),
            mask_token: "[MASK]".into(),
            model_max_length: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub cfg_hash: String,
    pub created_at: String,
    pub token_count: usize,
}

/// Accept either a tokenizer directory or a direct `vocab.txt` path.
pub fn resolve_vocab_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(VOCAB_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Write the full tokenizer directory, creating it if absent. Returns
/// the written paths in a stable order for manifest hashing.
pub fn save_pretrained(
    vocab: &Vocabulary,
    meta: &TokenizerMeta,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|err| {
        Error::Artifact(format!(
            "cannot create tokenizer directory {}: {err}",
            dir.display()
        ))
    })?;

    let vocab_path = dir.join(VOCAB_FILE);
    vocab.save(&vocab_path)?;

    let config_path = dir.join(TOKENIZER_CONFIG_FILE);
    write_json(&config_path, meta)?;

    let special_path = dir.join(SPECIAL_TOKENS_FILE);
    write_json(&special_path, &special_tokens_map(meta))?;

    Ok(vec![vocab_path, config_path, special_path])
}

fn special_tokens_map(meta: &TokenizerMeta) -> serde_json::Value {
    json!({
        "unk_token": meta.unk_token,
        "sep_token": meta.sep_token,
        "pad_token": meta.pad_token,
        "cls_token": meta.cls_token,
        "mask_token": meta.mask_token,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_manifest(manifest_path: &Path, manifest: &ArtifactManifest) -> Result<()> {
    write_json(manifest_path, manifest)
}

pub fn read_manifest(manifest_path: &Path) -> Result<ArtifactManifest> {
    if !manifest_path.is_file() {
        return Err(Error::Artifact(format!(
            "manifest not found at {}",
            manifest_path.display()
        )));
    }
    let file = File::open(manifest_path)?;
    let reader = BufReader::new(file);
    let manifest = serde_json::from_reader(reader)?;
    Ok(manifest)
}

/// SHA-256 over the serialized run configuration plus the written
/// artifact files, path-sorted so the hash is order-independent.
pub fn compute_run_hash<T: Serialize>(cfg: &T, written: &[&Path]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(cfg)?);

    let mut sorted = written.to_vec();
    sorted.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    let mut buffer = [0u8; 8 * 1024];
    for path in sorted {
        if !path.is_file() {
            return Err(Error::Artifact(format!(
                "cannot hash missing file at {}",
                path.display()
            )));
        }
        hasher.update(path.to_string_lossy().as_bytes());

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn unix_timestamp() -> Result<String> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| Error::Artifact(format!("failed to compute timestamp: {err}")))?
        .as_secs();
    Ok(format!("unix:{secs}"))
}
