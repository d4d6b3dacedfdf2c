use crate::config::Config;
use crate::errors::{Error, Result};
use std::path::Path;

pub fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.training.vocab_size == 0 {
        return Err(Error::Validation(
            "training.vocab_size must be greater than zero".into(),
        ));
    }

    if cfg.training.min_frequency < 1 {
        return Err(Error::Validation(
            "training.min_frequency must be at least 1".into(),
        ));
    }

    if cfg.merge.length_threshold < 1 {
        return Err(Error::Validation(
            "merge.length_threshold must be at least 1".into(),
        ));
    }

    if !cfg.training.data_directory.is_dir() {
        return Err(Error::Validation(format!(
            "data directory not found at {}",
            cfg.training.data_directory.display()
        )));
    }

    if let Some(path) = cfg.merge.prepared_tokens.as_deref() {
        ensure_file(path, "prepared token file not found at")?;
    }

    // A requested re-rank with no readable reference vocabulary fails
    // outright; it is never silently skipped.
    if let Some(path) = cfg.merge.reference_vocab.as_deref() {
        if !path.is_file() && !path.is_dir() {
            return Err(Error::Validation(format!(
                "reference vocabulary not found at {}",
                path.display()
            )));
        }
    }

    if !cfg.artifacts.base_tokenizer.exists() {
        return Err(Error::Validation(format!(
            "base tokenizer not found at {}",
            cfg.artifacts.base_tokenizer.display()
        )));
    }

    ensure_directory_creatable(&cfg.training.trained_tokenizer_directory)?;
    ensure_directory_creatable(&cfg.artifacts.final_directory)
}

fn ensure_file(path: &Path, context: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Validation(format!("{context} {}", path.display())))
    }
}

fn ensure_directory_creatable(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    if dir.exists() {
        return Err(Error::Validation(format!(
            "output path '{}' exists but is not a directory",
            dir.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArtifactsCfg, MergeCfg, TrainingCfg};
    use crate::merge::IntegrationMode;
    use std::fs;

    fn base_config(root: &Path) -> Config {
        let data = root.join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(root.join("base-vocab.txt"), "[PAD]\n").unwrap();
        Config {
            training: TrainingCfg {
                data_directory: data,
                trained_tokenizer_directory: root.join("trained"),
                vocab_size: 30_000,
                min_frequency: 2,
                lowercase: true,
                show_progress: false,
            },
            merge: MergeCfg::new(900, IntegrationMode::ReplaceUnused),
            artifacts: ArtifactsCfg {
                base_tokenizer: root.join("base-vocab.txt"),
                final_directory: root.join("modified"),
            },
        }
    }

    #[test]
    fn accepts_a_well_formed_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config(&base_config(dir.path())).is_ok());
    }

    #[test]
    fn rejects_zero_vocab_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.training.vocab_size = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_missing_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.training.data_directory = dir.path().join("nope");
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_unreadable_reference_vocab() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.merge.reference_vocab = Some(dir.path().join("missing-scivocab.txt"));
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_final_directory_shadowed_by_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        let shadow = dir.path().join("modified");
        fs::write(&shadow, "file in the way").unwrap();
        cfg.artifacts.final_directory = shadow;
        assert!(validate_config(&cfg).is_err());
    }
}
