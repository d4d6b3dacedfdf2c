use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tokenizer::{
    train_and_update, ArtifactsCfg, Config, IntegrationMode, MergeCfg, TrainingCfg,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Train a WordPiece tokenizer and merge its vocabulary into a base tokenizer",
    long_about = None
)]
struct Args {
    #[arg(
        long,
        value_name = "DIR",
        default_value = "./data/",
        help = "Directory containing raw .txt training data"
    )]
    data_directory: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        help = "Optional file of curated domain tokens, integrated ahead of learned tokens"
    )]
    prepared_tokens: Option<PathBuf>,

    #[arg(
        long,
        value_name = "N",
        default_value_t = 3,
        help = "Minimum character length for accepted learned tokens"
    )]
    length_threshold: usize,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "tokenizer/trained_bert",
        help = "Directory where the intermediate trained tokenizer is saved"
    )]
    trained_tokenizer_directory: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "tokenizer/modified_bert",
        help = "Directory where the final updated tokenizer is written"
    )]
    final_directory: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        help = "Base tokenizer directory (or vocab.txt) whose vocabulary is updated"
    )]
    base_tokenizer: PathBuf,

    #[arg(
        long,
        value_name = "N",
        default_value_t = 30000,
        help = "Vocabulary size for the freshly trained tokenizer"
    )]
    vocab_size: usize,

    #[arg(
        long,
        value_name = "N",
        default_value_t = 2,
        help = "Minimum corpus frequency for a learned subword"
    )]
    min_frequency: u32,

    #[arg(
        long,
        value_name = "N",
        help = "Number of new tokens to integrate into the base vocabulary"
    )]
    num_tokens: usize,

    #[arg(
        long,
        value_enum,
        default_value_t = ModeArg::ReplaceUnused,
        help = "How to integrate new tokens"
    )]
    mode: ModeArg,

    #[arg(
        long,
        requires = "reference_vocab",
        help = "Re-rank learned tokens by membership in the reference vocabulary"
    )]
    prioritize_reference: bool,

    #[arg(
        long,
        value_name = "PATH",
        requires = "prioritize_reference",
        help = "Reference vocab.txt (e.g. SciBERT) used for domain prioritization"
    )]
    reference_vocab: Option<PathBuf>,

    #[arg(long, help = "Keep the original casing instead of lowercasing")]
    no_lowercase: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    #[value(name = "replace_unused")]
    ReplaceUnused,
    #[value(name = "add_new")]
    AddNew,
}

impl From<ModeArg> for IntegrationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::ReplaceUnused => IntegrationMode::ReplaceUnused,
            ModeArg::AddNew => IntegrationMode::AddNew,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("train-merge failed: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let cfg = Config {
        training: TrainingCfg {
            data_directory: args.data_directory,
            trained_tokenizer_directory: args.trained_tokenizer_directory,
            vocab_size: args.vocab_size,
            min_frequency: args.min_frequency,
            lowercase: !args.no_lowercase,
            show_progress: true,
        },
        merge: MergeCfg {
            target_count: args.num_tokens,
            mode: args.mode.into(),
            length_threshold: args.length_threshold,
            prepared_tokens: args.prepared_tokens,
            reference_vocab: args.reference_vocab,
        },
        artifacts: ArtifactsCfg {
            base_tokenizer: args.base_tokenizer,
            final_directory: args.final_directory,
        },
    };

    let report = train_and_update(&cfg).context("train-merge pipeline failed")?;

    println!(
        "Done: {} token(s) integrated ({} replaced, {} appended), final vocabulary size {}",
        report.outcome.integrated(),
        report.outcome.replaced,
        report.outcome.appended,
        report.vocab_len
    );
    Ok(())
}
