use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Push a saved tokenizer directory to the Hugging Face Hub",
    long_about = None
)]
struct Args {
    #[arg(
        long,
        value_name = "DIR",
        default_value = "./tokenizer/modified_bert",
        help = "Path to the local tokenizer folder"
    )]
    tokenizer_dir: PathBuf,

    #[arg(
        long,
        value_name = "REPO",
        help = "Hub repository name, e.g. username/model-name"
    )]
    repo_name: String,

    #[arg(
        long,
        value_name = "TOKEN",
        help = "Hub auth token (falls back to the HF_TOKEN environment variable)"
    )]
    auth_token: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("publish failed: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let url = hub::publish(
        &args.tokenizer_dir,
        &args.repo_name,
        args.auth_token.as_deref(),
    )
    .with_context(|| format!("upload to '{}' failed", args.repo_name))?;

    println!(
        "Tokenizer at '{}' pushed to '{url}'",
        args.tokenizer_dir.display()
    );
    Ok(())
}
