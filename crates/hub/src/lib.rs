//! Publishing of a local tokenizer directory to the Hugging Face Hub.
//!
//! The upload is synchronous (`ureq`, no async runtime) and goes
//! through the Hub commit API: one NDJSON request carrying every file
//! of the directory, so the remote content is replaced as a unit.
//! Nothing in the tokenizer pipeline depends on this crate; it is a
//! standalone collaborator invoked by the `publish` binary.

pub mod errors;

pub use errors::{Error, Result};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const ENDPOINT: &str = "https://huggingface.co";
const TOKEN_ENV: &str = "HF_TOKEN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Upload every file in `dir` to the model repository `repo`
/// (`owner/name`), creating the repository if it does not exist yet.
/// Returns the repository URL.
pub fn publish(dir: &Path, repo: &str, token: Option<&str>) -> Result<String> {
    publish_to(ENDPOINT, dir, repo, token)
}

/// Same as [`publish`] against an explicit endpoint.
pub fn publish_to(endpoint: &str, dir: &Path, repo: &str, token: Option<&str>) -> Result<String> {
    let token = resolve_token(token).ok_or_else(|| {
        Error::Auth(format!(
            "no credential for '{repo}'; pass --auth-token or set {TOKEN_ENV}"
        ))
    })?;

    let files = collect_files(dir)?;

    let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
    ensure_repo(&agent, endpoint, repo, &token)?;

    let payload = commit_payload(&files)?;
    let response = agent
        .post(&commit_url(endpoint, repo))
        .set("Authorization", &bearer(&token))
        .set("Content-Type", "application/x-ndjson")
        .send_string(&payload)
        .map_err(|err| classify(repo, err))?;

    // Drain the body so the connection can be reused; the commit URL in
    // the response is informational only.
    let _body: serde_json::Value = response.into_json()?;

    Ok(format!("{endpoint}/{repo}"))
}

/// Explicit credential first, then the `HF_TOKEN` environment variable.
pub fn resolve_token(explicit: Option<&str>) -> Option<String> {
    if let Some(token) = explicit {
        if !token.is_empty() {
            return Some(token.to_owned());
        }
    }
    env::var(TOKEN_ENV).ok().filter(|token| !token.is_empty())
}

fn collect_files(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    if !dir.is_dir() {
        return Err(Error::Artifact(format!(
            "tokenizer directory not found at {}",
            dir.display()
        )));
    }

    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push((name, fs::read(&path)?));
        }
    }

    if files.is_empty() {
        return Err(Error::Artifact(format!(
            "no files to upload in {}",
            dir.display()
        )));
    }
    Ok(files)
}

fn ensure_repo(agent: &ureq::Agent, endpoint: &str, repo: &str, token: &str) -> Result<()> {
    let body = match repo.split_once('/') {
        Some((owner, name)) => json!({ "type": "model", "name": name, "organization": owner }),
        None => json!({ "type": "model", "name": repo }),
    };

    match agent
        .post(&format!("{endpoint}/api/repos/create"))
        .set("Authorization", &bearer(token))
        .send_json(body)
    {
        Ok(_) => Ok(()),
        // Already exists; the commit below overwrites its content.
        Err(ureq::Error::Status(409, _)) => Ok(()),
        Err(err) => Err(classify(repo, err)),
    }
}

fn commit_url(endpoint: &str, repo: &str) -> String {
    format!("{endpoint}/api/models/{repo}/commit/main")
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// One NDJSON line per operation: a header, then every file inline as
/// base64. Small tokenizer artifacts fit comfortably in one request.
fn commit_payload(files: &[(String, Vec<u8>)]) -> Result<String> {
    let mut lines = Vec::with_capacity(files.len() + 1);
    lines.push(serde_json::to_string(&json!({
        "key": "header",
        "value": { "summary": "Upload tokenizer", "description": "" }
    }))?);

    for (name, bytes) in files {
        lines.push(serde_json::to_string(&json!({
            "key": "file",
            "value": {
                "path": name,
                "content": BASE64.encode(bytes),
                "encoding": "base64"
            }
        }))?);
    }

    Ok(lines.join("\n"))
}

fn classify(repo: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(401, _) | ureq::Error::Status(403, _) => {
            Error::Auth(format!("credential rejected for '{repo}'"))
        }
        ureq::Error::Status(404, _) => Error::RepoNotFound(repo.to_owned()),
        other => Error::Network(Box::new(other)),
    }
}
