use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("repository '{0}' not found or not accessible")]
    RepoNotFound(String),

    #[error("network error: {0}")]
    Network(#[from] Box<ureq::Error>),

    #[error("artifact error: {0}")]
    Artifact(String),
}
