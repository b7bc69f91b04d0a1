use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatusError>;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("GitHub Error {0}")]
    GitHubError(#[from] octocrab::Error),
    #[error("Yaml Error {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Json Error {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid private key {0}")]
    InvalidPrivateKey(#[from] jsonwebtoken::errors::Error),
    #[error("Failed to compile template for field {field}: {source}")]
    Compile {
        field: &'static str,
        #[source]
        source: minijinja::Error,
    },
    #[error("Failed to execute template for field {field}: {source}")]
    Execute {
        field: &'static str,
        #[source]
        source: minijinja::Error,
    },
    #[error("missing status payload")]
    MissingPayload,
    #[error("Invalid repository url {0}")]
    InvalidRepoUrl(String),
    #[error("Invalid repository name {0}")]
    InvalidRepositoryName(String),
    #[error("Invalid revision {0}")]
    InvalidRevision(String),
    #[error("GitHub call timed out after {0:?}")]
    Timeout(Duration),
}
