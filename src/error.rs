use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corpus '{0}' has no usable excerpts")]
    EmptyCorpus(String),

    #[error("Built-in corpus '{0}' not found")]
    UnknownCorpus(String),
}

pub type Result<T> = std::result::Result<T, Error>;
