use thiserror::Error;

#[derive(Error, Debug)]
pub enum AamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("XML parsing failed: {0}")]
    XmlParsing(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Munki error: {0}")]
    Munki(String),

    #[error("{0} update(s) failed to process")]
    UpdatesFailed(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AamError>;
