#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FocusworkError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },

    #[error("invalid document id '{0}'")]
    InvalidDocumentId(String),

    #[error("unknown status filter '{0}'")]
    UnknownFilter(String),

    #[error("unknown priority '{0}'")]
    UnknownPriority(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("io error at {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}
