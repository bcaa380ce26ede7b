use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WalkDir Error: {0}")]
    WalkDir(String),

    #[error("Rule Loading Error: {0}")]
    RuleLoading(String),

    #[error("Endpoint Unreachable: '{endpoint}': {source}")]
    EndpointUnreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Endpoint Error: '{endpoint}' answered {status}: {body}")]
    EndpointStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Stream Decode Error: {0}")]
    StreamDecode(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        AppError::WalkDir(err.to_string())
    }
}
