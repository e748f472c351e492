use thiserror::Error;

/// CLI-surface errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read source list '{path}': {source}")]
    SourceList {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source line {line}: '{text}' (expected: name url)")]
    InvalidSourceLine { line: usize, text: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        2
    }
}
