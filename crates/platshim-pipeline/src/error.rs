use platshim_kernel::ConfigError;
use std::path::PathBuf;

/// Errors from reading or wiring a pipeline adapter.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to read file: {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {}: {source}", path.display())]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("alias table at {}: {reason}", path.display())]
    InvalidAliasTable { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
