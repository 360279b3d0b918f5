//! Error types for platshim kernel operations.

use crate::platform::Platform;
use std::path::PathBuf;

/// Errors raised while loading or validating a substitution configuration.
///
/// All of these are fatal build-configuration errors: the build must stop
/// rather than fall back to the real module on a platform that cannot host it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A rule is malformed (empty module, unknown platform, empty replacement).
    #[error("invalid substitution rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// Two rules share the same exact (module, platform) key.
    #[error("duplicate substitution rule for `{module}` on {platform}")]
    DuplicateRule { module: String, platform: Platform },

    /// The configured replacement file does not exist.
    #[error("replacement for `{module}` on {platform} not found: {}", path.display())]
    MissingReplacement {
        module: String,
        platform: Platform,
        path: PathBuf,
    },
}

/// Errors raised while resolving a single request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The request itself is malformed.
    #[error("invalid resolution request: {0}")]
    InvalidRequest(String),

    /// No resolver in the chain could resolve the module.
    #[error("unable to resolve `{module}` for {platform}: {reason}")]
    Unresolvable {
        module: String,
        platform: Platform,
        reason: String,
    },
}

/// Errors raised while building a stub module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    #[error("invalid stub module id {module:?}: {reason}")]
    InvalidModule { module: String, reason: &'static str },

    /// The name cannot be written as `exports.X` and `export const X`.
    #[error("invalid export name `{name}`: {reason}")]
    InvalidExport { name: String, reason: &'static str },
}
