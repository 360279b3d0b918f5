//! Resolution requests and results.
//!
//! A request is built fresh for every import the host bundler encounters and
//! is never persisted. A [`Resolution`] is the one result shape every resolver
//! in a chain must produce, so decorators can hand results through untouched.

use crate::error::ResolveError;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Identifier of a module as written in an import statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ModuleId(String);

impl TryFrom<String> for ModuleId {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl ModuleId {
    /// Build a module identifier, rejecting empty or blank names.
    pub fn new(id: impl Into<String>) -> Result<Self, ResolveError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ResolveError::InvalidRequest(
                "module identifier must be non-empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is a relative path specifier (`./x`, `../x`).
    pub fn is_relative(&self) -> bool {
        self.0 == "." || self.0 == ".." || self.0.starts_with("./") || self.0.starts_with("../")
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque requesting context.
///
/// Substitution never inspects it; it is handed to the delegate exactly as
/// received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Path of the module containing the import, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<PathBuf>,

    /// Host-specific attributes (condition names, custom resolver options).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn from_origin(origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: Some(origin.into()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

/// One module resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRequest {
    #[serde(default)]
    pub context: RequestContext,
    pub module: ModuleId,
    pub platform: Platform,
}

impl ResolutionRequest {
    pub fn new(context: RequestContext, module: ModuleId, platform: Platform) -> Self {
        Self {
            context,
            module,
            platform,
        }
    }

    /// Convenience constructor for a request without origin information.
    pub fn bare(module: &str, platform: Platform) -> Result<Self, ResolveError> {
        Ok(Self::new(
            RequestContext::default(),
            ModuleId::new(module)?,
            platform,
        ))
    }
}

/// The outcome of resolving a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Resolution {
    /// Load this source file in place of the import.
    #[serde(rename_all = "camelCase")]
    SourceFile { file_path: PathBuf },

    /// The import names one or more asset files (images, fonts).
    #[serde(rename_all = "camelCase")]
    AssetFiles { file_paths: Vec<PathBuf> },

    /// The import resolves to an empty module.
    Empty,
}

impl Resolution {
    pub fn source_file(path: impl Into<PathBuf>) -> Self {
        Self::SourceFile {
            file_path: path.into(),
        }
    }

    /// The source file path, when this is a source-file resolution.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::SourceFile { file_path } => Some(file_path),
            _ => None,
        }
    }
}
