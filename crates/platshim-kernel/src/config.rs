//! TOML configuration for the shared substitution rule table.
//!
//! ```toml
//! [resolver]
//! memoize = false
//!
//! [[substitution]]
//! module = "react-native-maps"
//! platform = "web"
//! replacement = "shims/react-native-maps.web.js"
//! exports = ["default", "MapView", "Marker"]
//! ```
//!
//! Replacement paths are written relative to the configuration file. The
//! table is validated once at load time and never mutated afterwards.

use crate::error::ConfigError;
use crate::platform::Platform;
use crate::request::ModuleId;
use crate::resolver::{MemoResolver, Resolver, SubstitutingResolver};
use crate::rules::{RuleTable, SubstitutionRule};
use crate::stub::REACT_NATIVE_MAPS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "platshim.toml";

/// Resolver behavior knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSettings {
    /// Memoize resolutions for the lifetime of the resolver. Off by default
    /// so repeated builds always see the current rule table.
    pub memoize: bool,
}

/// One `[[substitution]]` entry as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub module: String,
    pub platform: String,
    pub replacement: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    resolver: ResolverSettings,
    #[serde(default)]
    substitution: Vec<RuleEntry>,
}

/// A loaded and validated configuration.
#[derive(Debug, Clone)]
pub struct ShimConfig {
    root: PathBuf,
    settings: ResolverSettings,
    rules: RuleTable,
}

impl ShimConfig {
    /// Load a configuration file. Relative replacements resolve against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let config = Self::parse_with_source(&text, root, path)?;
        info!(
            path = %path.display(),
            rules = config.rules.len(),
            digest = %config.rules.digest(),
            "substitution config loaded"
        );
        Ok(config)
    }

    /// Parse configuration text, resolving relative replacements against `root`.
    pub fn parse(text: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::parse_with_source(text, root.into(), Path::new("<inline>"))
    }

    fn parse_with_source(text: &str, root: PathBuf, source_path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: source_path.to_path_buf(),
            source,
        })?;

        let mut rules = RuleTable::new();
        for (index, entry) in file.substitution.into_iter().enumerate() {
            rules.insert(rule_from_entry(index, entry)?)?;
        }
        Ok(Self {
            root,
            settings: file.resolver,
            rules,
        })
    }

    /// Build a configuration from an already validated table.
    pub fn from_rules(root: impl Into<PathBuf>, settings: ResolverSettings, rules: RuleTable) -> Self {
        Self {
            root: root.into(),
            settings,
            rules,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Rules exactly as configured, replacement paths relative to the root.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Rules with replacement paths joined onto the configuration root.
    pub fn resolved_rules(&self) -> RuleTable {
        self.rules.clone().rebase(&self.root)
    }

    /// Fail when any configured replacement file does not exist.
    ///
    /// A missing replacement is fatal: falling back to the real module would
    /// break the build for the platform the rule exists for.
    pub fn verify_replacements(&self) -> Result<(), ConfigError> {
        for rule in self.resolved_rules().rules() {
            debug!(module = %rule.module, platform = %rule.platform, "checking replacement");
            if !rule.replacement.is_file() {
                return Err(ConfigError::MissingReplacement {
                    module: rule.module.to_string(),
                    platform: rule.platform,
                    path: rule.replacement.clone(),
                });
            }
        }
        Ok(())
    }

    /// Compose the configured substitutions over `previous`.
    pub fn resolver(&self, previous: Option<Arc<dyn Resolver>>) -> Arc<dyn Resolver> {
        let substituting = SubstitutingResolver::compose(Arc::new(self.resolved_rules()), previous);
        if self.settings.memoize {
            Arc::new(MemoResolver::new(substituting))
        } else {
            Arc::new(substituting)
        }
    }

    /// Render the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let file = ConfigFile {
            resolver: self.settings.clone(),
            substitution: self
                .rules
                .rules()
                .map(|rule| RuleEntry {
                    module: rule.module.to_string(),
                    platform: rule.platform.to_string(),
                    replacement: rule.replacement.to_string_lossy().replace('\\', "/"),
                    exports: rule.exports.clone(),
                })
                .collect(),
        };
        toml::to_string_pretty(&file)
    }

    /// The starter configuration: stub `react-native-maps` on web.
    pub fn starter(
        root: impl Into<PathBuf>,
        replacement: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let entry = RuleEntry {
            module: "react-native-maps".to_string(),
            platform: Platform::Web.to_string(),
            replacement: replacement.into(),
            exports: REACT_NATIVE_MAPS.iter().map(|name| name.to_string()).collect(),
        };
        let rules = RuleTable::from_rules([rule_from_entry(0, entry)?])?;
        Ok(Self::from_rules(root, ResolverSettings::default(), rules))
    }
}

fn rule_from_entry(index: usize, entry: RuleEntry) -> Result<SubstitutionRule, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRule { index, reason };

    let module = ModuleId::new(entry.module).map_err(|err| invalid(err.to_string()))?;
    let platform: Platform = entry.platform.parse().map_err(invalid)?;
    if entry.replacement.trim().is_empty() {
        return Err(invalid("replacement must be non-empty".to_string()));
    }
    Ok(SubstitutionRule::new(module, platform, entry.replacement).with_exports(entry.exports))
}
