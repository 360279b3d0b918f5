//! Substitution rule tables.
//!
//! A [`RuleTable`] is the single declarative source both build pipelines are
//! derived from. It is built once when configuration loads and is read-only
//! afterwards, so it can be shared across resolver threads behind an `Arc`
//! without locking.

use crate::error::ConfigError;
use crate::platform::Platform;
use crate::request::{ModuleId, ResolutionRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const RULE_DIGEST_PREFIX: &str = "rt1_";

/// One `(module, platform) → replacement` override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRule {
    pub module: ModuleId,
    pub platform: Platform,
    pub replacement: PathBuf,

    /// Export names the replacement must declare. Empty means unchecked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
}

impl SubstitutionRule {
    pub fn new(module: ModuleId, platform: Platform, replacement: impl Into<PathBuf>) -> Self {
        Self {
            module,
            platform,
            replacement: replacement.into(),
            exports: Vec::new(),
        }
    }

    pub fn with_exports<I, S>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = exports.into_iter().map(Into::into).collect();
        self
    }
}

type RuleKey = (ModuleId, Platform);

/// Exact-key lookup table of substitution rules.
///
/// At most one rule exists per `(module, platform)` pair, so a lookup can
/// never be ambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: BTreeMap<RuleKey, SubstitutionRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting duplicate keys.
    pub fn from_rules(rules: impl IntoIterator<Item = SubstitutionRule>) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for rule in rules {
            table.insert(rule)?;
        }
        Ok(table)
    }

    /// Add a rule. A second rule for the same key is a configuration error.
    pub fn insert(&mut self, rule: SubstitutionRule) -> Result<(), ConfigError> {
        let key = (rule.module.clone(), rule.platform);
        if self.rules.contains_key(&key) {
            return Err(ConfigError::DuplicateRule {
                module: rule.module.to_string(),
                platform: rule.platform,
            });
        }
        self.rules.insert(key, rule);
        Ok(())
    }

    /// The rule matching `module` exactly on `platform`, if any.
    pub fn lookup(&self, module: &ModuleId, platform: Platform) -> Option<&SubstitutionRule> {
        self.rules.get(&(module.clone(), platform))
    }

    pub fn matching(&self, request: &ResolutionRequest) -> Option<&SubstitutionRule> {
        self.lookup(&request.module, request.platform)
    }

    /// Rules in deterministic `(module, platform)` order.
    pub fn rules(&self) -> impl Iterator<Item = &SubstitutionRule> {
        self.rules.values()
    }

    pub fn for_platform(&self, platform: Platform) -> impl Iterator<Item = &SubstitutionRule> {
        self.rules().filter(move |rule| rule.platform == platform)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite every relative replacement path onto `base`.
    pub fn rebase(self, base: &Path) -> Self {
        let rules = self
            .rules
            .into_iter()
            .map(|(key, mut rule)| {
                if rule.replacement.is_relative() {
                    rule.replacement = base.join(&rule.replacement);
                }
                (key, rule)
            })
            .collect();
        Self { rules }
    }

    /// Deterministic digest over the canonical rule rows.
    ///
    /// Both pipeline adapters stamp this digest into their outputs, so a
    /// static alias table can be traced back to the rule table it came from.
    pub fn digest(&self) -> String {
        let mut material = Vec::new();
        for rule in self.rules() {
            material.push(rule.module.as_str().to_string());
            material.push(rule.platform.as_str().to_string());
            material.push(rule.replacement.to_string_lossy().replace('\\', "/"));
        }
        let joined = material.join("\u{0000}");
        format!("{RULE_DIGEST_PREFIX}{}", digest_bytes(joined.as_bytes()))
    }
}

fn digest_bytes(bytes: &[u8]) -> String {
    let mut digest = Sha256::new();
    digest.update(bytes);
    let output = digest.finalize();
    let mut rendered = String::with_capacity(output.len() * 2);
    for byte in output {
        rendered.push_str(format!("{byte:02x}").as_str());
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps() -> ModuleId {
        ModuleId::new("react-native-maps").unwrap()
    }

    #[test]
    fn lookup_is_exact_on_module_and_platform() {
        let table = RuleTable::from_rules([SubstitutionRule::new(
            maps(),
            Platform::Web,
            "shims/maps.web.js",
        )])
        .unwrap();

        assert!(table.lookup(&maps(), Platform::Web).is_some());
        assert!(table.lookup(&maps(), Platform::Native).is_none());
        assert!(
            table
                .lookup(&ModuleId::new("react-native-maps/lib").unwrap(), Platform::Web)
                .is_none()
        );
        assert!(
            table
                .lookup(&ModuleId::new("react-native").unwrap(), Platform::Web)
                .is_none()
        );
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let err = RuleTable::from_rules([
            SubstitutionRule::new(maps(), Platform::Web, "a.js"),
            SubstitutionRule::new(maps(), Platform::Web, "b.js"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateRule {
                platform: Platform::Web,
                ..
            }
        ));
    }

    #[test]
    fn same_module_on_two_platforms_is_two_rules() {
        let table = RuleTable::from_rules([
            SubstitutionRule::new(maps(), Platform::Web, "a.js"),
            SubstitutionRule::new(maps(), Platform::Android, "b.js"),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.for_platform(Platform::Web).count(), 1);
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = RuleTable::from_rules([SubstitutionRule::new(maps(), Platform::Web, "a.js")])
            .unwrap();
        let a_again =
            RuleTable::from_rules([SubstitutionRule::new(maps(), Platform::Web, "a.js")])
                .unwrap();
        let b = RuleTable::from_rules([SubstitutionRule::new(maps(), Platform::Web, "b.js")])
            .unwrap();

        assert!(a.digest().starts_with(RULE_DIGEST_PREFIX));
        assert_eq!(a.digest().len(), RULE_DIGEST_PREFIX.len() + 64);
        assert_eq!(a.digest(), a_again.digest());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn digest_ignores_export_lists() {
        let plain = RuleTable::from_rules([SubstitutionRule::new(maps(), Platform::Web, "a.js")])
            .unwrap();
        let with_exports = RuleTable::from_rules([
            SubstitutionRule::new(maps(), Platform::Web, "a.js").with_exports(["default"]),
        ])
        .unwrap();
        assert_eq!(plain.digest(), with_exports.digest());
    }

    #[test]
    fn rebase_only_touches_relative_paths() {
        let absolute = if cfg!(windows) { "C:\\shims\\x.js" } else { "/shims/x.js" };
        let table = RuleTable::from_rules([
            SubstitutionRule::new(maps(), Platform::Web, "shims/maps.js"),
            SubstitutionRule::new(ModuleId::new("other").unwrap(), Platform::Web, absolute),
        ])
        .unwrap()
        .rebase(Path::new("/project"));

        assert_eq!(
            table.lookup(&maps(), Platform::Web).unwrap().replacement,
            Path::new("/project").join("shims/maps.js")
        );
        assert_eq!(
            table
                .lookup(&ModuleId::new("other").unwrap(), Platform::Web)
                .unwrap()
                .replacement,
            PathBuf::from(absolute)
        );
    }
}
