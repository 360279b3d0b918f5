//! Static alias-table pipeline.
//!
//! Some bundlers cannot run a resolve hook and only accept a fixed
//! `module → path` map. That map is derived from the same [`RuleTable`] the
//! interception pipeline uses and stamped with the table's digest.
//!
//! Targets are `./`-anchored so alias resolvers never read them as package
//! names. They are relative to `root`, which is itself relative to the
//! directory the table is written to.
//!
//! A committed alias table can fall out of step with the rule table. Drift is
//! reported row by row; it is never repaired silently.

use crate::error::PipelineError;
use platshim_kernel::{Platform, RuleTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const ALIAS_TABLE_KIND: &str = "platshim.alias_table.v1";
const ALIAS_TABLE_SCHEMA: u32 = 1;

/// A `module → replacement` map for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasTable {
    pub schema: u32,
    pub table_kind: String,
    pub platform: Platform,
    /// Digest of the rule table this map was derived from. Absent for
    /// hand-maintained maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_digest: Option<String>,
    /// Directory the targets are anchored at, relative to the table file.
    #[serde(default = "default_root")]
    pub root: String,
    pub alias: BTreeMap<String, String>,
}

fn default_root() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// The rule table substitutes a module the committed map does not alias.
    Missing,

    /// The committed map aliases a module no rule substitutes.
    Unexpected,

    /// Both alias the module, to different paths.
    Mismatched,
}

impl DriftKind {
    pub fn failure_class(self) -> &'static str {
        match self {
            Self::Missing => "alias_missing",
            Self::Unexpected => "alias_unexpected",
            Self::Mismatched => "alias_mismatched",
        }
    }
}

/// One row of difference between a derived and a committed alias table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasDrift {
    pub module: String,
    pub kind: DriftKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl AliasTable {
    /// Derive the alias map for `platform` from the shared rule table.
    pub fn derive(rules: &RuleTable, platform: Platform) -> Self {
        let alias = rules
            .for_platform(platform)
            .map(|rule| {
                (
                    rule.module.to_string(),
                    anchor_alias_path(&rule.replacement),
                )
            })
            .collect();
        Self {
            schema: ALIAS_TABLE_SCHEMA,
            table_kind: ALIAS_TABLE_KIND.to_string(),
            platform,
            rule_digest: Some(rules.digest()),
            root: default_root(),
            alias,
        }
    }

    /// Anchor the table for a file written into `table_dir`, when the rule
    /// table was loaded from `config_root`.
    pub fn anchored_at(mut self, table_dir: &Path, config_root: &Path) -> Self {
        self.root = relative_root(table_dir, config_root);
        self
    }

    /// The file `module` is aliased to, for a table read from `table_dir`.
    pub fn target(&self, module: &str, table_dir: &Path) -> Option<PathBuf> {
        let target = self.alias.get(module)?;
        Some(table_dir.join(&self.root).join(target))
    }

    /// Read a committed alias table.
    ///
    /// Accepts either a full table document or a bare `{ "module": "path" }`
    /// object, in which case `platform` is assumed.
    pub fn load(path: impl AsRef<Path>, platform: Platform) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PipelineError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&text).map_err(|source| PipelineError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_value(value, platform).map_err(|reason| PipelineError::InvalidAliasTable {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_value(value: Value, platform: Platform) -> Result<Self, String> {
        let Some(object) = value.as_object() else {
            return Err("json root must be object".to_string());
        };
        if object.contains_key("alias") {
            return serde_json::from_value(value).map_err(|err| err.to_string());
        }

        let mut alias = BTreeMap::new();
        for (module, target) in object {
            let Some(target) = target.as_str() else {
                return Err(format!("alias for `{module}` must be a string"));
            };
            alias.insert(module.clone(), target.to_string());
        }
        Ok(Self {
            schema: ALIAS_TABLE_SCHEMA,
            table_kind: ALIAS_TABLE_KIND.to_string(),
            platform,
            rule_digest: None,
            root: default_root(),
            alias,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Rows where `committed` differs from this (derived) table, sorted by
    /// module then kind.
    pub fn drift_against(&self, committed: &AliasTable) -> Vec<AliasDrift> {
        let mut drift = Vec::new();
        for (module, expected) in &self.alias {
            match committed.alias.get(module) {
                None => drift.push(AliasDrift {
                    module: module.clone(),
                    kind: DriftKind::Missing,
                    expected: Some(expected.clone()),
                    actual: None,
                }),
                Some(actual) if normalize_alias_path(actual) != normalize_alias_path(expected) => {
                    drift.push(AliasDrift {
                        module: module.clone(),
                        kind: DriftKind::Mismatched,
                        expected: Some(expected.clone()),
                        actual: Some(actual.clone()),
                    })
                }
                Some(_) => {}
            }
        }
        for (module, actual) in &committed.alias {
            if !self.alias.contains_key(module) {
                drift.push(AliasDrift {
                    module: module.clone(),
                    kind: DriftKind::Unexpected,
                    expected: None,
                    actual: Some(actual.clone()),
                });
            }
        }
        drift.sort_by(|a, b| (&a.module, a.kind).cmp(&(&b.module, b.kind)));
        drift
    }
}

/// Relative replacements gain a leading `./`; absolute ones are kept.
fn anchor_alias_path(replacement: &Path) -> String {
    let path = normalize_alias_path(&replacement.to_string_lossy());
    if replacement.is_absolute() || path.starts_with("../") {
        path
    } else {
        format!("./{path}")
    }
}

/// Path from `table_dir` to `config_root`, with forward slashes.
///
/// Falls back to the absolute config root when neither directory contains
/// the other.
fn relative_root(table_dir: &Path, config_root: &Path) -> String {
    let table_dir = fs::canonicalize(table_dir).unwrap_or_else(|_| table_dir.to_path_buf());
    let config_root = fs::canonicalize(config_root).unwrap_or_else(|_| config_root.to_path_buf());

    if let Ok(rest) = table_dir.strip_prefix(&config_root) {
        let depth = rest
            .components()
            .filter(|component| matches!(component, Component::Normal(_)))
            .count();
        return match depth {
            0 => default_root(),
            _ => vec![".."; depth].join("/"),
        };
    }
    if let Ok(rest) = config_root.strip_prefix(&table_dir) {
        return format!("./{}", normalize_alias_path(&rest.to_string_lossy()));
    }
    config_root.to_string_lossy().replace('\\', "/")
}

/// Forward slashes, no leading `./`. Used only to compare targets.
fn normalize_alias_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let mut rest = path.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::InterceptPipeline;
    use platshim_kernel::{ModuleId, ResolutionRequest, ShimConfig, SubstitutionRule};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("platshim-alias-{prefix}-{unique}"));
        fs::create_dir_all(root.join("build/web")).expect("temp dir should be created");
        root
    }

    fn rules() -> RuleTable {
        RuleTable::from_rules([
            SubstitutionRule::new(
                ModuleId::new("react-native-maps").unwrap(),
                Platform::Web,
                "shims/react-native-maps.web.js",
            ),
            SubstitutionRule::new(
                ModuleId::new("expo-haptics").unwrap(),
                Platform::Web,
                "shims/haptics.js",
            ),
            SubstitutionRule::new(
                ModuleId::new("react-native-web-maps").unwrap(),
                Platform::Android,
                "shims/web-maps.android.js",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn derive_keeps_only_the_requested_platform() {
        let table = AliasTable::derive(&rules(), Platform::Web);
        assert_eq!(table.alias.len(), 2);
        assert_eq!(
            table.alias.get("react-native-maps").map(String::as_str),
            Some("./shims/react-native-maps.web.js")
        );
        assert_eq!(table.root, ".");
        assert!(!table.alias.contains_key("react-native-web-maps"));
        assert_eq!(table.rule_digest, Some(rules().digest()));
    }

    #[test]
    fn alias_and_intercept_targets_name_the_same_file() {
        let config = ShimConfig::parse(
            r#"
[[substitution]]
module = "react-native-maps"
platform = "web"
replacement = "./shims/maps.web.js"
"#,
            "/proj",
        )
        .unwrap();
        let table = AliasTable::derive(config.rules(), Platform::Web);
        assert_eq!(table.alias["react-native-maps"], "./shims/maps.web.js");

        let request = ResolutionRequest::bare("react-native-maps", Platform::Web).unwrap();
        let intercepted = InterceptPipeline::install_unverified(&config, None)
            .resolve(&request)
            .unwrap();
        assert_eq!(
            table.target("react-native-maps", Path::new("/proj")).as_deref(),
            intercepted.file_path()
        );
    }

    #[test]
    fn absolute_replacements_are_kept_as_is() {
        let table = AliasTable::derive(
            &RuleTable::from_rules([SubstitutionRule::new(
                ModuleId::new("expo-haptics").unwrap(),
                Platform::Web,
                "/opt/shims/haptics.js",
            )])
            .unwrap(),
            Platform::Web,
        );
        assert_eq!(table.alias["expo-haptics"], "/opt/shims/haptics.js");
    }

    #[test]
    fn table_written_below_the_config_root_points_back_up() {
        let root = temp_root("below");
        let table =
            AliasTable::derive(&rules(), Platform::Web).anchored_at(&root.join("build/web"), &root);
        assert_eq!(table.root, "../..");
        assert_eq!(
            table.target("expo-haptics", &root.join("build/web")),
            Some(root.join("build/web/../.././shims/haptics.js"))
        );

        let above = AliasTable::derive(&rules(), Platform::Web).anchored_at(&root, &root.join("build"));
        assert_eq!(above.root, "./build");
        let same = AliasTable::derive(&rules(), Platform::Web).anchored_at(&root, &root);
        assert_eq!(same.root, ".");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn derived_table_has_no_drift_against_itself() {
        let table = AliasTable::derive(&rules(), Platform::Web);
        assert!(table.drift_against(&table).is_empty());
    }

    #[test]
    fn bare_map_with_dot_prefix_is_in_sync() {
        let committed = AliasTable::from_value(
            json!({
                "react-native-maps": "./shims/react-native-maps.web.js",
                "expo-haptics": "shims/haptics.js"
            }),
            Platform::Web,
        )
        .unwrap();
        assert_eq!(committed.rule_digest, None);
        let derived = AliasTable::derive(&rules(), Platform::Web);
        assert!(derived.drift_against(&committed).is_empty());
    }

    #[test]
    fn drift_rows_are_classified() {
        let committed = AliasTable::from_value(
            json!({
                "react-native-maps": "shims/old-maps.js",
                "lottie-react-native": "shims/lottie.js"
            }),
            Platform::Web,
        )
        .unwrap();
        let drift = AliasTable::derive(&rules(), Platform::Web).drift_against(&committed);
        let kinds: Vec<(&str, DriftKind)> = drift
            .iter()
            .map(|row| (row.module.as_str(), row.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                ("expo-haptics", DriftKind::Missing),
                ("lottie-react-native", DriftKind::Unexpected),
                ("react-native-maps", DriftKind::Mismatched),
            ]
        );
        assert_eq!(drift[2].actual.as_deref(), Some("shims/old-maps.js"));
    }

    #[test]
    fn full_document_round_trips() {
        let table = AliasTable::derive(&rules(), Platform::Web);
        let value: Value = serde_json::from_str(&table.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["tableKind"], ALIAS_TABLE_KIND);
        assert_eq!(value["platform"], "web");
        let parsed = AliasTable::from_value(value, Platform::Ios).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn non_string_alias_is_rejected() {
        let err = AliasTable::from_value(json!({"react-native-maps": 1}), Platform::Web)
            .unwrap_err();
        assert!(err.contains("react-native-maps"));
        assert!(AliasTable::from_value(json!([]), Platform::Web).is_err());
    }
}
