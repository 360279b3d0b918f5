//! Cross-pipeline sync check.
//!
//! Confirms that every replacement exists and declares the exports its rule
//! requires, and that a committed alias table still matches the rule table.

use crate::alias::AliasTable;
use platshim_kernel::{Platform, ShimConfig, enumerate_exports, missing_exports};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use tracing::debug;

pub const SYNC_CHECK_KIND: &str = "platshim.sync_check.v1";
const SYNC_CHECK_DIGEST_PREFIX: &str = "sc1_";

pub mod failure_class {
    pub const REPLACEMENT_MISSING: &str = "replacement_missing";
    pub const REPLACEMENT_UNREADABLE: &str = "replacement_unreadable";
    pub const REPLACEMENT_EXPORTS_MISSING: &str = "replacement_exports_missing";
    pub const ALIAS_DIGEST_STALE: &str = "alias_digest_stale";
    pub const ALIAS_PLATFORM_MISMATCH: &str = "alias_platform_mismatch";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCheckIssue {
    pub failure_class: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCheckReport {
    pub schema: u32,
    pub check_kind: String,
    pub platform: Platform,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub issues: Vec<SyncCheckIssue>,
    pub rule_count: usize,
    pub rule_digest: String,
    pub alias_checked: bool,
    pub semantic_digest: String,
}

impl SyncCheckReport {
    pub fn accepted(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check replacements for every rule, and `committed` against the alias
/// table derived for `platform`.
pub fn check_pipelines(
    config: &ShimConfig,
    committed: Option<&AliasTable>,
    platform: Platform,
) -> SyncCheckReport {
    let mut issues = Vec::new();

    for rule in config.resolved_rules().rules() {
        let path = format!("substitution/{}/{}", rule.module, rule.platform);
        debug!(%path, "checking replacement");
        let source = match fs::read_to_string(&rule.replacement) {
            Ok(source) => source,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                issues.push(SyncCheckIssue {
                    failure_class: failure_class::REPLACEMENT_MISSING.to_string(),
                    path,
                    message: format!("missing file: {}", rule.replacement.display()),
                });
                continue;
            }
            Err(err) => {
                issues.push(SyncCheckIssue {
                    failure_class: failure_class::REPLACEMENT_UNREADABLE.to_string(),
                    path,
                    message: format!("failed to read {}: {err}", rule.replacement.display()),
                });
                continue;
            }
        };

        if rule.exports.is_empty() {
            continue;
        }
        let declared = enumerate_exports(&source);
        let missing = missing_exports(rule.exports.iter().map(String::as_str), &declared);
        if !missing.is_empty() {
            issues.push(SyncCheckIssue {
                failure_class: failure_class::REPLACEMENT_EXPORTS_MISSING.to_string(),
                path,
                message: format!(
                    "{} does not declare: {}",
                    rule.replacement.display(),
                    missing.join(", ")
                ),
            });
        }
    }

    let derived = AliasTable::derive(config.rules(), platform);
    if let Some(committed) = committed {
        if committed.platform != platform {
            issues.push(SyncCheckIssue {
                failure_class: failure_class::ALIAS_PLATFORM_MISMATCH.to_string(),
                path: "alias/platform".to_string(),
                message: format!(
                    "alias table targets {} but {} was checked",
                    committed.platform, platform
                ),
            });
        }
        if let Some(digest) = committed.rule_digest.as_deref()
            && Some(digest) != derived.rule_digest.as_deref()
        {
            issues.push(SyncCheckIssue {
                failure_class: failure_class::ALIAS_DIGEST_STALE.to_string(),
                path: "alias/ruleDigest".to_string(),
                message: format!("alias table was derived from rule table {digest}"),
            });
        }
        for row in derived.drift_against(committed) {
            let message = match (&row.expected, &row.actual) {
                (Some(expected), Some(actual)) => format!("expected {expected}, found {actual}"),
                (Some(expected), None) => format!("expected {expected}, not aliased"),
                (None, Some(actual)) => format!("aliased to {actual} without a rule"),
                (None, None) => String::new(),
            };
            issues.push(SyncCheckIssue {
                failure_class: row.kind.failure_class().to_string(),
                path: format!("alias/{}", row.module),
                message,
            });
        }
    }

    issues.sort_by(|a, b| {
        (&a.failure_class, &a.path, &a.message).cmp(&(&b.failure_class, &b.path, &b.message))
    });
    let mut failure_classes: Vec<String> = issues
        .iter()
        .map(|issue| issue.failure_class.clone())
        .collect();
    failure_classes.sort();
    failure_classes.dedup();
    let result = if issues.is_empty() {
        "accepted".to_string()
    } else {
        "rejected".to_string()
    };
    let rule_digest = config.rules().digest();
    let semantic_digest = sync_check_digest(&result, &failure_classes, &rule_digest, platform);

    SyncCheckReport {
        schema: 1,
        check_kind: SYNC_CHECK_KIND.to_string(),
        platform,
        result,
        failure_classes,
        issues,
        rule_count: config.rules().len(),
        rule_digest,
        alias_checked: committed.is_some(),
        semantic_digest,
    }
}

fn sync_check_digest(
    result: &str,
    failure_classes: &[String],
    rule_digest: &str,
    platform: Platform,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SYNC_CHECK_KIND.as_bytes());
    hasher.update([0u8]);
    hasher.update(platform.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(rule_digest.as_bytes());
    hasher.update([0u8]);
    hasher.update(result.as_bytes());
    hasher.update([0u8]);
    for class in failure_classes {
        hasher.update(class.as_bytes());
        hasher.update([0u8]);
    }
    format!("{SYNC_CHECK_DIGEST_PREFIX}{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use platshim_kernel::{StubFormat, StubModule};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    const CONFIG: &str = r#"
[[substitution]]
module = "react-native-maps"
platform = "web"
replacement = "shims/react-native-maps.web.js"
exports = ["default", "MapView", "Marker", "Circle", "Polyline", "Polygon", "Callout", "PROVIDER_GOOGLE", "PROVIDER_DEFAULT"]
"#;

    fn temp_root(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("platshim-check-{prefix}-{unique}"));
        fs::create_dir_all(root.join("shims")).expect("temp dir should be created");
        root
    }

    fn write_shim(root: &PathBuf, source: &str) {
        fs::write(root.join("shims/react-native-maps.web.js"), source)
            .expect("shim should be written");
    }

    #[test]
    fn complete_setup_is_accepted() {
        let root = temp_root("accepted");
        write_shim(
            &root,
            &StubModule::react_native_maps().render(StubFormat::EsModule),
        );
        let config = ShimConfig::parse(CONFIG, &root).unwrap();
        let committed = AliasTable::derive(config.rules(), Platform::Web);

        let report = check_pipelines(&config, Some(&committed), Platform::Web);
        assert!(report.accepted(), "{:?}", report.issues);
        assert_eq!(report.result, "accepted");
        assert!(report.alias_checked);
        assert!(report.semantic_digest.starts_with(SYNC_CHECK_DIGEST_PREFIX));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_replacement_is_reported() {
        let root = temp_root("missing");
        let config = ShimConfig::parse(CONFIG, &root).unwrap();
        let report = check_pipelines(&config, None, Platform::Web);
        assert_eq!(report.result, "rejected");
        assert_eq!(report.failure_classes, [failure_class::REPLACEMENT_MISSING]);
        assert_eq!(report.issues[0].path, "substitution/react-native-maps/web");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn partial_stub_reports_missing_exports() {
        let root = temp_root("partial");
        write_shim(&root, "export default null;\nexport const MapView = null;\n");
        let config = ShimConfig::parse(CONFIG, &root).unwrap();
        let report = check_pipelines(&config, None, Platform::Web);
        assert_eq!(
            report.failure_classes,
            [failure_class::REPLACEMENT_EXPORTS_MISSING]
        );
        assert!(report.issues[0].message.contains("Marker"));
        assert!(!report.issues[0].message.contains("MapView,"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn drifted_alias_table_is_rejected() {
        let root = temp_root("drift");
        write_shim(
            &root,
            &StubModule::react_native_maps().render(StubFormat::CommonJs),
        );
        let config = ShimConfig::parse(CONFIG, &root).unwrap();
        let mut committed = AliasTable::derive(config.rules(), Platform::Web);
        committed.alias.clear();
        committed.rule_digest = Some("rt1_stale".to_string());

        let report = check_pipelines(&config, Some(&committed), Platform::Web);
        assert_eq!(
            report.failure_classes,
            [failure_class::ALIAS_DIGEST_STALE, "alias_missing"]
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn alias_for_other_platform_is_flagged() {
        let root = temp_root("platform");
        write_shim(
            &root,
            &StubModule::react_native_maps().render(StubFormat::EsModule),
        );
        let config = ShimConfig::parse(CONFIG, &root).unwrap();
        let committed = AliasTable::derive(config.rules(), Platform::Ios);

        let report = check_pipelines(&config, Some(&committed), Platform::Web);
        assert!(
            report
                .failure_classes
                .contains(&failure_class::ALIAS_PLATFORM_MISMATCH.to_string())
        );
        let _ = fs::remove_dir_all(&root);
    }
}
