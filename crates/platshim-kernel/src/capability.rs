//! Platform capability bindings.
//!
//! Application code should not branch on the platform at every import of a
//! native-only library. It asks once which binding the platform gets: the
//! real module or its stub.

use crate::platform::Platform;
use crate::request::ModuleId;
use crate::rules::RuleTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which implementation of a capability a platform is built against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "binding", rename_all = "snake_case")]
pub enum ModuleBinding {
    /// The real module; the platform can host it.
    Real { module: ModuleId },

    /// The inert stub served in its place.
    Stub {
        module: ModuleId,
        replacement: PathBuf,
    },
}

impl ModuleBinding {
    /// Select the binding for `module` on `platform` from the rule table.
    pub fn select(rules: &RuleTable, module: &ModuleId, platform: Platform) -> Self {
        match rules.lookup(module, platform) {
            Some(rule) => Self::Stub {
                module: module.clone(),
                replacement: rule.replacement.clone(),
            },
            None => Self::Real {
                module: module.clone(),
            },
        }
    }

    /// Bindings for every platform, in [`Platform::ALL`] order.
    pub fn matrix(rules: &RuleTable, module: &ModuleId) -> Vec<(Platform, Self)> {
        Platform::ALL
            .into_iter()
            .map(|platform| (platform, Self::select(rules, module, platform)))
            .collect()
    }

    pub fn module(&self) -> &ModuleId {
        match self {
            Self::Real { module } | Self::Stub { module, .. } => module,
        }
    }

    /// Whether calls into this binding have real behavior.
    pub fn is_functional(&self) -> bool {
        matches!(self, Self::Real { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::SubstitutionRule;

    #[test]
    fn web_gets_stub_native_gets_real() {
        let maps = ModuleId::new("react-native-maps").unwrap();
        let rules = RuleTable::from_rules([SubstitutionRule::new(
            maps.clone(),
            Platform::Web,
            "shims/maps.web.js",
        )])
        .unwrap();

        let matrix = ModuleBinding::matrix(&rules, &maps);
        for (platform, binding) in &matrix {
            assert_eq!(binding.module(), &maps);
            assert_eq!(binding.is_functional(), platform.is_native(), "{platform}");
        }
        assert_eq!(
            ModuleBinding::select(&rules, &maps, Platform::Web),
            ModuleBinding::Stub {
                module: maps.clone(),
                replacement: PathBuf::from("shims/maps.web.js"),
            }
        );
    }
}
