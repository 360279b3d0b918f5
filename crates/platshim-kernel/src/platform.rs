//! Build target platforms.
//!
//! The platform is supplied by the host bundler per request. It is the only
//! piece of the request, besides the module identifier, that substitution
//! rules are keyed on.

/// The deployment target a module is being resolved for.
///
/// A closed set: a rule can only name one of these, so a typo in the
/// configuration is rejected at load time instead of silently never matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Platform {
    /// iOS native build.
    Ios,

    /// Android native build.
    Android,

    /// Generic native-mobile build, used by tools that do not split by OS.
    Native,

    /// Browser build. The platform most substitutions exist for.
    Web,
}

impl Platform {
    pub const ALL: [Platform; 4] = [Self::Ios, Self::Android, Self::Native, Self::Web];

    /// Canonical lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Native => "native",
            Self::Web => "web",
        }
    }

    /// Whether this platform runs native mobile code.
    pub fn is_native(self) -> bool {
        !matches!(self, Self::Web)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "native" | "native-mobile" | "native_mobile" => Ok(Self::Native),
            "web" | "browser" => Ok(Self::Web),
            _ => Err(format!("unknown platform: {s}")),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
