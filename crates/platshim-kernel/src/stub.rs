//! Stub modules: inert export surfaces.
//!
//! A stub declares every name the real module exports and binds each one to
//! `null`. It guarantees that imports succeed; it makes no promise about
//! runtime behavior. Code that calls into a stubbed map component gets `null`.

use crate::error::StubError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Public export surface of `react-native-maps` referenced by the app.
pub const REACT_NATIVE_MAPS: &[&str] = &[
    "default",
    "MapView",
    "Marker",
    "Circle",
    "Polyline",
    "Polygon",
    "Callout",
    "PROVIDER_GOOGLE",
    "PROVIDER_DEFAULT",
];

const DEFAULT_EXPORT: &str = "default";

/// Words that cannot name an `export const` binding in a module.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Module syntax a stub is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubFormat {
    /// `exports.Name = null;`
    CommonJs,

    /// `export const Name = null;`
    EsModule,
}

impl StubFormat {
    /// File extension conventionally used for this variant.
    pub fn extension(self) -> &'static str {
        match self {
            Self::CommonJs => "js",
            Self::EsModule => "mjs",
        }
    }
}

/// A module whose every export is bound to `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubModule {
    pub module: String,
    exports: Vec<String>,
}

impl StubModule {
    /// Build a stub for `module`. The default export is always included;
    /// blank and duplicate names are dropped, declaration order is kept.
    ///
    /// Every other name must be a plain identifier that is not a reserved
    /// word, so both rendered variants declare exactly this surface.
    pub fn new<I, S>(module: impl Into<String>, exports: I) -> Result<Self, StubError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let module = module.into();
        if module.trim().is_empty() {
            return Err(StubError::InvalidModule {
                module,
                reason: "must be non-empty",
            });
        }
        if module
            .chars()
            .any(|c| c.is_control() || c == '\u{2028}' || c == '\u{2029}')
        {
            return Err(StubError::InvalidModule {
                module,
                reason: "must not contain control characters or line breaks",
            });
        }

        let mut ordered = vec![DEFAULT_EXPORT.to_string()];
        for name in exports {
            let name = name.into();
            let name = name.trim();
            if name.is_empty() || ordered.iter().any(|existing| existing == name) {
                continue;
            }
            validate_export_name(name)?;
            ordered.push(name.to_string());
        }
        Ok(Self {
            module,
            exports: ordered,
        })
    }

    pub fn react_native_maps() -> Self {
        Self {
            module: "react-native-maps".to_string(),
            exports: REACT_NATIVE_MAPS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Export names in declaration order, `default` first.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// The exported-symbol set, independent of rendering.
    pub fn exported_symbols(&self) -> BTreeSet<String> {
        self.exports.iter().cloned().collect()
    }

    fn named_exports(&self) -> impl Iterator<Item = &str> {
        self.exports
            .iter()
            .map(String::as_str)
            .filter(|name| *name != DEFAULT_EXPORT)
    }

    /// Render the stub source in `format`.
    pub fn render(&self, format: StubFormat) -> String {
        let mut out = format!(
            "// Inert stand-in for `{}`. Every export is null.\n",
            self.module
        );
        match format {
            StubFormat::CommonJs => {
                out.push_str("'use strict';\n\n");
                out.push_str("Object.defineProperty(exports, '__esModule', { value: true });\n");
                out.push_str("exports.default = null;\n");
                for name in self.named_exports() {
                    out.push_str(&format!("exports.{name} = null;\n"));
                }
            }
            StubFormat::EsModule => {
                out.push_str("export default null;\n");
                for name in self.named_exports() {
                    out.push_str(&format!("export const {name} = null;\n"));
                }
            }
        }
        out
    }
}

/// Export names declared by a stub source, in either module syntax.
///
/// Recognizes the declaration forms stubs are written in: `exports.X =`,
/// `module.exports.X =`, `module.exports = { X: ... }`, `export default`,
/// `export const|let|var|function|class X` and `export { a, b as c }`.
/// It is a line scanner, not a JavaScript parser.
pub fn enumerate_exports(source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut in_object_literal = false;

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if in_object_literal {
            if line.starts_with('}') {
                in_object_literal = false;
                continue;
            }
            if let Some(key) = object_key(line) {
                names.insert(key);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("module.exports") {
            let rest = rest.trim_start();
            if let Some(member) = rest.strip_prefix('.') {
                if let Some(name) = assigned_member(member) {
                    names.insert(name);
                }
            } else if let Some(value) = rest.strip_prefix('=') {
                let value = value.trim();
                if let Some(body) = value.strip_prefix('{') {
                    let (inline, closed) = match body.find('}') {
                        Some(end) => (&body[..end], true),
                        None => (body, false),
                    };
                    for entry in inline.split(',') {
                        if let Some(key) = object_key(entry.trim()) {
                            names.insert(key);
                        }
                    }
                    in_object_literal = !closed;
                } else {
                    names.insert(DEFAULT_EXPORT.to_string());
                }
            }
            continue;
        }

        if let Some(member) = line.strip_prefix("exports.") {
            if let Some(name) = assigned_member(member) {
                names.insert(name);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("export ") {
            let rest = rest.trim_start();
            if rest.starts_with("default") {
                names.insert(DEFAULT_EXPORT.to_string());
            } else if let Some(list) = rest.strip_prefix('{') {
                let list = list.split('}').next().unwrap_or_default();
                for entry in list.split(',') {
                    let exported = entry.rsplit(" as ").next().unwrap_or_default().trim();
                    if is_identifier(exported) {
                        names.insert(exported.to_string());
                    }
                }
            } else {
                let declared = ["const ", "let ", "var ", "function ", "class "]
                    .iter()
                    .find_map(|keyword| rest.strip_prefix(*keyword))
                    .map(leading_identifier);
                if let Some(name) = declared.filter(|name| !name.is_empty()) {
                    names.insert(name.to_string());
                }
            }
        }
    }
    names
}

/// Names in `required` that `declared` does not cover, in `required` order.
pub fn missing_exports<'a>(
    required: impl IntoIterator<Item = &'a str>,
    declared: &BTreeSet<String>,
) -> Vec<String> {
    required
        .into_iter()
        .filter(|name| !declared.contains(*name))
        .map(str::to_string)
        .collect()
}

fn assigned_member(member: &str) -> Option<String> {
    let name = leading_identifier(member);
    let rest = member[name.len()..].trim_start();
    (!name.is_empty() && rest.starts_with('=') && !rest.starts_with("==")).then(|| name.to_string())
}

fn object_key(entry: &str) -> Option<String> {
    let entry = entry.trim_end_matches(',').trim();
    let key = match entry.split_once(':') {
        Some((key, _)) => key.trim(),
        // Shorthand property: `{ MapView, Marker }`.
        None => entry,
    };
    let key = key.trim_matches(|c: char| c == '\'' || c == '"');
    (is_identifier(key) && key != "__esModule").then(|| key.to_string())
}

fn leading_identifier(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    &text[..end]
}

fn is_identifier(text: &str) -> bool {
    let starts_well = text
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    starts_well && leading_identifier(text).len() == text.len()
}

fn validate_export_name(name: &str) -> Result<(), StubError> {
    let invalid = |reason| StubError::InvalidExport {
        name: name.to_string(),
        reason,
    };
    if !is_identifier(name) {
        return Err(invalid("not a JavaScript identifier"));
    }
    if RESERVED_WORDS.contains(&name) {
        return Err(invalid("reserved word"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_surface() -> BTreeSet<String> {
        REACT_NATIVE_MAPS.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn default_export_is_always_present() {
        let stub =
            StubModule::new("expo-haptics", ["impactAsync", "impactAsync", " ", "default"]).unwrap();
        assert_eq!(stub.exports(), ["default", "impactAsync"]);
    }

    #[test]
    fn both_variants_enumerate_to_the_reference_surface() {
        let stub = StubModule::react_native_maps();
        assert_eq!(stub.exported_symbols(), reference_surface());
        for format in [StubFormat::CommonJs, StubFormat::EsModule] {
            assert_eq!(
                enumerate_exports(&stub.render(format)),
                reference_surface(),
                "format {format:?}"
            );
        }
    }

    #[test]
    fn esm_render_is_stable() {
        let stub =
            StubModule::new("expo-haptics", ["impactAsync", "ImpactFeedbackStyle"]).unwrap();
        insta::assert_snapshot!(stub.render(StubFormat::EsModule).trim_end(), @r"
        // Inert stand-in for `expo-haptics`. Every export is null.
        export default null;
        export const impactAsync = null;
        export const ImpactFeedbackStyle = null;
        ");
    }

    #[test]
    fn commonjs_render_is_stable() {
        let stub = StubModule::new("expo-haptics", ["impactAsync"]).unwrap();
        insta::assert_snapshot!(stub.render(StubFormat::CommonJs).trim_end(), @r"
        // Inert stand-in for `expo-haptics`. Every export is null.
        'use strict';

        Object.defineProperty(exports, '__esModule', { value: true });
        exports.default = null;
        exports.impactAsync = null;
        ");
    }

    #[test]
    fn enumerates_hand_written_object_literal_shim() {
        let source = "\
const MapView = () => null;
module.exports = {
  default: MapView,
  MapView,
  Marker: null,
  'PROVIDER_GOOGLE': null,
};
";
        let names = enumerate_exports(source);
        let expected: BTreeSet<String> = ["default", "MapView", "Marker", "PROVIDER_GOOGLE"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn enumerates_inline_object_and_export_lists() {
        let names = enumerate_exports(
            "module.exports = { Circle: null, Polygon: null };\nexport { a as Polyline, Callout };",
        );
        for name in ["Circle", "Polygon", "Polyline", "Callout"] {
            assert!(names.contains(name), "missing {name}");
        }
        assert!(!names.contains("a"));
    }

    #[test]
    fn bare_module_exports_assignment_is_default() {
        assert_eq!(
            enumerate_exports("module.exports = null;"),
            BTreeSet::from(["default".to_string()])
        );
    }

    #[test]
    fn comments_and_comparisons_are_not_exports() {
        let names = enumerate_exports("// exports.Fake = null;\nif (exports.x == null) {}\n");
        assert!(names.is_empty());
    }

    #[test]
    fn missing_exports_reports_in_required_order() {
        let declared = enumerate_exports("export default null;\nexport const Marker = null;\n");
        let missing = missing_exports(REACT_NATIVE_MAPS.iter().copied(), &declared);
        assert_eq!(
            missing,
            [
                "MapView",
                "Circle",
                "Polyline",
                "Polygon",
                "Callout",
                "PROVIDER_GOOGLE",
                "PROVIDER_DEFAULT"
            ]
        );
    }

    #[test]
    fn rendered_surface_matches_for_unusual_identifiers() {
        let stub = StubModule::new("lottie-react-native", ["$animate", "_private", "Ünïcode", "x1"])
            .unwrap();
        for format in [StubFormat::CommonJs, StubFormat::EsModule] {
            assert_eq!(
                enumerate_exports(&stub.render(format)),
                stub.exported_symbols(),
                "format {format:?}"
            );
        }
    }

    #[test]
    fn non_identifier_export_names_are_rejected() {
        for name in ["foo-bar", "1st", "a b", "Map.View", "x;alert(1)"] {
            let err = StubModule::new("x", [name]).unwrap_err();
            assert!(
                matches!(err, StubError::InvalidExport { .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn reserved_word_export_names_are_rejected() {
        let err = StubModule::new("x", ["MapView", "class"]).unwrap_err();
        assert_eq!(
            err,
            StubError::InvalidExport {
                name: "class".to_string(),
                reason: "reserved word",
            }
        );
    }

    #[test]
    fn module_id_with_line_break_is_rejected() {
        let err = StubModule::new("maps\nexports.evil = 1;", ["MapView"]).unwrap_err();
        assert!(matches!(err, StubError::InvalidModule { .. }));
        assert!(StubModule::new("  ", ["MapView"]).is_err());
    }
}
