//! Typed view of `extension.json` and the template used to synthesize one.
//!
//! Parsing is lenient: every recognized field is optional and any key this
//! crate does not know about is kept in [`ExtensionManifest::extra`] so a
//! manifest can be read and written back without losing data.
//!
//! # Examples
//!
//! ```
//! use clonebuddy_core::{ExtensionManifest, ManifestFlag, ManifestTemplate};
//!
//! let manifest = ManifestTemplate::new("myTool")
//!     .url("https://example.com/x.git")
//!     .build();
//! assert_eq!(manifest.name.as_deref(), Some("myTool"));
//! assert_eq!(manifest.default_enabled, Some(ManifestFlag(true)));
//!
//! let raw = manifest.to_pretty_json().unwrap();
//! let parsed = ExtensionManifest::from_json_str(&raw).unwrap();
//! assert_eq!(parsed, manifest);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Description written into synthesized manifests.
pub const DEFAULT_DESCRIPTION: &str = "Auto-generated extension.json by CloneBuddy";

/// Author written into synthesized manifests unless configured otherwise.
pub const DEFAULT_AUTHOR: &str = "Auto-Generated";

/// Boolean manifest flag.
///
/// The host writes these as the strings `"True"`/`"False"`; plain JSON
/// booleans are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestFlag(pub bool);

impl Serialize for ManifestFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0 { "True" } else { "False" })
    }
}

impl<'de> Deserialize<'de> for ManifestFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFlag {
            Bool(bool),
            Text(String),
        }

        match RawFlag::deserialize(deserializer)? {
            RawFlag::Bool(value) => Ok(Self(value)),
            RawFlag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Self(true)),
                "false" => Ok(Self(false)),
                other => Err(serde::de::Error::custom(format!(
                    "invalid flag value '{other}', expected true or false"
                ))),
            },
        }
    }
}

/// Package manifest (`extension.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rocket_mode_compatible: Option<ManifestFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<ManifestFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_enabled: Option<ManifestFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Keys not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtensionManifest {
    /// Parses a manifest, tolerating a leading byte-order mark.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(strip_bom(raw))
    }

    /// Serializes with 4-space indentation, matching the host's own files.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Removes a UTF-8 byte-order mark, if any.
pub(crate) fn strip_bom(raw: &str) -> &str {
    raw.strip_prefix('\u{feff}').unwrap_or(raw)
}

/// Builder for a freshly synthesized manifest.
///
/// Fields the template does not take as input are fixed: `type` is
/// `"extension"`, the package is not builtin, enabled by default, not
/// rocket-mode compatible, and has no dependencies.
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    name: String,
    url: String,
    author: String,
    author_profile: String,
    description: String,
}

impl ManifestTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            author: DEFAULT_AUTHOR.to_string(),
            author_profile: DEFAULT_AUTHOR.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into().trim().to_string();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn author_profile(mut self, profile: impl Into<String>) -> Self {
        self.author_profile = profile.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn build(self) -> ExtensionManifest {
        ExtensionManifest {
            kind: Some("extension".to_string()),
            rocket_mode_compatible: Some(ManifestFlag(false)),
            builtin: Some(ManifestFlag(false)),
            default_enabled: Some(ManifestFlag(true)),
            description: Some(self.description),
            dependencies: Some(Vec::new()),
            name: Some(self.name),
            author: Some(self.author),
            author_profile: Some(self.author_profile),
            url: Some(self.url),
            website: Some(String::new()),
            image: Some(String::new()),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_fills_fixed_fields() {
        let manifest = ManifestTemplate::new("HT")
            .url(" https://github.com/org/HT.git ")
            .author("Hani")
            .build();

        assert_eq!(manifest.kind.as_deref(), Some("extension"));
        assert_eq!(manifest.builtin, Some(ManifestFlag(false)));
        assert_eq!(manifest.rocket_mode_compatible, Some(ManifestFlag(false)));
        assert_eq!(manifest.default_enabled, Some(ManifestFlag(true)));
        assert_eq!(manifest.url.as_deref(), Some("https://github.com/org/HT.git"));
        assert_eq!(manifest.author.as_deref(), Some("Hani"));
        assert_eq!(manifest.author_profile.as_deref(), Some(DEFAULT_AUTHOR));
        assert_eq!(manifest.dependencies, Some(Vec::new()));
        assert_eq!(manifest.website.as_deref(), Some(""));
    }

    #[test]
    fn test_pretty_json_uses_host_conventions() {
        let raw = ManifestTemplate::new("HT").build().to_pretty_json().unwrap();
        assert!(raw.starts_with("{\n    \"type\": \"extension\""));
        assert!(raw.contains("\"builtin\": \"False\""));
        assert!(raw.contains("\"default_enabled\": \"True\""));
        assert!(raw.contains("\"dependencies\": []"));

        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["name"], "HT");
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = r#"{
            "name": "Search",
            "builtin": false,
            "default_enabled": "true",
            "templates": {"author": "x"},
            "min_version": 4
        }"#;
        let manifest = ExtensionManifest::from_json_str(raw).unwrap();
        assert_eq!(manifest.builtin, Some(ManifestFlag(false)));
        assert_eq!(manifest.default_enabled, Some(ManifestFlag(true)));
        assert_eq!(manifest.extra.len(), 2);

        let written = manifest.to_pretty_json().unwrap();
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["templates"]["author"], "x");
        assert_eq!(value["min_version"], 4);
        assert!(value.get("url").is_none());
    }

    #[test]
    fn test_unknown_keys_keep_their_order() {
        let raw = r#"{"name": "X", "zeta": 1, "alpha": 2, "mid": {"b": 1, "a": 2}}"#;
        let written = ExtensionManifest::from_json_str(raw)
            .unwrap()
            .to_pretty_json()
            .unwrap();
        let zeta = written.find("\"zeta\"").unwrap();
        let alpha = written.find("\"alpha\"").unwrap();
        let mid = written.find("\"mid\"").unwrap();
        assert!(zeta < alpha && alpha < mid);
        assert!(written.find("\"b\"").unwrap() < written.find("\"a\"").unwrap());
    }

    #[test]
    fn test_flag_rejects_garbage() {
        let err = ExtensionManifest::from_json_str(r#"{"builtin": "maybe"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_bom_is_tolerated() {
        let manifest = ExtensionManifest::from_json_str("\u{feff}{\"name\": \"A\"}").unwrap();
        assert_eq!(manifest.name.as_deref(), Some("A"));
    }
}
