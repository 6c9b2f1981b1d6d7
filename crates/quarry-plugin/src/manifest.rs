// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest parsing from YAML.
//!
//! A manifest declares `kind`, `type` and `name` at the top level and a
//! variant-specific `spec` body. Only `kind: plugin` documents of type `step`
//! or `stage` can enter the catalog; every other combination parses into
//! [`ManifestSpec::Unsupported`].

use std::collections::BTreeMap;

use quarry_core::{PluginDescriptor, QuarryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parsed plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestConfig {
    /// Schema version declared by the document, if any.
    pub version: Option<String>,
    /// Document kind (e.g. "plugin").
    pub kind: String,
    /// Document type within the kind (e.g. "step", "stage").
    #[serde(rename = "type")]
    pub plugin_type: String,
    /// Declared name; the catalog uid.
    pub name: String,
    /// Variant body selected by `kind` and `type`.
    pub spec: ManifestSpec,
}

impl ManifestConfig {
    /// Description of a plugin variant, `None` for unsupported documents.
    pub fn description(&self) -> Option<&str> {
        match &self.spec {
            ManifestSpec::PluginStep(step) => Some(&step.description),
            ManifestSpec::PluginStage(stage) => Some(&stage.description),
            ManifestSpec::Unsupported { .. } => None,
        }
    }
}

/// Variant body of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ManifestSpec {
    /// `kind: plugin`, `type: step`.
    PluginStep(PluginStep),
    /// `kind: plugin`, `type: stage`.
    PluginStage(PluginStage),
    /// Any other kind/type combination.
    Unsupported { kind: String, plugin_type: String },
}

/// Body of a step plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginStep {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, PluginInput>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, PluginOutput>,
}

/// Body of a stage plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginStage {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, PluginInput>,
    /// Stage bodies are passed through to the pipeline compiler untouched.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<serde_yaml::Value>,
}

/// A declared plugin input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginInput {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,
    pub required: bool,
    pub secret: bool,
}

/// A declared plugin output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Top-level YAML document before variant dispatch.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    version: Option<VersionField>,
    kind: String,
    #[serde(rename = "type")]
    plugin_type: String,
    name: String,
    #[serde(default)]
    spec: serde_yaml::Value,
}

/// `version: 1` and `version: "1"` are both accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionField {
    Number(u64),
    Text(String),
}

/// Parse a manifest from YAML text.
///
/// Fails with [`QuarryError::Schema`] when the YAML is malformed, a required
/// top-level field is missing, the name is empty, or a plugin body does not
/// have the expected shape.
pub fn parse_manifest(yaml: &str) -> Result<ManifestConfig, QuarryError> {
    let file: ManifestFile = serde_yaml::from_str(yaml)
        .map_err(|e| QuarryError::Schema(format!("invalid plugin manifest: {e}")))?;

    if file.name.trim().is_empty() {
        return Err(QuarryError::Schema(
            "plugin manifest: name must not be empty".to_string(),
        ));
    }

    let spec = match (file.kind.as_str(), file.plugin_type.as_str()) {
        ("plugin", "step") => ManifestSpec::PluginStep(parse_body(file.spec)?),
        ("plugin", "stage") => ManifestSpec::PluginStage(parse_body(file.spec)?),
        _ => ManifestSpec::Unsupported {
            kind: file.kind.clone(),
            plugin_type: file.plugin_type.clone(),
        },
    };

    Ok(ManifestConfig {
        version: file.version.map(|v| match v {
            VersionField::Number(n) => n.to_string(),
            VersionField::Text(s) => s,
        }),
        kind: file.kind,
        plugin_type: file.plugin_type,
        name: file.name,
        spec,
    })
}

fn parse_body<T>(value: serde_yaml::Value) -> Result<T, QuarryError>
where
    T: Default + serde::de::DeserializeOwned,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(value)
        .map_err(|e| QuarryError::Schema(format!("invalid plugin spec: {e}")))
}

/// Why a manifest was left out of the catalog.
#[derive(Debug, Error)]
pub enum ManifestSkip {
    /// The bytes are not valid UTF-8.
    #[error("manifest is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The text did not parse into a valid manifest.
    #[error("could not parse schema into valid config: {0}")]
    Parse(QuarryError),

    /// The document parsed but is not a step or stage plugin.
    #[error("schema did not match a valid plugin schema (kind `{kind}`, type `{plugin_type}`)")]
    UnsupportedVariant { kind: String, plugin_type: String },
}

/// Build a catalog descriptor from raw manifest bytes.
///
/// The stored spec is the original text verbatim, never a re-serialization.
/// The logo is left empty for the caller to attach.
pub fn descriptor_from_manifest(bytes: &[u8]) -> Result<PluginDescriptor, ManifestSkip> {
    let text = std::str::from_utf8(bytes)?;
    let config = parse_manifest(text).map_err(ManifestSkip::Parse)?;

    let description = match &config.spec {
        ManifestSpec::PluginStep(step) => step.description.clone(),
        ManifestSpec::PluginStage(stage) => stage.description.clone(),
        ManifestSpec::Unsupported { kind, plugin_type } => {
            return Err(ManifestSkip::UnsupportedVariant {
                kind: kind.clone(),
                plugin_type: plugin_type.clone(),
            });
        }
    };

    Ok(PluginDescriptor {
        uid: config.name,
        plugin_type: config.plugin_type,
        description,
        spec: text.to_string(),
        logo: None,
    })
}
