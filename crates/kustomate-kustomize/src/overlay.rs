//! Kustomization file model
//!
//! Only the fields that reference other files are modelled. Everything else
//! in a kustomization is kustomize's business and is ignored here.
//!
//! # Patch syntaxes
//!
//! Kustomize has accepted patches in several shapes over time:
//!
//! ```yaml
//! patches:
//! - path: replicas.yaml          # object with a path
//! - patch: |-                    # object with an inline patch
//!     - op: replace
//! - legacy.yaml                  # bare string (deprecated), a path
//! patchesStrategicMerge:
//! - memory.yaml                  # plain scalar, a path
//! - |-                           # block scalar, an inline patch
//!   apiVersion: apps/v1
//! patchesJson6902:
//! - path: ops.yaml
//! ```

use std::path::Path;
use std::sync::Once;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::{KustomizeError, OverlayParseError, Result};
use crate::style::strategic_merge_patches;

static BARE_PATCH_WARNING: Once = Once::new();

/// A generic `patches` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Patch file, relative to the overlay directory
    Path(String),
    /// Patch content written in the kustomization itself
    Inline(String),
}

impl Patch {
    pub fn path(&self) -> Option<&str> {
        match self {
            Patch::Path(path) => Some(path),
            Patch::Inline(_) => None,
        }
    }
}

/// A `patchesStrategicMerge` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategicMergePatch {
    Path(String),
    Inline(String),
}

impl StrategicMergePatch {
    pub fn path(&self) -> Option<&str> {
        match self {
            StrategicMergePatch::Path(path) => Some(path),
            StrategicMergePatch::Inline(_) => None,
        }
    }
}

/// A `patchesJson6902` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JsonPatchRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
}

/// A `configMapGenerator` or `secretGenerator` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Generator {
    #[serde(default, deserialize_with = "scalar_strings")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: String,
    #[serde(default, deserialize_with = "scalar_strings")]
    pub envs: Vec<String>,
}

impl Generator {
    /// `envs` followed by `env` when set
    pub fn env_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.envs.iter().map(String::as_str).collect();
        if !self.env.is_empty() {
            files.push(&self.env);
        }
        files
    }
}

/// Parsed kustomization file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayConfig {
    pub bases: Vec<String>,
    pub resources: Vec<String>,
    pub patches: Vec<Patch>,
    pub strategic_merge_patches: Vec<StrategicMergePatch>,
    pub patches_json6902: Vec<JsonPatchRef>,
    pub crds: Vec<String>,
    pub config_map_generator: Vec<Generator>,
    pub secret_generator: Vec<Generator>,
}

/// On-disk shape, before patch entries are classified
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKustomization {
    #[serde(default, deserialize_with = "scalar_strings")]
    bases: Vec<String>,
    #[serde(default, deserialize_with = "scalar_strings")]
    resources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    patches: Vec<RawPatch>,
    #[serde(default, deserialize_with = "scalar_strings")]
    crds: Vec<String>,
    #[serde(default, rename = "patchesJson6902", deserialize_with = "null_as_default")]
    patches_json6902: Vec<JsonPatchRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    config_map_generator: Vec<Generator>,
    #[serde(default, deserialize_with = "null_as_default")]
    secret_generator: Vec<Generator>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPatch {
    Bare(String),
    Object {
        #[serde(default, deserialize_with = "null_as_default")]
        path: String,
        #[serde(default, deserialize_with = "null_as_default")]
        patch: String,
    },
}

impl RawPatch {
    fn classify(self) -> Option<Patch> {
        match self {
            RawPatch::Bare(path) => {
                BARE_PATCH_WARNING.call_once(|| {
                    tracing::warn!(
                        "list of file paths deprecated: see https://github.com/kubernetes-sigs/kustomize/blob/master/docs/plugins/builtins.md#patchtransformer"
                    );
                });
                Some(Patch::Path(path))
            }
            RawPatch::Object { path, .. } if !path.is_empty() => Some(Patch::Path(path)),
            RawPatch::Object { patch, .. } if !patch.is_empty() => Some(Patch::Inline(patch)),
            RawPatch::Object { .. } => None,
        }
    }
}

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A list of paths; numbers and booleans are read as the text they were
/// written as, null entries are skipped
fn scalar_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<serde_yaml::Value>> = Option::deserialize(deserializer)?;

    values
        .unwrap_or_default()
        .into_iter()
        .filter(|value| !value.is_null())
        .map(|value| match value {
            serde_yaml::Value::String(s) => Ok(s),
            serde_yaml::Value::Number(n) => Ok(n.to_string()),
            serde_yaml::Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!(
                "expected a path, found {}",
                describe(&other)
            ))),
        })
        .collect()
}

fn describe(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
        _ => "a scalar",
    }
}

impl OverlayConfig {
    /// Parse kustomization content
    ///
    /// Only the first YAML document is read; an empty stream is an empty
    /// config.
    pub fn parse(source: &str) -> std::result::Result<Self, OverlayParseError> {
        let raw = match serde_yaml::Deserializer::from_str(source).next() {
            None => RawKustomization::default(),
            Some(document) => {
                let value = serde_yaml::Value::deserialize(document)?;
                if value.is_null() {
                    RawKustomization::default()
                } else {
                    serde_yaml::from_value(value)?
                }
            }
        };

        Ok(Self {
            bases: raw.bases,
            resources: raw.resources,
            patches: raw.patches.into_iter().filter_map(RawPatch::classify).collect(),
            strategic_merge_patches: strategic_merge_patches(source)?,
            patches_json6902: raw.patches_json6902,
            crds: raw.crds,
            config_map_generator: raw.config_map_generator,
            secret_generator: raw.secret_generator,
        })
    }

    /// Read and parse a kustomization file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| KustomizeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|source| KustomizeError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `bases` followed by `resources`
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.bases
            .iter()
            .chain(self.resources.iter())
            .map(String::as_str)
    }

    /// Every generator, config maps first
    pub fn generators(&self) -> impl Iterator<Item = &Generator> {
        self.config_map_generator
            .iter()
            .chain(self.secret_generator.iter())
    }
}
