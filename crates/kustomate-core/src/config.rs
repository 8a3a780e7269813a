//! Deployer configuration
//!
//! `DeployConfig` is the project file (`kustomate.yaml`) describing which
//! overlays to deploy and how to call `kustomize` and `kubectl`.
//! `GlobalConfig` holds user-wide settings shared by every project.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Overlay path used when none is configured
pub const DEFAULT_KUSTOMIZE_PATH: &str = ".";

/// Registry the debug helper images are pulled from unless overridden
pub const DEFAULT_DEBUG_HELPERS_REGISTRY: &str = "gcr.io/k8s-skaffold/skaffold-debug-support";

/// Project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// Overlay directories, rendered in order
    #[serde(default = "default_kustomize_paths")]
    pub kustomize_paths: Vec<String>,

    /// Extra flags passed to `kustomize build`
    #[serde(default)]
    pub build_args: Vec<String>,

    /// Extra flags passed to `kubectl`
    #[serde(default)]
    pub flags: KubectlFlags,

    /// Labels injected into every rendered resource
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Registries that may be accessed over plain HTTP
    #[serde(default)]
    pub insecure_registries: BTreeSet<String>,

    /// kubectl context to deploy to
    #[serde(default)]
    pub kube_context: Option<String>,

    /// Default namespace for kubectl
    #[serde(default)]
    pub namespace: Option<String>,

    /// Name or path of the kustomize binary
    #[serde(default = "default_kustomize_binary")]
    pub kustomize_binary: String,

    /// Name or path of the kubectl binary
    #[serde(default = "default_kubectl_binary")]
    pub kubectl_binary: String,
}

/// Additional kubectl flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubectlFlags {
    /// Flags added to every kubectl call
    #[serde(default)]
    pub global: Vec<String>,

    /// Flags added to `kubectl apply`
    #[serde(default)]
    pub apply: Vec<String>,

    /// Flags added to `kubectl delete`
    #[serde(default)]
    pub delete: Vec<String>,

    /// Pass `--validate=false` to `kubectl apply`
    #[serde(default)]
    pub disable_validation: bool,
}

fn default_kustomize_paths() -> Vec<String> {
    vec![DEFAULT_KUSTOMIZE_PATH.to_string()]
}

fn default_kustomize_binary() -> String {
    "kustomize".to_string()
}

fn default_kubectl_binary() -> String {
    "kubectl".to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            kustomize_paths: default_kustomize_paths(),
            build_args: Vec::new(),
            flags: KubectlFlags::default(),
            labels: BTreeMap::new(),
            insecure_registries: BTreeSet::new(),
            kube_context: None,
            namespace: None,
            kustomize_binary: default_kustomize_binary(),
            kubectl_binary: default_kubectl_binary(),
        }
    }
}

impl DeployConfig {
    /// Parse a configuration from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// User-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    #[serde(default = "default_debug_helpers_registry")]
    pub debug_helpers_registry: String,
}

fn default_debug_helpers_registry() -> String {
    DEFAULT_DEBUG_HELPERS_REGISTRY.to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_helpers_registry: default_debug_helpers_registry(),
        }
    }
}

impl GlobalConfig {
    /// Load the global configuration
    ///
    /// A missing file (or no path at all) yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(CoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::from_yaml("").unwrap();
        assert_eq!(config.kustomize_paths, vec!["."]);
        assert_eq!(config.kustomize_binary, "kustomize");
        assert_eq!(config.kubectl_binary, "kubectl");
        assert!(config.build_args.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = DeployConfig::from_yaml(
            r#"
kustomizePaths:
  - overlays/dev
  - overlays/monitoring
buildArgs:
  - "--load_restrictor none"
flags:
  global: ["--v=2"]
  apply: ["--server-side"]
  disableValidation: true
labels:
  team: payments
insecureRegistries:
  - localhost:5000
kubeContext: kind-dev
"#,
        )
        .unwrap();

        assert_eq!(config.kustomize_paths, vec!["overlays/dev", "overlays/monitoring"]);
        assert_eq!(config.build_args, vec!["--load_restrictor none"]);
        assert_eq!(config.flags.global, vec!["--v=2"]);
        assert_eq!(config.flags.apply, vec!["--server-side"]);
        assert!(config.flags.disable_validation);
        assert_eq!(config.labels.get("team").map(String::as_str), Some("payments"));
        assert!(config.insecure_registries.contains("localhost:5000"));
        assert_eq!(config.kube_context.as_deref(), Some("kind-dev"));
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kustomate.yaml");
        std::fs::write(&path, "kustomizePaths: {not: [a list").unwrap();

        let err = DeployConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("kustomate.yaml"));
    }

    #[test]
    fn test_global_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = GlobalConfig::load(Some(&temp.path().join("absent"))).unwrap();
        assert_eq!(config.debug_helpers_registry, DEFAULT_DEBUG_HELPERS_REGISTRY);
    }

    #[test]
    fn test_global_config_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config");
        std::fs::write(&path, "debug-helpers-registry: registry.local/debug\n").unwrap();

        let config = GlobalConfig::load(Some(&path)).unwrap();
        assert_eq!(config.debug_helpers_registry, "registry.local/debug");
    }

    #[test]
    fn test_global_config_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config");
        std::fs::write(&path, "debug-helpers-registry: [").unwrap();

        assert!(GlobalConfig::load(Some(&path)).is_err());
    }
}
