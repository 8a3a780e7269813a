//! CLI commands

pub mod cleanup;
pub mod deploy;
pub mod deps;
pub mod render;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kustomate_core::DeployConfig;
use kustomate_kube::{Kubectl, KubectlConfig, KustomizeDeployer};
use kustomate_kustomize::KustomizeCli;

use crate::error::Result;

/// Configuration file looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "kustomate.yaml";

/// Settings shared by every command
pub struct Context {
    pub config: DeployConfig,
    pub global_config: Option<PathBuf>,
}

impl Context {
    /// Load the deploy configuration
    ///
    /// An explicit `config` must exist. Without one, `kustomate.yaml` is used
    /// when present and the defaults otherwise.
    pub fn load(config: Option<&Path>, global_config: Option<PathBuf>) -> Result<Self> {
        let config = match config {
            Some(path) => DeployConfig::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                DeployConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                DeployConfig::default()
            }
        };

        Ok(Self {
            config,
            global_config,
        })
    }

    pub fn deployer(&self, force: bool) -> KustomizeDeployer<Kubectl, KustomizeCli> {
        let kubectl = Kubectl::new(KubectlConfig::from_deploy_config(&self.config, force));
        let kustomize = KustomizeCli::new(self.config.kustomize_binary.clone());

        let deployer = KustomizeDeployer::new(&self.config, kubectl, kustomize);
        match &self.global_config {
            Some(path) => deployer.with_global_config(path.clone()),
            None => deployer,
        }
    }
}

/// Parse a `KEY=VALUE` label
pub fn parse_label(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid label '{}': expected KEY=VALUE", s)),
    }
}

pub fn labels(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_label() {
        assert_eq!(
            parse_label("team=payments").unwrap(),
            ("team".to_string(), "payments".to_string())
        );
        assert_eq!(parse_label("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert!(parse_label("team").is_err());
        assert!(parse_label("=value").is_err());
    }

    #[test]
    fn test_load_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deploy.yaml");
        std::fs::write(&path, "kustomizePaths: [overlays/dev]\nkubeContext: kind\n").unwrap();

        let ctx = Context::load(Some(&path), None).unwrap();
        assert_eq!(ctx.config.kustomize_paths, vec!["overlays/dev"]);
        assert_eq!(ctx.config.kube_context.as_deref(), Some("kind"));
    }

    #[test]
    fn test_load_missing_explicit_config() {
        let temp = TempDir::new().unwrap();
        assert!(Context::load(Some(&temp.path().join("missing.yaml")), None).is_err());
    }
}
