//! Running `kustomize build`
//!
//! The renderer is a trait so the deploy pipeline can be exercised without a
//! kustomize binary. `KustomizeCli` is the real implementation.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{KustomizeError, Result};

/// Produces raw manifests for a set of `kustomize` arguments
#[async_trait]
pub trait ManifestRenderer: Send + Sync {
    /// Run the renderer and return its standard output
    async fn build(&self, args: &[String]) -> Result<Vec<u8>>;
}

/// Arguments for `kustomize build` of one overlay
///
/// Each build arg is split on whitespace, so `"--load_restrictor none"`
/// becomes two arguments. Arguments containing spaces cannot be expressed.
pub fn build_command_args(build_args: &[String], kustomize_path: &str) -> Vec<String> {
    let mut args = vec!["build".to_string()];

    for arg in build_args {
        args.extend(arg.split_whitespace().map(str::to_string));
    }

    if !kustomize_path.is_empty() {
        args.push(kustomize_path.to_string());
    }

    args
}

/// The `kustomize` command line tool
#[derive(Debug, Clone)]
pub struct KustomizeCli {
    binary: String,
}

impl Default for KustomizeCli {
    fn default() -> Self {
        Self::new("kustomize")
    }
}

impl KustomizeCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl ManifestRenderer for KustomizeCli {
    async fn build(&self, args: &[String]) -> Result<Vec<u8>> {
        tracing::debug!("Running: {} {}", self.binary, args.join(" "));

        // Dropping the future (cancellation) kills kustomize.
        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| KustomizeError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(KustomizeError::CommandFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
