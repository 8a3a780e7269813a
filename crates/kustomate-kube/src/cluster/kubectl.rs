//! kubectl-backed cluster access

use std::io::Write;
use std::process::Stdio;

use async_trait::async_trait;
use kustomate_core::{DeployConfig, KubectlFlags, ManifestList};
use semver::Version;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::ClusterCli;
use crate::error::{KubeError, Result};

/// Oldest kubectl able to apply kustomize output from stdin
pub const MIN_KUBECTL_VERSION: Version = Version::new(1, 12, 0);

/// Prefix for forwarded kubectl output
const OUTPUT_PREFIX: &str = " - ";

/// How kubectl is invoked
#[derive(Debug, Clone)]
pub struct KubectlConfig {
    pub binary: String,
    pub kube_context: Option<String>,
    pub namespace: Option<String>,
    pub flags: KubectlFlags,
    /// Pass `--force` to `kubectl apply`
    pub force: bool,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            kube_context: None,
            namespace: None,
            flags: KubectlFlags::default(),
            force: false,
        }
    }
}

impl KubectlConfig {
    pub fn from_deploy_config(config: &DeployConfig, force: bool) -> Self {
        Self {
            binary: config.kubectl_binary.clone(),
            kube_context: config.kube_context.clone(),
            namespace: config.namespace.clone(),
            flags: config.flags.clone(),
            force,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionOutput {
    client_version: ClientVersion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientVersion {
    #[serde(default)]
    major: String,
    #[serde(default)]
    minor: String,
    #[serde(default)]
    git_version: String,
}

impl ClientVersion {
    /// `major.minor` as a version; minors such as `18+` are accepted
    fn parse(&self) -> Option<Version> {
        let major = leading_number(&self.major)?;
        let minor = leading_number(&self.minor)?;
        Some(Version::new(major, minor, 0))
    }
}

fn leading_number(s: &str) -> Option<u64> {
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The `kubectl` command line tool
#[derive(Debug, Clone, Default)]
pub struct Kubectl {
    config: KubectlConfig,
}

impl Kubectl {
    pub fn new(config: KubectlConfig) -> Self {
        Self { config }
    }

    /// Context, namespace and global flags shared by every call
    fn base_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(context) = &self.config.kube_context {
            args.push(format!("--context={}", context));
        }
        if let Some(namespace) = &self.config.namespace {
            args.push(format!("--namespace={}", namespace));
        }
        args.extend(self.config.flags.global.iter().cloned());
        args
    }

    pub(crate) fn apply_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(["apply", "-f", "-"].map(String::from));
        if self.config.force {
            args.push("--force".to_string());
        }
        if self.config.flags.disable_validation {
            args.push("--validate=false".to_string());
        }
        args.extend(self.config.flags.apply.iter().cloned());
        args
    }

    pub(crate) fn delete_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(["delete", "--ignore-not-found=true", "-f", "-"].map(String::from));
        args.extend(self.config.flags.delete.iter().cloned());
        args
    }

    fn version_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(["version", "--client", "-o", "json"].map(String::from));
        args
    }

    /// Run kubectl, feeding `input` on stdin, and return stdout
    async fn run(&self, args: &[String], input: Option<&[u8]>) -> Result<Vec<u8>> {
        tracing::debug!("Running: {} {}", self.config.binary, args.join(" "));

        let mut child = Command::new(&self.config.binary)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| KubeError::KubectlSpawn {
                program: self.config.binary.clone(),
                source,
            })?;

        if let (Some(input), Some(stdin)) = (input, child.stdin.as_mut()) {
            match stdin.write_all(input).await {
                Ok(()) => {}
                // kubectl stopped reading; its exit status and stderr say why
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("{} closed stdin early", self.config.binary);
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Closes stdin before waiting
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(KubeError::KubectlFailed {
                command: format!("{} {}", self.config.binary, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    async fn client_version(&self) -> Result<ClientVersion> {
        let stdout = self.run(&self.version_args(), None).await?;
        let parsed: VersionOutput = serde_json::from_slice(&stdout).map_err(|e| {
            KubeError::VersionCheck(format!("unable to parse kubectl version: {}", e))
        })?;
        Ok(parsed.client_version)
    }

    async fn run_manifests(
        &self,
        args: &[String],
        out: &mut (dyn Write + Send),
        manifests: &ManifestList,
    ) -> Result<()> {
        if manifests.is_empty() {
            return Ok(());
        }

        let stdout = self.run(args, Some(manifests.to_string().as_bytes())).await?;
        write_prefixed(out, &stdout)?;
        Ok(())
    }
}

fn write_prefixed(out: &mut (dyn Write + Send), output: &[u8]) -> std::io::Result<()> {
    for line in String::from_utf8_lossy(output).lines() {
        writeln!(out, "{}{}", OUTPUT_PREFIX, line)?;
    }
    Ok(())
}

#[async_trait]
impl ClusterCli for Kubectl {
    async fn check_version(&self) -> Result<()> {
        let client = self
            .client_version()
            .await
            .map_err(|e| KubeError::VersionCheck(format!("unable to determine kubectl version: {}", e)))?;

        let version = client.parse().ok_or_else(|| {
            KubeError::VersionCheck(format!(
                "unable to parse kubectl client version {}.{}",
                client.major, client.minor
            ))
        })?;

        if version < MIN_KUBECTL_VERSION {
            return Err(KubeError::VersionCheck(format!(
                "kubectl {}.{} or greater is required, found {}.{}",
                MIN_KUBECTL_VERSION.major, MIN_KUBECTL_VERSION.minor, version.major, version.minor
            )));
        }

        Ok(())
    }

    async fn version(&self) -> String {
        match self.client_version().await {
            Ok(client) if !client.git_version.is_empty() => client.git_version,
            Ok(client) => format!("{}.{}", client.major, client.minor),
            Err(_) => "unknown".to_string(),
        }
    }

    async fn apply(&self, out: &mut (dyn Write + Send), manifests: &ManifestList) -> Result<()> {
        self.run_manifests(&self.apply_args(), out, manifests).await
    }

    async fn delete(&self, out: &mut (dyn Write + Send), manifests: &ManifestList) -> Result<()> {
        self.run_manifests(&self.delete_args(), out, manifests).await
    }
}
