//! Mock cluster for testing
//!
//! Records every applied and deleted manifest list in memory, useful for
//! unit tests without requiring kubectl or a cluster.

use std::io::Write;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use kustomate_core::ManifestList;

use super::ClusterCli;
use crate::error::{KubeError, Result};

/// In-memory cluster for testing
#[derive(Clone)]
pub struct MockCluster {
    calls: Arc<RwLock<ClusterCalls>>,
    behaviour: Arc<RwLock<Behaviour>>,
}

/// Calls received by a [`MockCluster`], for assertions
#[derive(Debug, Default, Clone)]
pub struct ClusterCalls {
    pub version_checks: usize,
    pub applies: usize,
    pub deletes: usize,
    pub applied: Vec<ManifestList>,
    pub deleted: Vec<ManifestList>,
}

#[derive(Debug, Clone)]
struct Behaviour {
    version: String,
    version_error: Option<String>,
    apply_error: Option<String>,
    delete_error: Option<String>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            version: "v1.30.0".to_string(),
            version_error: None,
            apply_error: None,
            delete_error: None,
        }
    }
}

impl MockCluster {
    /// Create a cluster that accepts everything
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(ClusterCalls::default())),
            behaviour: Arc::new(RwLock::new(Behaviour::default())),
        }
    }

    /// Report `version` from [`ClusterCli::version`]
    pub fn with_version(self, version: impl Into<String>) -> Self {
        self.behaviour.write().unwrap().version = version.into();
        self
    }

    /// Make the version check fail with `message`
    pub fn fail_version_check(self, message: impl Into<String>) -> Self {
        self.behaviour.write().unwrap().version_error = Some(message.into());
        self
    }

    /// Make apply fail with `message`
    pub fn fail_apply(self, message: impl Into<String>) -> Self {
        self.behaviour.write().unwrap().apply_error = Some(message.into());
        self
    }

    /// Make delete fail with `message`
    pub fn fail_delete(self, message: impl Into<String>) -> Self {
        self.behaviour.write().unwrap().delete_error = Some(message.into());
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> ClusterCalls {
        self.calls.read().unwrap().clone()
    }

    /// Forget recorded calls
    pub fn reset(&self) {
        *self.calls.write().unwrap() = ClusterCalls::default();
    }

    fn failure(command: &str, message: &str) -> KubeError {
        KubeError::KubectlFailed {
            command: format!("kubectl {} -f -", command),
            status: "exit status: 1".to_string(),
            stderr: message.to_string(),
        }
    }
}

impl Default for MockCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterCli for MockCluster {
    async fn check_version(&self) -> Result<()> {
        self.calls.write().unwrap().version_checks += 1;

        match &self.behaviour.read().unwrap().version_error {
            Some(message) => Err(KubeError::VersionCheck(message.clone())),
            None => Ok(()),
        }
    }

    async fn version(&self) -> String {
        self.behaviour.read().unwrap().version.clone()
    }

    async fn apply(&self, out: &mut (dyn Write + Send), manifests: &ManifestList) -> Result<()> {
        {
            let mut calls = self.calls.write().unwrap();
            calls.applies += 1;
            calls.applied.push(manifests.clone());
        }

        let error = self.behaviour.read().unwrap().apply_error.clone();
        if let Some(message) = error {
            return Err(Self::failure("apply", &message));
        }

        writeln!(out, " - {} resources applied", manifests.len())?;
        Ok(())
    }

    async fn delete(&self, out: &mut (dyn Write + Send), manifests: &ManifestList) -> Result<()> {
        {
            let mut calls = self.calls.write().unwrap();
            calls.deletes += 1;
            calls.deleted.push(manifests.clone());
        }

        let error = self.behaviour.read().unwrap().delete_error.clone();
        if let Some(message) = error {
            return Err(Self::failure("delete", &message));
        }

        writeln!(out, " - {} resources deleted", manifests.len())?;
        Ok(())
    }
}
