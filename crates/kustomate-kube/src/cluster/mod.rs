//! Cluster access
//!
//! The deployer talks to the cluster through the [`ClusterCli`] trait:
//! - **Kubectl**: Pipes manifests to the `kubectl` binary
//! - **Mock**: Records calls in memory (for tests)

mod kubectl;
mod mock;

pub use kubectl::{Kubectl, KubectlConfig, MIN_KUBECTL_VERSION};
pub use mock::{ClusterCalls, MockCluster};

use std::io::Write;

use async_trait::async_trait;
use kustomate_core::ManifestList;

use crate::error::Result;

/// Applies and deletes manifests on a cluster
///
/// Output produced by the underlying tool is written to `out`.
#[async_trait]
pub trait ClusterCli: Send + Sync {
    /// Fail if the client is too old to deploy kustomize output
    async fn check_version(&self) -> Result<()>;

    /// Client version, for diagnostics
    async fn version(&self) -> String;

    /// Create or update the resources in `manifests`
    async fn apply(&self, out: &mut (dyn Write + Send), manifests: &ManifestList) -> Result<()>;

    /// Delete the resources in `manifests`, ignoring those already gone
    async fn delete(&self, out: &mut (dyn Write + Send), manifests: &ManifestList) -> Result<()>;
}
