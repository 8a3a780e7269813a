//! Kubernetes deployment for Kustomate
//!
//! This crate renders kustomize overlays into manifests and deploys them:
//! - **Pipeline**: `kustomize build` every overlay, replace images, run
//!   transforms, inject labels
//! - **Cluster**: apply and delete manifests through `kubectl`
//! - **Deployer**: deploy, cleanup, render and dependency listing
//! - **Events**: deploy lifecycle reporting

pub mod cluster;
pub mod deployer;
pub mod error;
pub mod events;
pub mod pipeline;

pub use cluster::{ClusterCalls, ClusterCli, Kubectl, KubectlConfig, MIN_KUBECTL_VERSION, MockCluster};
pub use deployer::{DeployResult, KustomizeDeployer};
pub use error::{KubeError, Result};
pub use events::{ConsoleEvents, DeployEvent, EventSink, NoEvents, RecordingEvents};
pub use pipeline::{ManifestPipeline, ManifestTransform, Registries};
