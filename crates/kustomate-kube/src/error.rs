//! Error types for kustomate-kube

use std::path::PathBuf;

use kustomate_core::CoreError;
use kustomate_kustomize::KustomizeError;
use thiserror::Error;

/// Result type for kustomate-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while rendering, deploying or cleaning up
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// `kustomize build` failed for an overlay
    #[error("kustomize build {path}: {source}")]
    KustomizeBuild {
        path: String,
        #[source]
        source: KustomizeError,
    },

    /// Rendering the raw manifests failed
    #[error("reading manifests: {0}")]
    ReadingManifests(#[source] Box<KubeError>),

    /// Image substitution failed
    #[error("replacing images in manifests: {0}")]
    ReplacingImages(#[source] CoreError),

    /// A registered transform failed
    #[error("unable to transform manifests: {0}")]
    Transform(#[source] Box<KubeError>),

    /// Label injection failed
    #[error("setting labels in manifests: {0}")]
    SettingLabels(#[source] CoreError),

    /// Global configuration could not be read
    #[error("retrieving debug helpers registry: {0}")]
    DebugHelpersRegistry(#[source] CoreError),

    /// Dependency resolution failed for an overlay
    #[error("listing dependencies of {path}: {source}")]
    Dependencies {
        path: String,
        #[source]
        source: KustomizeError,
    },

    /// kubectl could not be started
    #[error("running {program}: {source}")]
    KubectlSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// kubectl exited with a failure
    #[error("{command} exited with {status}: {stderr}")]
    KubectlFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Unsupported or unknown kubectl version
    #[error("{0}")]
    VersionCheck(String),

    /// Deleting the manifests failed
    #[error("delete: {0}")]
    Delete(#[source] Box<KubeError>),

    /// Rendered manifests could not be written
    #[error("writing rendered manifests to {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid manifest content
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
