//! Error types for kustomate-kustomize

use std::path::PathBuf;

use thiserror::Error;

/// Result type for kustomate-kustomize operations
pub type Result<T> = std::result::Result<T, KustomizeError>;

/// Errors that can occur while reading overlays or running kustomize
///
/// A missing or remote reference is never an error; only a kustomization
/// file that exists but cannot be read or parsed is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KustomizeError {
    /// Existing kustomization file could not be read
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Existing kustomization file is malformed
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: OverlayParseError,
    },

    /// Overlay reaches its own directory through bases or resources
    #[error("{path} includes itself through its resources")]
    Cycle { path: PathBuf },

    /// kustomize could not be started
    #[error("running {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// kustomize exited with a failure
    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Errors from parsing kustomization content
#[derive(Debug, Error)]
pub enum OverlayParseError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Scan(#[from] yaml_rust2::scanner::ScanError),
}
