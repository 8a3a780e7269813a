//! Kustomate Core - shared types for the kustomize deployer
//!
//! This crate provides the foundational types used throughout Kustomate:
//! - `ManifestList`: Rendered YAML documents with image, label and namespace utilities
//! - `Artifact`: A built image and the reference it should be deployed as
//! - `DeployConfig`: The deployer configuration file
//! - `GlobalConfig`: User-wide settings (debug helpers registry)

pub mod artifact;
pub mod config;
pub mod error;
pub mod manifest;

pub use artifact::Artifact;
pub use config::{DeployConfig, GlobalConfig, KubectlFlags, DEFAULT_DEBUG_HELPERS_REGISTRY};
pub use error::{CoreError, Result};
pub use manifest::ManifestList;
