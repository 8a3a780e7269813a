//! Kustomate Kustomize - everything that knows about kustomization files
//!
//! This crate provides:
//! - **Dependency resolution**: The transitive set of local files an overlay is built from,
//!   used to decide when a re-deploy is needed
//! - **Kustomization model**: Bases, resources, the historical patch syntaxes, CRDs and generators
//! - **Conventions**: Accepted config filenames and the base directory name, with the
//!   predicates a file watcher uses to classify changes
//! - **Rendering**: Invoking `kustomize build` for an overlay

pub mod conventions;
pub mod deps;
pub mod error;
pub mod overlay;
pub mod probe;
pub mod render;
mod style;

pub use conventions::{KustomizeConventions, is_kustomization_base, is_kustomization_path};
pub use deps::{DependencyResolver, dependencies_for_kustomization};
pub use error::{KustomizeError, Result};
pub use overlay::{Generator, JsonPatchRef, OverlayConfig, Patch, StrategicMergePatch};
pub use probe::{PathKind, find_kustomization_config, path_exists_locally};
pub use render::{KustomizeCli, ManifestRenderer, build_command_args};
