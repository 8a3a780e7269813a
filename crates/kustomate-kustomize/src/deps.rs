//! Dependency resolution for kustomize overlays
//!
//! Computes every local file that can change the output of
//! `kustomize build <dir>`, without running kustomize. The walk follows
//! kustomize's own rules: bases and resources are read relative to the
//! overlay directory, local directories are overlays in turn, and anything
//! that is not on disk is assumed to be remote and left to kustomize.
//!
//! Paths are reported relative to the directory the walk started from (or
//! absolute when it started from an absolute path). Duplicates across
//! branches are kept; callers that need a set deduplicate.

use std::path::{Path, PathBuf};

use crate::conventions::KustomizeConventions;
use crate::error::{KustomizeError, Result};
use crate::overlay::OverlayConfig;
use crate::probe::{PathKind, clean, find_kustomization_config, join_clean, path_exists_locally};

/// Walks overlay directories and collects their file dependencies
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    conventions: KustomizeConventions,
}

impl DependencyResolver {
    pub fn new(conventions: KustomizeConventions) -> Self {
        Self { conventions }
    }

    pub fn conventions(&self) -> &KustomizeConventions {
        &self.conventions
    }

    /// Resolve the dependencies of the overlay in `dir`
    ///
    /// A directory without a kustomization config yields no dependencies;
    /// a config that exists but does not parse is an error, and so is an
    /// overlay that reaches its own directory again.
    pub fn resolve(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        self.resolve_within(&clean(dir.as_ref()), &[])
    }

    /// `ancestors` are the overlay directories currently being walked
    fn resolve_within(&self, dir: &Path, ancestors: &[PathBuf]) -> Result<Vec<PathBuf>> {
        if ancestors.iter().any(|ancestor| ancestor == dir) {
            return Err(KustomizeError::Cycle {
                path: dir.to_path_buf(),
            });
        }

        let Some(config_path) = find_kustomization_config(dir, &self.conventions) else {
            tracing::debug!(dir = %dir.display(), "no kustomization found, assuming remote");
            return Ok(Vec::new());
        };

        let config = OverlayConfig::from_file(&config_path)?;
        let mut deps = vec![config_path];

        let mut chain = ancestors.to_vec();
        chain.push(dir.to_path_buf());

        for candidate in config.candidates() {
            match path_exists_locally(candidate, dir) {
                None => {
                    tracing::debug!(candidate, dir = %dir.display(), "skipping non-local reference");
                }
                Some(PathKind::Directory) => {
                    deps.extend(self.resolve_within(&join_clean(dir, candidate), &chain)?);
                }
                Some(PathKind::File) => deps.push(join_clean(dir, candidate)),
            }
        }

        deps.extend(
            config
                .strategic_merge_patches
                .iter()
                .filter_map(|patch| patch.path())
                .filter(|path| !path.is_empty())
                .map(|path| join_clean(dir, path)),
        );

        deps.extend(config.crds.iter().map(|crd| join_clean(dir, crd)));

        deps.extend(
            config
                .patches
                .iter()
                .filter_map(|patch| patch.path())
                .filter(|path| !path.is_empty())
                .map(|path| join_clean(dir, path)),
        );

        deps.extend(
            config
                .patches_json6902
                .iter()
                .filter(|patch| !patch.path.is_empty())
                .map(|patch| join_clean(dir, &patch.path)),
        );

        for generator in config.generators() {
            deps.extend(generator.files.iter().map(|file| join_clean(dir, file)));
            deps.extend(
                generator
                    .env_files()
                    .into_iter()
                    .map(|file| join_clean(dir, file)),
            );
        }

        Ok(deps)
    }
}

/// Resolve `dir` with the default kustomize conventions
pub fn dependencies_for_kustomization(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    DependencyResolver::default().resolve(dir)
}
