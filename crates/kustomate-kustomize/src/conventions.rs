//! Filename conventions of kustomize
//!
//! Kustomize accepts exactly one config file per overlay directory, under one
//! of a few names. A file watcher uses the predicates here to decide whether
//! a changed file is an overlay config or lives in a base directory.

use std::path::Path;

/// Accepted kustomization filenames, in lookup order
pub const KUSTOMIZATION_FILE_NAMES: [&str; 3] =
    ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Conventional name of an overlay's base directory
pub const BASE_DIR_NAME: &str = "base";

/// Naming conventions used during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KustomizeConventions {
    /// Candidate config filenames, tried in order
    pub config_file_names: Vec<String>,
    /// Name of the base directory
    pub base_dir: String,
}

impl Default for KustomizeConventions {
    fn default() -> Self {
        Self {
            config_file_names: KUSTOMIZATION_FILE_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            base_dir: BASE_DIR_NAME.to_string(),
        }
    }
}

impl KustomizeConventions {
    /// Whether `path` sits directly in the base directory
    pub fn is_base(&self, path: &Path) -> bool {
        path.parent() == Some(Path::new(&self.base_dir))
    }

    /// Whether the filename of `path` is an accepted kustomization name
    pub fn is_config_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.config_file_names.iter().any(|c| c == name))
    }
}

/// [`KustomizeConventions::is_base`] with the default conventions
pub fn is_kustomization_base(path: impl AsRef<Path>) -> bool {
    path.as_ref().parent() == Some(Path::new(BASE_DIR_NAME))
}

/// [`KustomizeConventions::is_config_file`] with the default conventions
pub fn is_kustomization_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| KUSTOMIZATION_FILE_NAMES.contains(&name))
}
