//! Local filesystem probes
//!
//! A reference that does not exist on disk is indistinguishable from a
//! remote one, so absence is an ordinary outcome here and never an error.

use std::path::{Component, Path, PathBuf};

use crate::conventions::KustomizeConventions;

/// What a local path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// Check whether `path` exists locally, relative to `working_dir` unless absolute
pub fn path_exists_locally(path: impl AsRef<Path>, working_dir: impl AsRef<Path>) -> Option<PathKind> {
    let path = path.as_ref();
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.as_ref().join(path)
    };

    match std::fs::metadata(&full) {
        Ok(meta) if meta.is_dir() => Some(PathKind::Directory),
        Ok(_) => Some(PathKind::File),
        Err(_) => None,
    }
}

/// Find the kustomization config at the root of `dir`
///
/// Kustomize refuses to build a directory holding more than one accepted
/// config, so the first match in declared order is the only one.
pub fn find_kustomization_config(
    dir: impl AsRef<Path>,
    conventions: &KustomizeConventions,
) -> Option<PathBuf> {
    let dir = dir.as_ref();
    conventions
        .config_file_names
        .iter()
        .find(|candidate| path_exists_locally(candidate.as_str(), dir).is_some())
        .map(|candidate| join_clean(dir, candidate))
}

/// Join `path` onto `dir` and normalize `.` and `..` lexically
pub(crate) fn join_clean(dir: &Path, path: impl AsRef<Path>) -> PathBuf {
    clean(&dir.join(path))
}

/// Normalize `.` and `..` in `path` lexically
pub(crate) fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            _ => out.push(component),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_exists_locally() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("base")).unwrap();
        std::fs::write(temp.path().join("deployment.yaml"), "kind: Deployment").unwrap();

        assert_eq!(
            path_exists_locally("deployment.yaml", temp.path()),
            Some(PathKind::File)
        );
        assert_eq!(path_exists_locally("base", temp.path()), Some(PathKind::Directory));
        assert_eq!(path_exists_locally("missing.yaml", temp.path()), None);
        assert_eq!(
            path_exists_locally("github.com/org/repo//deploy?ref=v1", temp.path()),
            None
        );
    }

    #[test]
    fn test_path_exists_locally_absolute() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("service.yaml");
        std::fs::write(&file, "kind: Service").unwrap();

        assert_eq!(path_exists_locally(&file, "/nonexistent"), Some(PathKind::File));
    }

    #[test]
    fn test_find_kustomization_config() {
        let temp = TempDir::new().unwrap();
        let conventions = KustomizeConventions::default();
        assert_eq!(find_kustomization_config(temp.path(), &conventions), None);

        std::fs::write(temp.path().join("Kustomization"), "resources: []").unwrap();
        assert_eq!(
            find_kustomization_config(temp.path(), &conventions),
            Some(temp.path().join("Kustomization"))
        );
    }

    #[test]
    fn test_find_kustomization_config_yml() {
        let temp = TempDir::new().unwrap();
        let conventions = KustomizeConventions::default();
        std::fs::write(temp.path().join("kustomization.yml"), "").unwrap();

        assert_eq!(
            find_kustomization_config(temp.path(), &conventions),
            Some(temp.path().join("kustomization.yml"))
        );
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("a/./b")), PathBuf::from("a/b"));
        assert_eq!(clean(Path::new("a/x/../b")), PathBuf::from("a/b"));
        assert_eq!(clean(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(clean(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean(Path::new("./")), PathBuf::from("."));
        assert_eq!(
            join_clean(Path::new("overlays/dev"), "../../base"),
            PathBuf::from("base")
        );
    }
}
