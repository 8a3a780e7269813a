//! Dependency resolution scenarios on real directory trees

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use kustomate_kustomize::{dependencies_for_kustomization, is_kustomization_path};
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, content).unwrap();
}

fn resolve_set(dir: &Path) -> BTreeSet<PathBuf> {
    dependencies_for_kustomization(dir)
        .unwrap()
        .into_iter()
        .collect()
}

fn set(root: &Path, paths: &[&str]) -> BTreeSet<PathBuf> {
    paths.iter().map(|p| root.join(p)).collect()
}

#[test]
fn resources_and_config_map_generator() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        "resources: [deployment.yaml]\nconfigMapGenerator:\n- files: [cfg.properties]\n",
    );
    write(temp.path(), "deployment.yaml", "kind: Deployment");
    write(temp.path(), "cfg.properties", "a=b");
    write(temp.path(), "unrelated.yaml", "kind: Service");

    assert_eq!(
        resolve_set(temp.path()),
        set(
            temp.path(),
            &["kustomization.yaml", "deployment.yaml", "cfg.properties"]
        )
    );
}

#[test]
fn strategic_merge_plain_scalar_is_tracked() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        "patchesStrategicMerge:\n- patch.yaml\n",
    );

    assert_eq!(
        resolve_set(temp.path()),
        set(temp.path(), &["kustomization.yaml", "patch.yaml"])
    );
}

#[test]
fn strategic_merge_quoted_literal_is_not_tracked() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        "patchesStrategicMerge:\n- \"spec: {replicas: 2}\"\n",
    );

    let deps = resolve_set(temp.path());
    assert_eq!(deps, set(temp.path(), &["kustomization.yaml"]));
    assert!(
        deps.iter()
            .all(|d| !d.to_string_lossy().contains("replicas"))
    );
}

#[test]
fn inline_patches_never_appear() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        r#"
patches:
- patch: |-
    - op: add
      path: /metadata/labels/inline
      value: "yes"
patchesStrategicMerge:
- |-
  apiVersion: apps/v1
  kind: Deployment
  metadata:
    name: inline
"#,
    );

    assert_eq!(
        resolve_set(temp.path()),
        set(temp.path(), &["kustomization.yaml"])
    );
}

#[test]
fn local_directories_are_walked_transitively() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "overlays/prod/kustomization.yaml",
        "resources:\n- ../../base\n- ingress.yaml\n",
    );
    write(temp.path(), "overlays/prod/ingress.yaml", "kind: Ingress");
    write(temp.path(), "overlays/prod/notes.md", "not referenced");
    write(
        temp.path(),
        "base/kustomization.yaml",
        "resources: [deployment.yaml, components/db]\n",
    );
    write(temp.path(), "base/deployment.yaml", "kind: Deployment");
    write(temp.path(), "base/unused.yaml", "kind: Service");
    write(
        temp.path(),
        "base/components/db/kustomization.yml",
        "resources: [statefulset.yaml]\n",
    );
    write(temp.path(), "base/components/db/statefulset.yaml", "kind: StatefulSet");

    assert_eq!(
        resolve_set(&temp.path().join("overlays/prod")),
        set(
            temp.path(),
            &[
                "overlays/prod/kustomization.yaml",
                "overlays/prod/ingress.yaml",
                "base/kustomization.yaml",
                "base/deployment.yaml",
                "base/components/db/kustomization.yml",
                "base/components/db/statefulset.yaml",
            ]
        )
    );
}

#[test]
fn remote_bases_are_skipped() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        "bases:\n- github.com/kubernetes-sigs/kustomize//examples/helloWorld?ref=v3.3.1\nresources:\n- local.yaml\n- local-dir\n",
    );
    write(temp.path(), "local.yaml", "kind: ConfigMap");
    // A local directory that is not an overlay contributes nothing
    write(temp.path(), "local-dir/readme.txt", "");

    assert_eq!(
        resolve_set(temp.path()),
        set(temp.path(), &["kustomization.yaml", "local.yaml"])
    );
}

#[test]
fn directory_without_kustomization_is_empty() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "deployment.yaml", "kind: Deployment");
    write(temp.path(), "kustomization.json", "{}");

    assert!(resolve_set(temp.path()).is_empty());
}

#[test]
fn resolved_config_paths_are_recognised_by_the_watcher() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Kustomization", "resources: [base]\n");
    write(temp.path(), "base/kustomization.yaml", "resources: []\n");

    let configs: Vec<_> = resolve_set(temp.path())
        .into_iter()
        .filter(|p| is_kustomization_path(p))
        .collect();
    assert_eq!(configs.len(), 2);
}

#[test]
fn trailing_document_separator() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        "resources:\n- deployment.yaml\npatchesStrategicMerge:\n- patch.yaml\n---\n",
    );
    write(temp.path(), "deployment.yaml", "kind: Deployment");

    assert_eq!(
        resolve_set(temp.path()),
        set(
            temp.path(),
            &["kustomization.yaml", "deployment.yaml", "patch.yaml"]
        )
    );
}

#[test]
fn only_first_document_is_read() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kustomization.yaml",
        "resources: [deployment.yaml]\n---\nresources: [service.yaml]\ncrds: [crd.yaml]\n",
    );
    write(temp.path(), "deployment.yaml", "kind: Deployment");
    write(temp.path(), "service.yaml", "kind: Service");

    assert_eq!(
        resolve_set(temp.path()),
        set(temp.path(), &["kustomization.yaml", "deployment.yaml"])
    );
}

#[test]
fn self_reference_is_an_error() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "kustomization.yaml", "resources: [.]\n");

    assert!(dependencies_for_kustomization(temp.path()).is_err());
}

#[test]
fn mutual_reference_is_an_error() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a/kustomization.yaml", "resources: [../b]\n");
    write(temp.path(), "b/kustomization.yaml", "resources: [../a]\n");

    let err = dependencies_for_kustomization(temp.path().join("a")).unwrap_err();
    assert!(err.to_string().contains("includes itself"));
}

#[test]
fn shared_base_is_not_a_cycle() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "kustomization.yaml", "resources: [left, right]\n");
    write(temp.path(), "left/kustomization.yaml", "resources: [../base]\n");
    write(temp.path(), "right/kustomization.yaml", "resources: [../base]\n");
    write(temp.path(), "base/kustomization.yaml", "resources: [deployment.yaml]\n");
    write(temp.path(), "base/deployment.yaml", "kind: Deployment");

    assert_eq!(
        resolve_set(temp.path()),
        set(
            temp.path(),
            &[
                "kustomization.yaml",
                "left/kustomization.yaml",
                "right/kustomization.yaml",
                "base/kustomization.yaml",
                "base/deployment.yaml",
            ]
        )
    );
}
