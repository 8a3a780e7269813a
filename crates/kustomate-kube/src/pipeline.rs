//! Render -> transform pipeline
//!
//! Every overlay is rendered with `kustomize build`, the outputs are
//! concatenated, then images are replaced, registered transforms run in
//! order and labels are injected last.

use std::collections::{BTreeMap, BTreeSet};

use kustomate_core::{Artifact, ManifestList};
use kustomate_kustomize::{ManifestRenderer, build_command_args};

use crate::error::{KubeError, Result};

/// Registries a transform may need to rewrite image references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registries {
    pub insecure_registries: BTreeSet<String>,
    pub debug_helpers_registry: String,
}

/// A step applied to the rendered manifests between image replacement and
/// label injection
pub trait ManifestTransform: Send + Sync {
    fn transform(
        &self,
        manifests: ManifestList,
        builds: &[Artifact],
        registries: &Registries,
    ) -> Result<ManifestList>;
}

impl<F> ManifestTransform for F
where
    F: Fn(ManifestList, &[Artifact], &Registries) -> Result<ManifestList> + Send + Sync,
{
    fn transform(
        &self,
        manifests: ManifestList,
        builds: &[Artifact],
        registries: &Registries,
    ) -> Result<ManifestList> {
        self(manifests, builds, registries)
    }
}

/// Renders the configured overlays into one manifest list
pub struct ManifestPipeline<R> {
    renderer: R,
    kustomize_paths: Vec<String>,
    build_args: Vec<String>,
    labels: BTreeMap<String, String>,
    transforms: Vec<Box<dyn ManifestTransform>>,
}

impl<R: ManifestRenderer> ManifestPipeline<R> {
    pub fn new(renderer: R, kustomize_paths: Vec<String>, build_args: Vec<String>) -> Self {
        Self {
            renderer,
            kustomize_paths,
            build_args,
            labels: BTreeMap::new(),
            transforms: Vec::new(),
        }
    }

    /// Labels injected into every manifest
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Register a transform; transforms run in registration order
    pub fn with_transform(mut self, transform: impl ManifestTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn kustomize_paths(&self) -> &[String] {
        &self.kustomize_paths
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Render every overlay, in order, without transforming the result
    pub async fn read_manifests(&self) -> Result<ManifestList> {
        let mut manifests = ManifestList::new();

        for path in &self.kustomize_paths {
            let args = build_command_args(&self.build_args, path);
            let out = self
                .renderer
                .build(&args)
                .await
                .map_err(|source| KubeError::KustomizeBuild {
                    path: path.clone(),
                    source,
                })?;

            if out.is_empty() {
                tracing::debug!("kustomize build {} produced no output", path);
                continue;
            }
            manifests.append(&out);
        }

        Ok(manifests)
    }

    /// Render and transform the manifests for `builds`
    pub async fn render(&self, builds: &[Artifact], registries: &Registries) -> Result<ManifestList> {
        let manifests = self
            .read_manifests()
            .await
            .map_err(|e| KubeError::ReadingManifests(Box::new(e)))?;

        if manifests.is_empty() {
            return Ok(manifests);
        }

        let mut manifests = manifests
            .replace_images(builds)
            .map_err(KubeError::ReplacingImages)?;

        for transform in &self.transforms {
            manifests = transform
                .transform(manifests, builds, registries)
                .map_err(|e| KubeError::Transform(Box::new(e)))?;
        }

        manifests
            .set_labels(&self.labels)
            .map_err(KubeError::SettingLabels)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use kustomate_kustomize::KustomizeError;

    use super::*;

    /// Renderer returning canned output per overlay path (the last argument)
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedRenderer {
        outputs: HashMap<String, std::result::Result<String, String>>,
        pub(crate) calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl ScriptedRenderer {
        pub(crate) fn output(mut self, path: &str, out: &str) -> Self {
            self.outputs.insert(path.to_string(), Ok(out.to_string()));
            self
        }

        pub(crate) fn failure(mut self, path: &str, stderr: &str) -> Self {
            self.outputs.insert(path.to_string(), Err(stderr.to_string()));
            self
        }
    }

    #[async_trait]
    impl ManifestRenderer for ScriptedRenderer {
        async fn build(&self, args: &[String]) -> kustomate_kustomize::Result<Vec<u8>> {
            self.calls.lock().unwrap().push(args.to_vec());
            let path = args.last().cloned().unwrap_or_default();
            match self.outputs.get(&path) {
                Some(Ok(out)) => Ok(out.clone().into_bytes()),
                Some(Err(stderr)) => Err(KustomizeError::CommandFailed {
                    command: format!("kustomize {}", args.join(" ")),
                    status: "exit status: 1".to_string(),
                    stderr: stderr.clone(),
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    const DEPLOYMENT: &str = "apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
      - name: web
        image: web
";

    fn paths(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_first_overlay_is_skipped() {
        let renderer = ScriptedRenderer::default()
            .output("overlays/empty", "")
            .output("overlays/dev", "kind: ConfigMap\nmetadata:\n  name: a\n---\nkind: Secret\nmetadata:\n  name: b\n");
        let pipeline = ManifestPipeline::new(
            renderer.clone(),
            paths(&["overlays/empty", "overlays/dev"]),
            vec!["--reorder none".to_string()],
        );

        let manifests = pipeline.render(&[], &Registries::default()).await.unwrap();
        assert_eq!(manifests.len(), 2);
        assert!(manifests.documents()[0].contains("ConfigMap"));
        assert!(manifests.documents()[1].contains("Secret"));

        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], paths(&["build", "--reorder", "none", "overlays/empty"]));
    }

    #[tokio::test]
    async fn test_render_replaces_images_and_sets_labels() {
        let renderer = ScriptedRenderer::default().output(".", DEPLOYMENT);
        let labels = BTreeMap::from([("app.kubernetes.io/managed-by".to_string(), "kustomate".to_string())]);
        let pipeline = ManifestPipeline::new(renderer, paths(&["."]), vec![]).with_labels(labels);

        let builds = [Artifact::new("web", "registry.local/web:abc123")];
        let manifests = pipeline.render(&builds, &Registries::default()).await.unwrap();

        let out = manifests.to_string();
        assert!(out.contains("image: registry.local/web:abc123"));
        assert!(out.contains("app.kubernetes.io/managed-by: kustomate"));
    }

    #[tokio::test]
    async fn test_transforms_run_in_order() {
        let renderer = ScriptedRenderer::default().output(".", DEPLOYMENT);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();

        let pipeline = ManifestPipeline::new(renderer, paths(&["."]), vec![])
            .with_transform(move |m: ManifestList, _: &[Artifact], r: &Registries| -> Result<ManifestList> {
                first.lock().unwrap().push(format!("first:{}", r.debug_helpers_registry));
                Ok(m)
            })
            .with_transform(move |m: ManifestList, b: &[Artifact], _: &Registries| -> Result<ManifestList> {
                second.lock().unwrap().push(format!("second:{}", b.len()));
                Ok(m)
            });

        let registries = Registries {
            debug_helpers_registry: "gcr.io/debug".to_string(),
            ..Default::default()
        };
        pipeline
            .render(&[Artifact::new("web", "web:1")], &registries)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["first:gcr.io/debug", "second:1"]);
    }

    #[tokio::test]
    async fn test_failing_transform_aborts() {
        let renderer = ScriptedRenderer::default().output(".", DEPLOYMENT);
        let pipeline = ManifestPipeline::new(renderer, paths(&["."]), vec![]).with_transform(
            |_: ManifestList, _: &[Artifact], _: &Registries| -> Result<ManifestList> {
                Err(KubeError::InvalidManifest("no containers".to_string()))
            },
        );

        let err = pipeline.render(&[], &Registries::default()).await.unwrap_err();
        assert!(matches!(err, KubeError::Transform(_)));
        assert!(err.to_string().starts_with("unable to transform manifests"));
    }

    #[tokio::test]
    async fn test_empty_render_skips_transforms() {
        let pipeline = ManifestPipeline::new(ScriptedRenderer::default(), paths(&["."]), vec![])
            .with_transform(|_: ManifestList, _: &[Artifact], _: &Registries| -> Result<ManifestList> {
                Err(KubeError::InvalidManifest("must not run".to_string()))
            });

        let manifests = pipeline.render(&[], &Registries::default()).await.unwrap();
        assert!(manifests.is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_is_wrapped() {
        let renderer = ScriptedRenderer::default().failure("overlays/prod", "missing kustomization");
        let pipeline = ManifestPipeline::new(renderer, paths(&["overlays/prod"]), vec![]);

        let err = pipeline.render(&[], &Registries::default()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("reading manifests: kustomize build overlays/prod"));
        assert!(message.contains("missing kustomization"));
    }

    #[tokio::test]
    async fn test_unparseable_manifest_keeps_source() {
        let renderer = ScriptedRenderer::default().output(".", "kind: [unclosed\n");
        let pipeline = ManifestPipeline::new(renderer, paths(&["."]), vec![]);

        let err = pipeline
            .render(&[Artifact::new("web", "web:v1")], &Registries::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::ReplacingImages(_)));
        let source = std::error::Error::source(&err).expect("core error kept as source");
        assert!(source.downcast_ref::<kustomate_core::CoreError>().is_some());
    }
}
