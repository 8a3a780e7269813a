//! Deploying kustomize overlays
//!
//! [`KustomizeDeployer`] ties the render pipeline, the dependency resolver
//! and the cluster together. Every call re-reads the overlays from disk.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use kustomate_core::{Artifact, DeployConfig, GlobalConfig, ManifestList};
use kustomate_kustomize::{DependencyResolver, KustomizeConventions, ManifestRenderer};

use crate::cluster::ClusterCli;
use crate::error::{KubeError, Result};
use crate::events::{DeployEvent, EventSink, NoEvents};
use crate::pipeline::{ManifestPipeline, ManifestTransform, Registries};

/// Outcome of a deploy
#[derive(Debug)]
pub enum DeployResult {
    /// Manifests were applied to these namespaces
    Success { namespaces: Vec<String> },
    Failure(KubeError),
}

impl DeployResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DeployResult::Success { .. })
    }

    /// Namespaces of the deployed resources; empty on failure
    pub fn namespaces(&self) -> &[String] {
        match self {
            DeployResult::Success { namespaces } => namespaces,
            DeployResult::Failure(_) => &[],
        }
    }

    pub fn into_result(self) -> Result<Vec<String>> {
        match self {
            DeployResult::Success { namespaces } => Ok(namespaces),
            DeployResult::Failure(e) => Err(e),
        }
    }
}

/// Deploys the manifests of kustomize overlays
pub struct KustomizeDeployer<C, R> {
    cluster: C,
    pipeline: ManifestPipeline<R>,
    resolver: DependencyResolver,
    insecure_registries: BTreeSet<String>,
    global_config: Option<PathBuf>,
    events: Box<dyn EventSink>,
}

impl<C: ClusterCli, R: ManifestRenderer> KustomizeDeployer<C, R> {
    pub fn new(config: &DeployConfig, cluster: C, renderer: R) -> Self {
        let pipeline = ManifestPipeline::new(
            renderer,
            config.kustomize_paths.clone(),
            config.build_args.clone(),
        )
        .with_labels(config.labels.clone());

        Self {
            cluster,
            pipeline,
            resolver: DependencyResolver::default(),
            insecure_registries: config.insecure_registries.clone(),
            global_config: None,
            events: Box::new(NoEvents),
        }
    }

    /// Add labels on top of the configured ones
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        let mut merged = self.pipeline.labels().clone();
        merged.extend(labels);
        self.pipeline = self.pipeline.with_labels(merged);
        self
    }

    /// Read the debug helpers registry from this global config file
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config = Some(path.into());
        self
    }

    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_transform(mut self, transform: impl ManifestTransform + 'static) -> Self {
        self.pipeline = self.pipeline.with_transform(transform);
        self
    }

    pub fn with_conventions(mut self, conventions: KustomizeConventions) -> Self {
        self.resolver = DependencyResolver::new(conventions);
        self
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    /// Render the overlays and apply them to the cluster
    pub async fn deploy(&self, out: &mut (dyn Write + Send), builds: &[Artifact]) -> DeployResult {
        self.events.emit(DeployEvent::InProgress);

        let manifests = match self.render_manifests(out, builds).await {
            Ok(manifests) => manifests,
            Err(e) => {
                self.events.emit(DeployEvent::Failed(e.to_string()));
                return DeployResult::Failure(e);
            }
        };

        if manifests.is_empty() {
            self.events.emit(DeployEvent::Complete);
            return DeployResult::Success {
                namespaces: Vec::new(),
            };
        }

        let namespaces = match manifests.collect_namespaces() {
            Ok(namespaces) => namespaces,
            Err(e) => {
                tracing::warn!("unable to collect namespaces: {}", e);
                self.events.emit(DeployEvent::Info(format!(
                    "could not fetch deployed resource namespace. \
                     This might cause port-forward and deploy health-check to fail: {}",
                    e
                )));
                Vec::new()
            }
        };

        if let Err(e) = self.cluster.apply(out, &manifests).await {
            self.events.emit(DeployEvent::Failed(e.to_string()));
            return DeployResult::Failure(e);
        }

        self.events.emit(DeployEvent::Complete);
        DeployResult::Success { namespaces }
    }

    /// Delete the resources of the overlays from the cluster
    ///
    /// Only the identity of the resources matters for deletion, so images
    /// and labels are left as rendered.
    pub async fn cleanup(&self, out: &mut (dyn Write + Send)) -> Result<()> {
        let manifests = self
            .pipeline
            .read_manifests()
            .await
            .map_err(|e| KubeError::ReadingManifests(Box::new(e)))?;

        self.cluster
            .delete(out, &manifests)
            .await
            .map_err(|e| KubeError::Delete(Box::new(e)))
    }

    /// Every local file the overlays depend on, sorted and deduplicated
    pub fn dependencies(&self) -> Result<Vec<PathBuf>> {
        let mut deps = BTreeSet::new();

        for path in self.pipeline.kustomize_paths() {
            let resolved = self
                .resolver
                .resolve(Path::new(path))
                .map_err(|source| KubeError::Dependencies {
                    path: path.clone(),
                    source,
                })?;
            deps.extend(resolved);
        }

        Ok(deps.into_iter().collect())
    }

    /// Render the manifests to `output` or, without one, to `out`
    pub async fn render(
        &self,
        out: &mut (dyn Write + Send),
        builds: &[Artifact],
        output: Option<&Path>,
    ) -> Result<()> {
        let manifests = self.render_manifests(out, builds).await?;
        let text = manifests.to_string();

        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|source| {
                            KubeError::WriteOutput {
                                path: path.to_path_buf(),
                                source,
                            }
                        })?;
                    }
                }
                std::fs::write(path, text).map_err(|source| KubeError::WriteOutput {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => {
                writeln!(out, "{}", text)?;
                Ok(())
            }
        }
    }

    async fn render_manifests(
        &self,
        out: &mut (dyn Write + Send),
        builds: &[Artifact],
    ) -> Result<ManifestList> {
        if let Err(e) = self.cluster.check_version().await {
            writeln!(out, "kubectl client version: {}", self.cluster.version().await)?;
            writeln!(out, "{}", e)?;
        }

        let global = GlobalConfig::load(self.global_config.as_deref())
            .map_err(KubeError::DebugHelpersRegistry)?;
        let registries = Registries {
            insecure_registries: self.insecure_registries.clone(),
            debug_helpers_registry: global.debug_helpers_registry,
        };

        self.pipeline.render(builds, &registries).await
    }
}
