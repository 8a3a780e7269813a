//! Rendered manifest lists
//!
//! A `ManifestList` is the ordered set of YAML documents produced by
//! `kustomize build`. Documents are kept as text so that anything the
//! deployer does not touch reaches `kubectl` exactly as it was rendered.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_yaml::{Mapping, Value};

use crate::artifact::Artifact;
use crate::error::{CoreError, Result};

/// Separator used between documents
const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// Ordered list of YAML documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestList {
    documents: Vec<String>,
}

impl ManifestList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a (possibly multi-document) YAML stream
    ///
    /// The stream is split on `---` separator lines; empty and comment-only
    /// documents are dropped.
    pub fn append(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let mut current = String::new();

        for line in text.lines() {
            if is_separator(line) {
                self.push_document(std::mem::take(&mut current));
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        self.push_document(current);
    }

    fn push_document(&mut self, doc: String) {
        let is_blank = doc
            .lines()
            .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'));
        if !is_blank {
            self.documents.push(doc.trim_end().to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Replace image references with the tags of built artifacts
    ///
    /// Every string under an `image` key whose repository (tag and digest
    /// stripped) equals an artifact's `image_name` is rewritten to the
    /// artifact's `tag`. Documents without a replacement keep their text.
    pub fn replace_images(&self, builds: &[Artifact]) -> Result<ManifestList> {
        if builds.is_empty() {
            return Ok(self.clone());
        }

        let mut replaced_names = BTreeSet::new();
        let mut documents = Vec::with_capacity(self.documents.len());

        for (index, doc) in self.documents.iter().enumerate() {
            let mut value = parse_document(index, doc)?;
            if replace_images_in(&mut value, builds, &mut replaced_names) {
                documents.push(serialize_document(index, &value)?);
            } else {
                documents.push(doc.clone());
            }
        }

        for artifact in builds {
            if !replaced_names.contains(artifact.image_name.as_str()) {
                tracing::debug!(
                    image = %artifact.image_name,
                    "image is not referenced by any manifest"
                );
            }
        }

        Ok(ManifestList { documents })
    }

    /// Merge labels into `metadata.labels` of every resource
    pub fn set_labels(&self, labels: &BTreeMap<String, String>) -> Result<ManifestList> {
        if labels.is_empty() {
            return Ok(self.clone());
        }

        let mut documents = Vec::with_capacity(self.documents.len());
        for (index, doc) in self.documents.iter().enumerate() {
            let mut value = parse_document(index, doc)?;
            let Value::Mapping(resource) = &mut value else {
                documents.push(doc.clone());
                continue;
            };

            let metadata = child_mapping(resource, "metadata");
            let existing = child_mapping(metadata, "labels");
            for (key, val) in labels {
                existing.insert(Value::String(key.clone()), Value::String(val.clone()));
            }

            documents.push(serialize_document(index, &value)?);
        }

        Ok(ManifestList { documents })
    }

    /// Collect the distinct namespaces the resources are deployed to
    pub fn collect_namespaces(&self) -> Result<Vec<String>> {
        let mut namespaces = BTreeSet::new();

        for (index, doc) in self.documents.iter().enumerate() {
            let value = parse_document(index, doc)?;
            let namespace = value
                .get("metadata")
                .and_then(|m| m.get("namespace"))
                .and_then(Value::as_str);
            if let Some(ns) = namespace {
                if !ns.is_empty() {
                    namespaces.insert(ns.to_string());
                }
            }
        }

        Ok(namespaces.into_iter().collect())
    }
}

impl fmt::Display for ManifestList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.documents.join(DOCUMENT_SEPARATOR))
    }
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    line == "---" || line.starts_with("--- ")
}

fn parse_document(index: usize, doc: &str) -> Result<Value> {
    serde_yaml::from_str(doc).map_err(|e| CoreError::InvalidManifest {
        message: format!("document {}: {}", index, e),
    })
}

fn serialize_document(index: usize, value: &Value) -> Result<String> {
    let text = serde_yaml::to_string(value).map_err(|e| CoreError::InvalidManifest {
        message: format!("document {}: {}", index, e),
    })?;
    Ok(text.trim_end().to_string())
}

/// Get or create a nested mapping under `key`
fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> &'a mut Mapping {
    let key = Value::String(key.to_string());
    let entry = parent.entry(key).or_insert(Value::Mapping(Mapping::new()));
    if !entry.is_mapping() {
        *entry = Value::Mapping(Mapping::new());
    }
    match entry {
        Value::Mapping(m) => m,
        _ => unreachable!("entry was just set to a mapping"),
    }
}

fn replace_images_in<'a>(
    value: &mut Value,
    builds: &'a [Artifact],
    replaced: &mut BTreeSet<&'a str>,
) -> bool {
    let mut changed = false;
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping.iter_mut() {
                if key.as_str() == Some("image") {
                    if let Value::String(image) = child {
                        if let Some(artifact) = find_artifact(image, builds) {
                            if *image != artifact.tag {
                                *image = artifact.tag.clone();
                                changed = true;
                            }
                            replaced.insert(artifact.image_name.as_str());
                            continue;
                        }
                    }
                }
                changed |= replace_images_in(child, builds, replaced);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                changed |= replace_images_in(item, builds, replaced);
            }
        }
        Value::Tagged(tagged) => {
            changed |= replace_images_in(&mut tagged.value, builds, replaced);
        }
        _ => {}
    }
    changed
}

fn find_artifact<'a>(image: &str, builds: &'a [Artifact]) -> Option<&'a Artifact> {
    let repository = image_repository(image);
    builds.iter().find(|a| a.image_name == repository)
}

/// Strip the tag and digest from an image reference
fn image_repository(image: &str) -> &str {
    let without_digest = image.split_once('@').map_or(image, |(repo, _)| repo);
    match without_digest.rfind(':') {
        Some(colon) if !without_digest[colon..].contains('/') => &without_digest[..colon],
        _ => without_digest,
    }
}
