//! Build artifacts handed to the deployer

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A built image
///
/// `image_name` is the image as it is written in the manifests,
/// `tag` is the fully qualified reference that replaces it on deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub image_name: String,
    pub tag: String,
}

impl Artifact {
    pub fn new(image_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            tag: tag.into(),
        }
    }
}

/// Parses the `NAME=TAG` form used on the command line
impl FromStr for Artifact {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, tag)) if !name.is_empty() && !tag.is_empty() => Ok(Self::new(name, tag)),
            _ => Err(CoreError::InvalidArtifact {
                value: s.to_string(),
            }),
        }
    }
}
