//! Render command - print the manifests that would be deployed

use std::path::Path;

use console::style;
use kustomate_core::Artifact;

use super::Context;
use crate::error::{CliError, Result};

/// Run the render command
pub async fn run(
    ctx: &Context,
    images: &[Artifact],
    labels: Vec<(String, String)>,
    output: Option<&Path>,
) -> Result<()> {
    let deployer = ctx.deployer(false).with_labels(super::labels(labels));

    let mut out = std::io::stdout();
    deployer
        .render(&mut out, images, output)
        .await
        .map_err(|e| CliError::from_kube("Render", e))?;

    if let Some(path) = output {
        eprintln!(
            "{} Wrote manifests to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}
