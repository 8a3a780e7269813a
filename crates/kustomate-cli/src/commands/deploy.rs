//! Deploy command - render the overlays and apply them

use console::style;
use kustomate_core::Artifact;
use kustomate_kube::{ConsoleEvents, DeployResult};

use super::Context;
use crate::error::{CliError, Result};

/// Run the deploy command
pub async fn run(
    ctx: &Context,
    images: &[Artifact],
    labels: Vec<(String, String)>,
    force: bool,
) -> Result<()> {
    println!(
        "{} Deploying {}",
        style("→").blue().bold(),
        style(ctx.config.kustomize_paths.join(", ")).cyan()
    );

    let deployer = ctx
        .deployer(force)
        .with_labels(super::labels(labels))
        .with_events(ConsoleEvents::new());

    let mut out = std::io::stdout();
    match deployer.deploy(&mut out, images).await {
        DeployResult::Success { namespaces } => {
            if namespaces.is_empty() {
                println!("{} Deployed", style("✓").green().bold());
            } else {
                println!(
                    "{} Deployed to namespace(s) {}",
                    style("✓").green().bold(),
                    style(namespaces.join(", ")).yellow()
                );
            }
            Ok(())
        }
        DeployResult::Failure(err) => Err(CliError::from_kube("Deploy", err)),
    }
}
