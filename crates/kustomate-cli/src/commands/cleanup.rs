//! Cleanup command - delete the resources of the overlays

use console::style;

use super::Context;
use crate::error::{CliError, Result};

/// Run the cleanup command
pub async fn run(ctx: &Context) -> Result<()> {
    println!(
        "{} Cleaning up {}",
        style("→").blue().bold(),
        style(ctx.config.kustomize_paths.join(", ")).cyan()
    );

    let mut out = std::io::stdout();
    ctx.deployer(false)
        .cleanup(&mut out)
        .await
        .map_err(|e| CliError::from_kube("Cleanup", e))?;

    println!("{} Cleanup complete", style("✓").green().bold());
    Ok(())
}
