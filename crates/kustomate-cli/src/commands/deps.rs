//! Deps command - list the files a watcher should track

use std::io::Write;

use super::Context;
use crate::error::{CliError, Result};

/// Run the deps command
pub fn run(ctx: &Context) -> Result<()> {
    let deps = ctx
        .deployer(false)
        .dependencies()
        .map_err(|e| CliError::from_kube("Deps", e))?;

    let mut out = std::io::stdout().lock();
    for dep in deps {
        writeln!(out, "{}", dep.display())?;
    }
    Ok(())
}
