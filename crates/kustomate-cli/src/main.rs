//! Kustomate CLI - deploy kustomize overlays with kubectl

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kustomate_core::Artifact;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod error;
mod exit_codes;

use commands::Context;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "kustomate")]
#[command(version)]
#[command(about = "Deploy kustomize overlays with kubectl", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Deploy configuration file (default: ./kustomate.yaml when present)
    #[arg(short, long, global = true, env = "KUSTOMATE_CONFIG")]
    config: Option<PathBuf>,

    /// Global configuration file (default: ~/.kustomate/config)
    #[arg(long, global = true, env = "KUSTOMATE_GLOBAL_CONFIG")]
    global_config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the overlays and apply them to the cluster
    Deploy {
        /// Built image replacing an image in the manifests (NAME=TAG)
        #[arg(long = "image", value_name = "NAME=TAG")]
        images: Vec<Artifact>,

        /// Label added to every resource (KEY=VALUE)
        #[arg(long = "label", value_name = "KEY=VALUE", value_parser = commands::parse_label)]
        labels: Vec<(String, String)>,

        /// Pass --force to kubectl apply
        #[arg(long)]
        force: bool,
    },

    /// Delete the resources of the overlays from the cluster
    Cleanup,

    /// Render the overlays without deploying them
    Render {
        /// Built image replacing an image in the manifests (NAME=TAG)
        #[arg(long = "image", value_name = "NAME=TAG")]
        images: Vec<Artifact>,

        /// Label added to every resource (KEY=VALUE)
        #[arg(long = "label", value_name = "KEY=VALUE", value_parser = commands::parse_label)]
        labels: Vec<(String, String)>,

        /// Output file (if not set, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the local files the overlays depend on
    Deps,
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(CliError::Cancelled),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let global_config = cli.global_config.or_else(default_global_config);
    let ctx = Context::load(cli.config.as_deref(), global_config)?;

    match cli.command {
        Commands::Deploy {
            images,
            labels,
            force,
        } => commands::deploy::run(&ctx, &images, labels, force).await,
        Commands::Cleanup => commands::cleanup::run(&ctx).await,
        Commands::Render {
            images,
            labels,
            output,
        } => commands::render::run(&ctx, &images, labels, output.as_deref()).await,
        Commands::Deps => commands::deps::run(&ctx),
    }
}

fn default_global_config() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kustomate").join("config"))
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--debug`
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
