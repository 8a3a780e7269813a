//! CLI error types with exit code handling
//!
//! Library errors are mapped to a [`CliError`] so each failure class exits
//! with its own code.

use kustomate_core::CoreError;
use kustomate_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Deploy or global configuration could not be loaded
    #[error("Configuration error: {message}")]
    #[diagnostic(code(kustomate::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Rendering the overlays failed
    #[error("Render failed: {message}")]
    #[diagnostic(
        code(kustomate::cli::render),
        help("run `kustomize build` on the overlay to see the full error")
    )]
    Render { message: String },

    /// Applying or deleting manifests failed
    #[error("{operation} failed: {message}")]
    #[diagnostic(code(kustomate::cli::deploy))]
    Deploy { operation: String, message: String },

    /// Dependency listing failed
    #[error("Listing dependencies failed: {message}")]
    #[diagnostic(code(kustomate::cli::deps))]
    Dependencies { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(kustomate::cli::io))]
    Io { message: String },

    /// Interrupted by the user
    #[error("operation cancelled")]
    #[diagnostic(code(kustomate::cli::cancelled))]
    Cancelled,
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Render { .. } => exit_codes::RENDER_ERROR,
            CliError::Deploy { .. } => exit_codes::DEPLOY_ERROR,
            CliError::Dependencies { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Cancelled => exit_codes::CANCELLED,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Map a failed `operation` ("Deploy", "Cleanup", ...) to a CLI error
    pub fn from_kube(operation: &str, err: KubeError) -> Self {
        let message = err.to_string();
        match err {
            KubeError::DebugHelpersRegistry(_) => Self::config(message),
            KubeError::KustomizeBuild { .. }
            | KubeError::ReadingManifests(_)
            | KubeError::ReplacingImages(_)
            | KubeError::Transform(_)
            | KubeError::SettingLabels(_)
            | KubeError::InvalidManifest(_) => Self::Render { message },
            KubeError::Dependencies { .. } => Self::Dependencies { message },
            KubeError::WriteOutput { .. } | KubeError::Io(_) => Self::Io { message },
            _ => Self::Deploy {
                operation: operation.to_string(),
                message,
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Read { .. } => CliError::config_with_help(
                err.to_string(),
                "pass --config to point at an existing kustomate.yaml",
            ),
            _ => CliError::config(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
