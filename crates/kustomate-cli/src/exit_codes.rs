//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - unreadable or invalid configuration
pub const CONFIG_ERROR: i32 = 2;

/// Render error - kustomize build or a manifest transform failed
pub const RENDER_ERROR: i32 = 3;

/// Deploy error - kubectl apply or delete failed
pub const DEPLOY_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Interrupted by Ctrl-C (128 + SIGINT)
pub const CANCELLED: i32 = 130;
