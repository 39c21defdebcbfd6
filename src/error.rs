//! Error types for rustlift
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Build errors
///
/// Every variant is fatal for the whole run: there is no partial success.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Nothing in the descriptor is tagged for rustlift
    #[error("No eligible functions found. Tag functions with `tags: {{ rust: true }}` to build them")]
    NoEligibleTargets,

    /// Handler locator is not of the form `<dir>.<name>`
    #[error("Function '{function}' has invalid handler '{locator}': {reason}")]
    InvalidLocator {
        function: String,
        locator: String,
        reason: String,
    },

    /// Toolchain invocation failed
    #[error("Compile failed for '{target}': {cause}")]
    Compile { target: String, cause: String },

    /// Post-compile archive manipulation failed
    #[error("Packaging failed for '{target}': {cause}")]
    Package { target: String, cause: String },

    /// One or more target pipelines failed
    #[error("{} of {total} functions failed to build:\n{}", .failures.len(), format_failures(.failures))]
    TargetsFailed {
        total: usize,
        failures: Vec<BuildError>,
    },

    /// Required program missing from PATH
    #[error("'{program}' not found in PATH. {suggestion}")]
    ToolchainNotFound { program: String, suggestion: String },
}

fn format_failures(failures: &[BuildError]) -> String {
    failures
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Descriptor errors
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Descriptor file not found
    #[error("Descriptor not found at '{path}'")]
    NotFound { path: PathBuf },

    /// Failed to read the descriptor file
    #[error("Failed to read descriptor '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to write the descriptor file
    #[error("Failed to write descriptor '{path}': {error}")]
    WriteError { path: PathBuf, error: String },

    /// YAML could not be parsed
    #[error("Failed to parse descriptor: {0}")]
    ParseError(String),

    /// A function entry has an unexpected shape
    #[error("Function '{function}' is malformed: {error}")]
    InvalidFunction { function: String, error: String },

    /// The `custom.rust` section has an unexpected shape
    #[error("Invalid `custom.rust` settings: {0}")]
    InvalidSettings(String),

    /// Function referenced by name does not exist
    #[error("Function '{0}' not found in descriptor")]
    UnknownFunction(String),
}

/// Settings validation errors
#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    /// Target triple does not look like `arch-vendor-os[-env]`
    #[error("Invalid target triple '{0}': expected <arch>-<vendor>-<os>[-<env>]")]
    InvalidTarget(String),

    /// Runtime identifier is empty
    #[error("Runtime identifier cannot be empty")]
    EmptyRuntime,

    /// Job limit of zero
    #[error("Job limit must be at least 1")]
    ZeroJobs,
}

/// Top-level rustlift error type
#[derive(Error, Debug)]
pub enum RustliftError {
    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Descriptor error
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Settings error
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}
