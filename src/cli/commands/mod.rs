//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod doctor;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::core::descriptor::Descriptor;
use crate::core::global_config::GlobalConfig;
use crate::core::settings::{BuildSettings, SettingsLayer};
use crate::infra::dirs::RustliftDirs;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile and package every rust-tagged function, then rewrite the descriptor
    Build {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Write the rewritten descriptor to this file instead of stdout
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Overwrite the descriptor file with the rewritten descriptor
        #[arg(long)]
        in_place: bool,
    },

    /// Validate the descriptor and show what would be built
    Check {
        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Check system dependencies
    Doctor {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Build settings accepted on the command line
///
/// Anything left unset falls back to the descriptor's `custom.rust` section,
/// then to the global config, then to the built-in default.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Build inside a container with `cross`
    #[arg(long, conflicts_with = "no_cross")]
    pub cross: bool,

    /// Build with the host `cargo`
    #[arg(long)]
    pub no_cross: bool,

    /// Target triple
    #[arg(short, long)]
    pub target: Option<String>,

    /// Runtime identifier for functions that do not set one
    #[arg(short, long)]
    pub runtime: Option<String>,

    /// Maximum number of functions built at once (default: all)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Extra argument for the build command (repeatable)
    #[arg(long = "cargo-flag", value_name = "ARG", allow_hyphen_values = true)]
    pub cargo_flags: Vec<String>,
}

impl SettingsArgs {
    /// The command-line settings layer
    pub fn layer(&self) -> SettingsLayer {
        let cross = if self.cross {
            Some(true)
        } else if self.no_cross {
            Some(false)
        } else {
            None
        };

        SettingsLayer {
            cross,
            target: self.target.clone(),
            runtime: self.runtime.clone(),
            jobs: self.jobs,
            cargo_flags: (!self.cargo_flags.is_empty()).then(|| self.cargo_flags.clone()),
        }
    }
}

/// Where the rewritten descriptor goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output
    Stdout,
    /// A file, possibly the descriptor itself
    File(PathBuf),
}

impl Commands {
    /// Execute the command against the descriptor at `file`
    pub async fn run(self, file: &Path) -> Result<()> {
        match self {
            Self::Build {
                settings,
                output,
                in_place,
            } => {
                let destination = match (output, in_place) {
                    (Some(path), _) => Destination::File(path),
                    (None, true) => Destination::File(file.to_path_buf()),
                    (None, false) => Destination::Stdout,
                };
                build::execute(file, &settings, destination).await
            }
            Self::Check { settings } => check::execute(file, &settings).await,
            Self::Doctor { settings } => doctor::execute(file, &settings).await,
        }
    }
}

/// A loaded descriptor with its resolved settings
pub struct Workspace {
    /// The parsed descriptor
    pub descriptor: Descriptor,
    /// Directory handler locators are relative to
    pub base_dir: PathBuf,
    /// Resolved build settings
    pub settings: BuildSettings,
}

/// Load the descriptor at `file` and resolve settings against it
pub fn load_workspace(file: &Path, args: &SettingsArgs) -> Result<Workspace> {
    if !file.exists() {
        bail!(
            "No descriptor found at '{}'. Pass --file to point at your serverless.yml",
            file.display()
        );
    }

    let descriptor = Descriptor::load(file)
        .with_context(|| format!("Failed to load descriptor '{}'", file.display()))?;
    let settings = resolve_settings(&descriptor, args)?;

    let base_dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    tracing::info!(
        "Loaded descriptor {} (service: {})",
        file.display(),
        descriptor.service().unwrap_or("unnamed")
    );

    Ok(Workspace {
        descriptor,
        base_dir,
        settings,
    })
}

/// Resolve settings: CLI, then descriptor, then global config
pub fn resolve_settings(descriptor: &Descriptor, args: &SettingsArgs) -> Result<BuildSettings> {
    let cli = args.layer();
    let from_descriptor = descriptor
        .rust_settings()
        .context("Failed to read `custom.rust` settings")?;
    let global = GlobalConfig::load(&RustliftDirs::new()).context("Failed to load global config")?;

    let settings = BuildSettings::resolve(&[&cli, &from_descriptor, &global.build])?;
    tracing::debug!("Resolved settings: {settings:?}");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_args_layer() {
        let args = SettingsArgs {
            no_cross: true,
            jobs: Some(2),
            cargo_flags: vec!["--locked".to_string()],
            ..SettingsArgs::default()
        };
        let layer = args.layer();
        assert_eq!(layer.cross, Some(false));
        assert_eq!(layer.jobs, Some(2));
        assert_eq!(layer.cargo_flags, Some(vec!["--locked".to_string()]));
        assert!(layer.target.is_none());
    }

    #[test]
    fn test_empty_settings_args_leave_layer_unset() {
        assert_eq!(SettingsArgs::default().layer(), SettingsLayer::default());
    }

    #[test]
    fn test_load_workspace_missing_descriptor() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = load_workspace(&temp.path().join("serverless.yml"), &SettingsArgs::default());
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("No descriptor found"));
    }

    #[test]
    fn test_load_workspace_base_dir_is_descriptor_parent() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("serverless.yml");
        std::fs::write(&file, "service: shop\n").unwrap();

        let workspace = load_workspace(&file, &SettingsArgs::default()).unwrap();

        assert_eq!(workspace.base_dir, temp.path());
        assert_eq!(workspace.descriptor.service(), Some("shop"));
    }
}
