//! Build settings resolution
//!
//! Settings come from three optional layers plus built-in defaults.
//! Priority: CLI flags > descriptor `custom.rust` > global config > default.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::defaults::{DEFAULT_RUNTIME, DEFAULT_TARGET};
use crate::error::SettingsError;
use crate::infra::toolchain::Toolchain;

/// One partially specified layer of settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsLayer {
    /// Build with `cross` (true) or host `cargo` (false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross: Option<bool>,

    /// Target triple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Runtime identifier for functions without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    /// Maximum number of functions built at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Extra arguments appended to the build command
    #[serde(
        default,
        alias = "cargo-flags",
        alias = "cargo_flags",
        skip_serializing_if = "Option::is_none"
    )]
    pub cargo_flags: Option<Vec<String>>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSettings {
    /// Compiler toolchain
    pub toolchain: Toolchain,
    /// Target triple
    pub target: String,
    /// Runtime identifier set on functions without one
    pub runtime: String,
    /// Pipeline limit; `None` starts every function at once
    pub jobs: Option<usize>,
    /// Extra arguments appended to the build command
    pub cargo_flags: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            toolchain: Toolchain::Cross,
            target: DEFAULT_TARGET.to_string(),
            runtime: DEFAULT_RUNTIME.to_string(),
            jobs: None,
            cargo_flags: Vec::new(),
        }
    }
}

impl BuildSettings {
    /// Merge layers, highest priority first, and validate the result
    pub fn resolve(layers: &[&SettingsLayer]) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let cross = layers.iter().find_map(|l| l.cross);
        let target = layers.iter().find_map(|l| l.target.clone());
        let runtime = layers.iter().find_map(|l| l.runtime.clone());
        let jobs = layers.iter().find_map(|l| l.jobs);
        let cargo_flags = layers.iter().find_map(|l| l.cargo_flags.clone());

        let settings = Self {
            toolchain: cross.map_or(defaults.toolchain, Toolchain::from_cross_flag),
            target: target.unwrap_or(defaults.target),
            runtime: runtime.unwrap_or(defaults.runtime),
            jobs,
            cargo_flags: cargo_flags.unwrap_or_default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the resolved values
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_target_triple(&self.target)?;
        if self.runtime.trim().is_empty() {
            return Err(SettingsError::EmptyRuntime);
        }
        if self.jobs == Some(0) {
            return Err(SettingsError::ZeroJobs);
        }
        Ok(())
    }
}

fn triple_regex() -> &'static Regex {
    static TRIPLE: OnceLock<Regex> = OnceLock::new();
    TRIPLE.get_or_init(|| {
        Regex::new(r"^[a-z0-9_]+(-[a-z0-9_.]+){2,3}$").expect("Invalid target triple pattern")
    })
}

/// Validate that `target` has the shape `<arch>-<vendor>-<os>[-<env>]`
pub fn validate_target_triple(target: &str) -> Result<(), SettingsError> {
    if triple_regex().is_match(target) {
        Ok(())
    } else {
        Err(SettingsError::InvalidTarget(target.to_string()))
    }
}
