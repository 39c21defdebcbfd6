//! Toolchain management
//!
//! Builds the compiler invocation for a target and knows where each toolchain
//! leaves its output. `cross` runs cargo inside a Docker/Podman container, so
//! it also needs a container runtime on the host.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::RELEASE_PROFILE_DIR;
use crate::infra::process::{is_on_path, Invocation};

/// Compiler toolchain used for the compile stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// `cross`, cargo inside a container image for the target
    Cross,
    /// `cargo` on the host, the target must be installed with rustup
    Cargo,
}

impl Toolchain {
    /// Pick the toolchain from the `cross` setting
    pub fn from_cross_flag(cross: bool) -> Self {
        if cross {
            Self::Cross
        } else {
            Self::Cargo
        }
    }

    /// Program name for this toolchain
    pub fn program(self) -> &'static str {
        match self {
            Self::Cross => "cross",
            Self::Cargo => "cargo",
        }
    }

    /// Whether builds run inside a container
    pub fn is_sandboxed(self) -> bool {
        matches!(self, Self::Cross)
    }

    /// Install hint shown when the program is missing
    pub fn install_hint(self) -> &'static str {
        match self {
            Self::Cross => "Install it with `cargo install cross` or pass --no-cross to build natively",
            Self::Cargo => "Install Rust from https://rustup.rs/",
        }
    }

    /// Compile invocation for `binary` inside `source_dir`
    pub fn compile_invocation(
        self,
        source_dir: &Path,
        target: &str,
        binary: &str,
        extra_args: &[String],
    ) -> Invocation {
        Invocation::new(self.program(), source_dir)
            .args(["build", "--release", "--target", target, "--bin", binary])
            .args(extra_args.iter().map(String::as_str))
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Directory the release executable for `target` lands in
///
/// Both toolchains use cargo's layout: `<source>/target/<triple>/release`.
pub fn output_dir(source_dir: &Path, target: &str) -> PathBuf {
    source_dir
        .join("target")
        .join(target)
        .join(RELEASE_PROFILE_DIR)
}

/// Container runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    /// Docker container runtime
    Docker,
    /// Podman container runtime
    Podman,
}

impl ContainerRuntime {
    /// Get the command name for this runtime
    pub fn command(self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Detect an available container runtime, Docker first
    pub fn detect() -> Option<Self> {
        [Self::Docker, Self::Podman]
            .into_iter()
            .find(|rt| is_on_path(rt.command()))
    }
}
