//! Check command logic
//!
//! Validates the descriptor and settings and reports what would be built,
//! without starting any process.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::descriptor::Descriptor;
use crate::core::package::ZIP_PROGRAM;
use crate::core::settings::BuildSettings;
use crate::core::target::collect_targets;
use crate::error::{BuildError, RustliftError};

/// One function the build would compile and package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTarget {
    /// Function key in the descriptor
    pub function: String,
    /// Binary name
    pub binary: String,
    /// Directory the toolchain runs in
    pub source_dir: PathBuf,
    /// Compile command line
    pub command: String,
    /// Artifact path that would be written into the descriptor
    pub artifact: String,
}

/// Result of the check operation
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    /// Functions that would be built, in descriptor order
    pub targets: Vec<PlannedTarget>,
    /// Functions without the eligibility tag
    pub skipped: Vec<String>,
    /// Programs the build needs that are not on PATH
    pub missing_programs: Vec<String>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Whether a build could start
    pub fn is_ready(&self) -> bool {
        !self.targets.is_empty() && self.missing_programs.is_empty()
    }
}

/// Plan a build of `descriptor` without running it
///
/// Fails with the same errors `build` raises before spawning anything,
/// except that missing programs are reported rather than fatal.
/// `is_available` decides whether a program is on PATH.
pub fn check(
    descriptor: &Descriptor,
    base_dir: &Path,
    settings: &BuildSettings,
    is_available: impl Fn(&str) -> bool,
) -> Result<CheckReport, RustliftError> {
    let functions = descriptor.functions()?;
    let targets = collect_targets(&functions, base_dir)?;
    if targets.is_empty() {
        return Err(BuildError::NoEligibleTargets.into());
    }

    let mut report = CheckReport {
        skipped: functions
            .iter()
            .filter(|f| !f.eligible)
            .map(|f| f.name.clone())
            .collect(),
        ..CheckReport::default()
    };

    for program in [settings.toolchain.program(), ZIP_PROGRAM] {
        if !is_available(program) {
            report.missing_programs.push(program.to_string());
        }
    }

    for target in &targets {
        if !target.source_dir.join("Cargo.toml").is_file() {
            report.warnings.push(format!(
                "{}: no Cargo.toml in '{}'",
                target.function,
                target.source_dir.display()
            ));
        }

        let runtime = functions
            .iter()
            .find(|f| f.name == target.function)
            .and_then(|f| f.runtime.as_deref());
        if let Some(runtime) = runtime {
            if !runtime.starts_with("provided") {
                report.warnings.push(format!(
                    "{}: runtime '{runtime}' is kept, but a custom runtime is needed to run a bootstrap executable",
                    target.function
                ));
            }
        }

        let command = settings
            .toolchain
            .compile_invocation(
                &target.source_dir,
                &settings.target,
                &target.binary,
                &settings.cargo_flags,
            )
            .display();

        report.targets.push(PlannedTarget {
            function: target.function.clone(),
            binary: target.binary.clone(),
            source_dir: target.source_dir.clone(),
            command,
            artifact: target.artifact_reference(&settings.target),
        });
    }

    Ok(report)
}
