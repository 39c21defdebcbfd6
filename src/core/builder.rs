//! Build orchestration logic
//!
//! [`Coordinator`] runs one compile-then-package pipeline per target. All
//! pipelines start together (or up to the job limit) and every one of them
//! runs to completion: a failing target never cancels its siblings. The run
//! succeeds only when every target produced an archive.

use std::fmt;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};

use crate::core::descriptor::Descriptor;
use crate::core::package::{self, PackagePlan, ZIP_PROGRAM};
use crate::core::settings::BuildSettings;
use crate::core::target::{collect_targets, BuildTarget};
use crate::error::{BuildError, RustliftError};
use crate::infra::process::{ProcessOutput, ProcessRunner};

/// Lines of stderr kept in compile error messages
const STDERR_TAIL: usize = 20;

/// Pipeline stage of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Toolchain invocation
    Compile,
    /// Archive creation
    Package,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compiling"),
            Self::Package => write!(f, "packaging"),
        }
    }
}

/// Archive produced for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    /// Function key in the descriptor
    pub function: String,
    /// Path written into the descriptor, relative to its directory
    pub reference: String,
    /// Archive location on disk
    pub path: PathBuf,
}

/// Receives progress of a build
///
/// Calls for different targets interleave in no particular order.
pub trait BuildObserver: Sync {
    /// A target entered a stage
    fn stage_started(&self, _target: &BuildTarget, _stage: Stage) {}

    /// A line of output from one of the target's processes
    fn output_line(&self, _target: &BuildTarget, _line: &str) {}

    /// A target's pipeline reached a terminal state
    fn target_finished(
        &self,
        _target: &BuildTarget,
        _outcome: Result<&ArtifactReference, &BuildError>,
    ) {
    }
}

/// Observer that only writes to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl BuildObserver for LogObserver {
    fn stage_started(&self, target: &BuildTarget, stage: Stage) {
        tracing::info!("{} {stage}", target.label());
    }

    fn output_line(&self, target: &BuildTarget, line: &str) {
        tracing::debug!("{} {line}", target.label());
    }

    fn target_finished(
        &self,
        target: &BuildTarget,
        outcome: Result<&ArtifactReference, &BuildError>,
    ) {
        match outcome {
            Ok(artifact) => tracing::info!("{} built {}", target.label(), artifact.path.display()),
            Err(e) => tracing::warn!("{} failed: {e}", target.label()),
        }
    }
}

/// Runs the per-target pipelines
pub struct Coordinator<'a, R> {
    settings: &'a BuildSettings,
    runner: &'a R,
    observer: &'a dyn BuildObserver,
}

impl<'a, R: ProcessRunner> Coordinator<'a, R> {
    /// Create a coordinator with its settings, process runner and observer
    pub fn new(
        settings: &'a BuildSettings,
        runner: &'a R,
        observer: &'a dyn BuildObserver,
    ) -> Self {
        Self {
            settings,
            runner,
            observer,
        }
    }

    /// Build every target and wait for all of them
    ///
    /// Artifacts are returned in target order. Any failed target fails the
    /// whole call with [`BuildError::TargetsFailed`].
    pub async fn build_all(
        &self,
        targets: &[BuildTarget],
    ) -> Result<Vec<ArtifactReference>, BuildError> {
        if targets.is_empty() {
            return Err(BuildError::NoEligibleTargets);
        }

        self.preflight()?;

        let limit = self.settings.jobs.unwrap_or(targets.len()).max(1);
        tracing::info!(
            "Building {} functions with {} for {} ({} at a time)",
            targets.len(),
            self.settings.toolchain,
            self.settings.target,
            limit.min(targets.len())
        );

        let results: Vec<Result<ArtifactReference, BuildError>> = stream::iter(targets)
            .map(|target| self.build_one(target))
            .buffered(limit)
            .collect()
            .await;

        let total = results.len();
        let mut artifacts = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => failures.push(e),
            }
        }

        if failures.is_empty() {
            Ok(artifacts)
        } else {
            Err(BuildError::TargetsFailed { total, failures })
        }
    }

    /// Compile and package one target
    pub async fn build_one(&self, target: &BuildTarget) -> Result<ArtifactReference, BuildError> {
        let outcome = self.run_pipeline(target).await;
        self.observer.target_finished(target, outcome.as_ref());
        outcome
    }

    async fn run_pipeline(&self, target: &BuildTarget) -> Result<ArtifactReference, BuildError> {
        let output_dir = self.compile(target).await?;

        self.observer.stage_started(target, Stage::Package);
        let plan = PackagePlan::new(&output_dir, &target.binary);
        let path = package::package(self.runner, &plan)
            .await
            .map_err(|e| BuildError::Package {
                target: target.function.clone(),
                cause: e.to_string(),
            })?;

        Ok(ArtifactReference {
            function: target.function.clone(),
            reference: target.artifact_reference(&self.settings.target),
            path,
        })
    }

    async fn compile(&self, target: &BuildTarget) -> Result<PathBuf, BuildError> {
        self.observer.stage_started(target, Stage::Compile);

        let invocation = self.settings.toolchain.compile_invocation(
            &target.source_dir,
            &self.settings.target,
            &target.binary,
            &self.settings.cargo_flags,
        );

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BuildError::Compile {
                target: target.function.clone(),
                cause: format!("failed to start `{}`: {e}", invocation.program),
            })?;
        self.forward_output(target, &output);

        if !output.success() {
            return Err(BuildError::Compile {
                target: target.function.clone(),
                cause: format!(
                    "`{}` failed with {}",
                    invocation.display(),
                    output.failure_summary(STDERR_TAIL)
                ),
            });
        }

        Ok(target.output_dir(&self.settings.target))
    }

    fn forward_output(&self, target: &BuildTarget, output: &ProcessOutput) {
        for line in output.stdout.lines().chain(output.stderr.lines()) {
            self.observer.output_line(target, line);
        }
    }

    fn preflight(&self) -> Result<(), BuildError> {
        let toolchain = self.settings.toolchain;
        if !self.runner.is_available(toolchain.program()) {
            return Err(BuildError::ToolchainNotFound {
                program: toolchain.program().to_string(),
                suggestion: toolchain.install_hint().to_string(),
            });
        }
        if !self.runner.is_available(ZIP_PROGRAM) {
            return Err(BuildError::ToolchainNotFound {
                program: ZIP_PROGRAM.to_string(),
                suggestion: "Install zip with your system package manager".to_string(),
            });
        }
        Ok(())
    }
}

/// Build every eligible function of `descriptor` and point each at its archive
///
/// `base_dir` is the directory handler locators are relative to. The
/// descriptor is only modified once every function has built.
pub async fn package_functions<R: ProcessRunner>(
    descriptor: &mut Descriptor,
    base_dir: &Path,
    settings: &BuildSettings,
    runner: &R,
    observer: &dyn BuildObserver,
) -> Result<Vec<ArtifactReference>, RustliftError> {
    let functions = descriptor.functions()?;
    let targets = collect_targets(&functions, base_dir)?;

    let artifacts = Coordinator::new(settings, runner, observer)
        .build_all(&targets)
        .await?;

    for artifact in &artifacts {
        descriptor.attach_artifact(&artifact.function, &artifact.reference, &settings.runtime)?;
    }

    Ok(artifacts)
}
