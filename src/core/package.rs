//! Package stage
//!
//! Turns a compiled executable into a single-entry zip archive. Inside the
//! toolchain's output directory:
//!
//! 1. remove the archive and staging directory left by a previous run
//! 2. create a fresh staging directory `<binary>-lambda/`
//! 3. copy the executable into it as `bootstrap`
//! 4. run `zip -q <binary>.zip bootstrap` in the staging directory
//! 5. move the archive up to the output directory
//!
//! Steps run strictly in order and the first failure ends the stage.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::config::defaults::{ARCHIVE_ENTRY, STAGING_SUFFIX};
use crate::infra::process::{Invocation, ProcessRunner};

/// Program used to build archives
pub const ZIP_PROGRAM: &str = "zip";

/// Lines of stderr kept in error messages
const STDERR_TAIL: usize = 10;

/// Package stage errors
#[derive(Error, Debug)]
pub enum PackageStepError {
    /// Stale file or directory could not be removed
    #[error("failed to remove stale '{path}': {error}")]
    Cleanup { path: PathBuf, error: String },

    /// Staging directory could not be created
    #[error("failed to create staging directory '{path}': {error}")]
    Staging { path: PathBuf, error: String },

    /// Executable could not be copied into the staging directory
    #[error("failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// `zip` could not be started
    #[error("failed to start `{command}`: {error}")]
    ZipSpawn { command: String, error: String },

    /// `zip` exited unsuccessfully
    #[error("`{command}` failed with {summary}")]
    Zip { command: String, summary: String },

    /// Archive could not be moved to the output directory
    #[error("failed to move '{from}' to '{to}': {error}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// File layout of one package stage run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePlan {
    /// Toolchain output directory
    pub output_dir: PathBuf,
    /// Compiled executable
    pub executable: PathBuf,
    /// Fresh directory holding only the renamed executable
    pub staging_dir: PathBuf,
    /// Archive file name
    pub archive_name: String,
    /// Final archive location
    pub archive: PathBuf,
}

impl PackagePlan {
    /// Lay out the stage for `binary` inside `output_dir`
    pub fn new(output_dir: &Path, binary: &str) -> Self {
        let archive_name = format!("{binary}.zip");
        Self {
            output_dir: output_dir.to_path_buf(),
            executable: output_dir.join(binary),
            staging_dir: output_dir.join(format!("{binary}{STAGING_SUFFIX}")),
            archive: output_dir.join(&archive_name),
            archive_name,
        }
    }

    /// Invocation that zips the staged entry
    pub fn zip_invocation(&self) -> Invocation {
        Invocation::new(ZIP_PROGRAM, &self.staging_dir).args([
            "-q",
            self.archive_name.as_str(),
            ARCHIVE_ENTRY,
        ])
    }
}

/// Run the package stage, returning the archive path
pub async fn package<R: ProcessRunner>(
    runner: &R,
    plan: &PackagePlan,
) -> Result<PathBuf, PackageStepError> {
    remove_stale(&plan.archive).await?;
    remove_stale(&plan.staging_dir).await?;

    fs::create_dir_all(&plan.staging_dir)
        .await
        .map_err(|e| PackageStepError::Staging {
            path: plan.staging_dir.clone(),
            error: e.to_string(),
        })?;

    let entry = plan.staging_dir.join(ARCHIVE_ENTRY);
    fs::copy(&plan.executable, &entry)
        .await
        .map_err(|e| PackageStepError::Copy {
            from: plan.executable.clone(),
            to: entry.clone(),
            error: e.to_string(),
        })?;

    let zip = plan.zip_invocation();
    let output = runner
        .run(&zip)
        .await
        .map_err(|e| PackageStepError::ZipSpawn {
            command: zip.display(),
            error: e.to_string(),
        })?;
    if !output.success() {
        return Err(PackageStepError::Zip {
            command: zip.display(),
            summary: output.failure_summary(STDERR_TAIL),
        });
    }

    let staged_archive = plan.staging_dir.join(&plan.archive_name);
    fs::rename(&staged_archive, &plan.archive)
        .await
        .map_err(|e| PackageStepError::Move {
            from: staged_archive.clone(),
            to: plan.archive.clone(),
            error: e.to_string(),
        })?;

    Ok(plan.archive.clone())
}

/// Remove a file or directory; a path that does not exist counts as removed
async fn remove_stale(path: &Path) -> Result<(), PackageStepError> {
    let result = match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PackageStepError::Cleanup {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::process::ProcessOutput;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fakes `zip` by copying the entry to the archive name
    #[derive(Default)]
    struct FakeZip {
        calls: Mutex<Vec<Invocation>>,
        exit_code: Option<i32>,
    }

    impl ProcessRunner for FakeZip {
        async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            let code = self.exit_code.unwrap_or(0);
            if code == 0 {
                let archive = invocation.cwd.join(&invocation.args[1]);
                let entry = invocation.cwd.join(&invocation.args[2]);
                std::fs::copy(entry, archive)?;
            }
            Ok(ProcessOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: if code == 0 { String::new() } else { "zip error: Nothing to do!".to_string() },
            })
        }
    }

    fn output_dir_with_binary(binary: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("target/aarch64-unknown-linux-musl/release");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join(binary), b"\x7fELF fake").unwrap();
        (temp, out)
    }

    #[test]
    fn test_plan_layout() {
        let plan = PackagePlan::new(Path::new("/out"), "handler");
        assert_eq!(plan.executable, PathBuf::from("/out/handler"));
        assert_eq!(plan.staging_dir, PathBuf::from("/out/handler-lambda"));
        assert_eq!(plan.archive, PathBuf::from("/out/handler.zip"));

        let zip = plan.zip_invocation();
        assert_eq!(zip.program, "zip");
        assert_eq!(zip.cwd, PathBuf::from("/out/handler-lambda"));
        assert_eq!(zip.display(), "zip -q handler.zip bootstrap");
    }

    #[tokio::test]
    async fn test_package_produces_archive_with_bootstrap_entry() {
        let (_temp, out) = output_dir_with_binary("handler");
        let plan = PackagePlan::new(&out, "handler");
        let runner = FakeZip::default();

        let archive = package(&runner, &plan).await.unwrap();

        assert_eq!(archive, out.join("handler.zip"));
        assert!(archive.is_file());
        assert!(plan.staging_dir.join("bootstrap").is_file());
        assert!(!plan.staging_dir.join("handler.zip").exists());
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_package_is_idempotent() {
        let (_temp, out) = output_dir_with_binary("handler");
        let plan = PackagePlan::new(&out, "handler");
        let runner = FakeZip::default();

        package(&runner, &plan).await.unwrap();
        // Leftovers from an interrupted run
        std::fs::write(plan.staging_dir.join("junk"), b"x").unwrap();

        let archive = package(&runner, &plan).await.unwrap();
        assert!(archive.is_file());
        assert!(!plan.staging_dir.join("junk").exists());
    }

    #[tokio::test]
    async fn test_package_missing_executable_fails_before_zip() {
        let temp = TempDir::new().unwrap();
        let plan = PackagePlan::new(temp.path(), "absent");
        let runner = FakeZip::default();

        let err = package(&runner, &plan).await.unwrap_err();

        assert!(matches!(err, PackageStepError::Copy { .. }));
        assert!(runner.calls.lock().unwrap().is_empty());
        assert!(!plan.archive.exists());
    }

    #[tokio::test]
    async fn test_package_zip_failure() {
        let (_temp, out) = output_dir_with_binary("handler");
        let plan = PackagePlan::new(&out, "handler");
        let runner = FakeZip {
            exit_code: Some(12),
            ..Default::default()
        };

        let err = package(&runner, &plan).await.unwrap_err();

        match err {
            PackageStepError::Zip { command, summary } => {
                assert_eq!(command, "zip -q handler.zip bootstrap");
                assert!(summary.contains("exit code 12"));
                assert!(summary.contains("Nothing to do"));
            }
            other => panic!("expected Zip error, got {other:?}"),
        }
        assert!(!plan.archive.exists());
    }

    #[tokio::test]
    async fn test_remove_stale_missing_path_is_ok() {
        let temp = TempDir::new().unwrap();
        remove_stale(&temp.path().join("nothing-here")).await.unwrap();
    }
}
