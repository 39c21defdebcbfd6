//! External process execution
//!
//! Every external program rustlift starts goes through [`ProcessRunner`], as a
//! structured argument vector (never a shell string). The production runner
//! uses `tokio::process`; tests substitute their own runner.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<OsString>,
    /// Working directory
    pub cwd: PathBuf,
}

impl Invocation {
    /// Create an invocation of `program` in `cwd`
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render the command line for logs and error messages
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Build from a finished `std::process::Output`
    pub fn from_output(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code: status.code(),
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Describe a failed run: exit status plus the last lines of stderr
    pub fn failure_summary(&self, tail: usize) -> String {
        let status = match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let lines: Vec<&str> = self
            .stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return status;
        }
        let start = lines.len().saturating_sub(tail);
        format!("{status}\n{}", lines[start..].join("\n"))
    }
}

/// Executes external programs and waits for them to exit
///
/// `Err` means the process could not be started at all; a non-zero exit is
/// reported through [`ProcessOutput::code`].
pub trait ProcessRunner: Sync {
    /// Run the invocation to completion
    fn run(&self, invocation: &Invocation) -> impl Future<Output = io::Result<ProcessOutput>> + Send;

    /// Whether `program` can be found before anything is started
    fn is_available(&self, _program: &str) -> bool {
        true
    }
}

/// Runner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl ProcessRunner for TokioRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        tracing::debug!("Running `{}` in {}", invocation.display(), invocation.cwd.display());

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(ProcessOutput::from_output(
            output.status,
            &output.stdout,
            &output.stderr,
        ))
    }

    fn is_available(&self, program: &str) -> bool {
        is_on_path(program)
    }
}

/// Check whether `program` resolves on PATH
pub fn is_on_path(program: &str) -> bool {
    which::which(program).is_ok()
}
