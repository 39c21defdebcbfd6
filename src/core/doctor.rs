//! Doctor command logic
//!
//! Checks that the programs a build needs are installed and reports issues
//! with suggestions.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::settings::BuildSettings;
use crate::infra::toolchain::{ContainerRuntime, Toolchain};

/// Result of a single dependency check
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Check if all required checks passed
    pub fn all_required_passed(&self) -> bool {
        self.checks
            .iter()
            .filter(|c| c.required)
            .all(|c| c.passed)
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Run `<command> --version` and extract the version, `None` if it can't run
pub fn check_command_available(command: &str) -> Option<String> {
    std::process::Command::new(command)
        .arg("--version")
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = format!("{stdout}{stderr}");
                extract_version(&combined).or_else(|| Some("unknown".to_string()))
            } else {
                None
            }
        })
}

fn version_regex() -> &'static Regex {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    VERSION.get_or_init(|| {
        Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").expect("Invalid version pattern")
    })
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    version_regex()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check cargo availability
pub fn check_cargo(required: bool) -> CheckResult {
    match check_command_available("cargo") {
        Some(version) => CheckResult::pass("cargo", Some(version), required),
        None => CheckResult::fail(
            "cargo",
            "cargo not found in PATH",
            Some(Toolchain::Cargo.install_hint()),
            required,
        ),
    }
}

/// Check cross availability
pub fn check_cross(required: bool) -> CheckResult {
    match check_command_available("cross") {
        Some(version) => CheckResult::pass("cross", Some(version), required),
        None => CheckResult::fail(
            "cross",
            "cross not found in PATH",
            Some(Toolchain::Cross.install_hint()),
            required,
        ),
    }
}

/// Check Docker/Podman availability, which `cross` runs builds in
pub fn check_container_runtime(required: bool) -> CheckResult {
    if let Some(runtime) = ContainerRuntime::detect() {
        if let Some(version) = check_command_available(runtime.command()) {
            let name = format!("Container runtime ({})", runtime.command());
            return CheckResult::pass(&name, Some(version), required);
        }
    }
    CheckResult::fail(
        "Container runtime",
        "Neither Docker nor Podman is usable",
        Some("Install Docker or Podman; cross runs every build in a container"),
        required,
    )
}

/// Check zip availability
pub fn check_zip() -> CheckResult {
    // zip prints its version banner with -v, not --version
    let found = std::process::Command::new("zip")
        .arg("-v")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| extract_version(&String::from_utf8_lossy(&o.stdout)));

    match found {
        Some(version) => CheckResult::pass("zip", version, true),
        None => CheckResult::fail(
            "zip",
            "zip not found in PATH",
            Some("Install zip with your system package manager"),
            true,
        ),
    }
}

/// Check that rustup has the target's standard library installed
pub fn check_rustup_target(target: &str, required: bool) -> CheckResult {
    let name = format!("rustup target {target}");
    let installed = std::process::Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .any(|line| line.trim() == target)
        });

    match installed {
        Some(true) => CheckResult::pass(&name, None, required),
        Some(false) => CheckResult::fail(
            &name,
            "target is not installed",
            Some(format!("Run `rustup target add {target}`").as_str()),
            required,
        ),
        None => CheckResult::fail(
            &name,
            "rustup not found in PATH",
            Some("Install Rust from https://rustup.rs/"),
            required,
        ),
    }
}

/// Run all doctor checks for the given settings
///
/// Which checks are required depends on the selected toolchain.
pub fn run_doctor(settings: &BuildSettings) -> DoctorReport {
    let sandboxed = settings.toolchain.is_sandboxed();
    let mut report = DoctorReport::new();

    report.add_check(check_cargo(true));
    report.add_check(check_cross(sandboxed));
    report.add_check(check_container_runtime(sandboxed));
    report.add_check(check_zip());
    report.add_check(check_rustup_target(&settings.target, !sandboxed));

    report
}
