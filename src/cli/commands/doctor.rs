//! CLI command for `rustlift doctor`
//!
//! Checks system dependencies and reports issues with suggestions.

use std::path::Path;

use anyhow::Result;

use super::{resolve_settings, SettingsArgs};
use crate::cli::output::{is_json, is_quiet, print_detail, print_info, print_success, print_warning, status};
use crate::core::descriptor::Descriptor;
use crate::core::doctor::run_doctor;
use crate::core::settings::BuildSettings;

/// Execute the doctor command
///
/// The descriptor is optional here: without one, settings come from the
/// command line and global config only.
pub async fn execute(file: &Path, args: &SettingsArgs) -> Result<()> {
    let descriptor = if file.exists() {
        Descriptor::load(file)?
    } else {
        Descriptor::from_yaml("")?
    };
    let settings: BuildSettings = resolve_settings(&descriptor, args)?;

    let report = run_doctor(&settings);

    // JSON output mode
    if is_json() {
        let json_result = serde_json::json!({
            "status": if report.all_passed() { "success" } else if report.failed_required().is_empty() { "warning" } else { "error" },
            "toolchain": settings.toolchain,
            "target": settings.target,
            "checks": report.checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "passed": c.passed,
                "required": c.required,
                "version": c.version,
                "error": c.error,
                "suggestion": c.suggestion
            })).collect::<Vec<_>>(),
            "passed_count": report.passed_count(),
            "total_count": report.checks.len()
        });
        println!("{}", serde_json::to_string_pretty(&json_result).unwrap_or_default());

        if !report.failed_required().is_empty() {
            return Err(anyhow::anyhow!("Missing required dependencies"));
        }
        return Ok(());
    }

    // Quiet mode - only show errors
    if is_quiet() {
        let failed_required = report.failed_required();
        if !failed_required.is_empty() {
            for check in failed_required {
                eprintln!("{} Missing required: {}", status::ERROR, check.name);
            }
            return Err(anyhow::anyhow!("Missing required dependencies"));
        }
        return Ok(());
    }

    print_info(&format!(
        "Checking system dependencies for {} builds targeting {}...",
        settings.toolchain, settings.target
    ));
    eprintln!();

    for check in &report.checks {
        let version_str = check
            .version
            .as_ref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default();

        let required_str = if check.required { "" } else { " [optional]" };

        if check.passed {
            eprintln!("  {} {}{version_str}{required_str}", status::SUCCESS, check.name);
        } else {
            eprintln!("  {} {}{required_str}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    eprintln!();
    let passed = report.passed_count();
    let total = report.checks.len();
    let failed_required = report.failed_required();

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
    } else if failed_required.is_empty() {
        print_warning(&format!(
            "{passed}/{total} checks passed (optional dependencies missing)"
        ));
        print_detail("System is ready to build.");
    } else {
        eprintln!("{} {passed}/{total} checks passed", status::ERROR);
        print_detail("Please install missing required dependencies:");
        for check in &failed_required {
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("• {}: {suggestion}", check.name));
            }
        }
        return Err(anyhow::anyhow!("Missing required dependencies"));
    }

    Ok(())
}
