//! Check command implementation
//!
//! Implements `rustlift check` to validate the descriptor without building.

use std::path::Path;

use anyhow::{bail, Result};

use super::{load_workspace, SettingsArgs};
use crate::cli::output::{is_json, is_quiet, print_detail, print_info, print_success, print_warning, status};
use crate::core::check;
use crate::infra::process::is_on_path;

/// Execute the check command
pub async fn execute(file: &Path, args: &SettingsArgs) -> Result<()> {
    let workspace = load_workspace(file, args)?;
    let settings = &workspace.settings;

    let report = check::check(
        &workspace.descriptor,
        &workspace.base_dir,
        settings,
        is_on_path,
    )?;

    if is_json() {
        let json = serde_json::json!({
            "status": if report.is_ready() { "success" } else { "error" },
            "settings": settings,
            "targets": report.targets,
            "skipped": report.skipped,
            "missing_programs": report.missing_programs,
            "warnings": report.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
    } else if !is_quiet() {
        print_info(&format!(
            "Checking {} with {} for {}",
            file.display(),
            settings.toolchain,
            settings.target
        ));
        eprintln!();

        eprintln!("Functions that would be built:");
        for target in &report.targets {
            eprintln!("  • {} ({})", target.function, target.binary);
            print_detail(&format!("  command:  {}", target.command));
            print_detail(&format!("  artifact: {}", target.artifact));
        }
        if !report.skipped.is_empty() {
            eprintln!("\nSkipped (no `rust` tag): {}", report.skipped.join(", "));
        }

        if !report.warnings.is_empty() {
            eprintln!();
            for warning in &report.warnings {
                print_warning(warning);
            }
        }
        eprintln!();
    }

    if !report.missing_programs.is_empty() {
        for program in &report.missing_programs {
            if !is_json() {
                eprintln!("{} '{program}' not found in PATH", status::ERROR);
            }
        }
        bail!("Check failed - install the missing programs or run 'rustlift doctor'");
    }

    print_success(&format!("Check passed - ready to build {} functions", report.targets.len()));
    Ok(())
}
