//! Build command implementation
//!
//! Implements `rustlift build`: compiles and packages every rust-tagged
//! function, then emits the descriptor with each function pointed at its
//! archive.

use std::path::Path;

use anyhow::{bail, Context, Result};

use super::{load_workspace, Destination, SettingsArgs};
use crate::cli::output::{is_json, print_detail, print_success, ProgressObserver};
use crate::core::builder::package_functions;
use crate::infra::process::TokioRunner;

/// Execute the build command
pub async fn execute(file: &Path, args: &SettingsArgs, destination: Destination) -> Result<()> {
    if is_json() && destination == Destination::Stdout {
        bail!("--json prints a summary on stdout; pass --output <FILE> or --in-place for the descriptor");
    }

    let mut workspace = load_workspace(file, args)?;
    let settings = &workspace.settings;

    let observer = ProgressObserver::new();
    let artifacts = package_functions(
        &mut workspace.descriptor,
        &workspace.base_dir,
        settings,
        &TokioRunner,
        &observer,
    )
    .await?;

    match &destination {
        Destination::Stdout => {
            let yaml = workspace
                .descriptor
                .to_yaml()
                .context("Failed to render descriptor")?;
            print!("{yaml}");
        }
        Destination::File(path) => {
            workspace
                .descriptor
                .save(path)
                .with_context(|| format!("Failed to write descriptor to '{}'", path.display()))?;
        }
    }

    if is_json() {
        let descriptor_path = match &destination {
            Destination::File(path) => path.display().to_string(),
            Destination::Stdout => String::new(),
        };
        let json = serde_json::json!({
            "status": "success",
            "toolchain": settings.toolchain,
            "target": settings.target,
            "runtime": settings.runtime,
            "descriptor": descriptor_path,
            "functions": artifacts.iter().map(|a| serde_json::json!({
                "function": a.function,
                "artifact": a.reference,
                "path": a.path.display().to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return Ok(());
    }

    print_success(&format!(
        "Built {} function{} for {}",
        artifacts.len(),
        if artifacts.len() == 1 { "" } else { "s" },
        settings.target
    ));
    for artifact in &artifacts {
        print_detail(&format!("{}: {}", artifact.function, artifact.reference));
    }
    if let Destination::File(path) = &destination {
        print_detail(&format!("Descriptor written to {}", path.display()));
    }

    Ok(())
}
