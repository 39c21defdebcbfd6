//! Output formatting and progress indicators
//!
//! Human-readable messages and spinners go to stderr so stdout stays free for
//! the rewritten descriptor and JSON documents.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::core::builder::{ArtifactReference, BuildObserver, Stage};
use crate::core::target::BuildTarget;
use crate::error::BuildError;

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

/// Global output flags taken from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress everything but errors
    pub quiet: bool,
    /// Emit machine-readable JSON on stdout
    pub json: bool,
    /// Number of `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Make this configuration visible to every output helper
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
        VERBOSITY.store(self.verbose, Ordering::Relaxed);
    }
}

/// Whether JSON output was requested
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Whether quiet mode is active
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether at least one `-v` was given
pub fn is_verbose() -> bool {
    VERBOSITY.load(Ordering::Relaxed) > 0
}

fn human_output() -> bool {
    !is_quiet() && !is_json()
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Print a success line
pub fn print_success(message: &str) {
    if human_output() {
        eprintln!("{} {message}", status::SUCCESS);
    }
}

/// Print an informational line
pub fn print_info(message: &str) {
    if human_output() {
        eprintln!("{} {message}", status::INFO);
    }
}

/// Print a warning line, shown even in quiet mode
pub fn print_warning(message: &str) {
    if !is_json() {
        eprintln!("{} {message}", status::WARNING);
    }
}

/// Print an indented detail line
pub fn print_detail(message: &str) {
    if human_output() {
        eprintln!("  {message}");
    }
}

/// Print an error and its causes
///
/// In JSON mode the error is written to stdout as `{"status":"error",...}`.
pub fn display_error(error: &anyhow::Error) {
    let headline = error.to_string();
    // Domain errors embed their source in their own message
    let causes: Vec<String> = error
        .chain()
        .skip(1)
        .map(ToString::to_string)
        .filter(|cause| !headline.contains(cause.as_str()))
        .collect();

    if is_json() {
        let json = serde_json::json!({
            "status": "error",
            "error": headline,
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return;
    }

    eprintln!("{} Error: {headline}", status::ERROR);
    for cause in causes {
        for line in cause.lines() {
            eprintln!("  {line}");
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Observer drawing one spinner per function
///
/// Spinners are hidden in quiet and JSON modes. With `-v`, the output of
/// child processes is printed above the spinners, labelled by function.
pub struct ProgressObserver {
    multi: MultiProgress,
    bars: Mutex<HashMap<usize, ProgressBar>>,
    echo_output: bool,
}

impl ProgressObserver {
    /// Create an observer honouring the global output flags
    pub fn new() -> Self {
        let multi = if human_output() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            echo_output: human_output() && is_verbose(),
        }
    }

    fn bar(&self, target: &BuildTarget) -> ProgressBar {
        let mut bars = self
            .bars
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        bars.entry(target.index)
            .or_insert_with(|| {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(spinner_style());
                pb.set_prefix(target.label());
                pb.enable_steady_tick(Duration::from_millis(80));
                pb
            })
            .clone()
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildObserver for ProgressObserver {
    fn stage_started(&self, target: &BuildTarget, stage: Stage) {
        tracing::info!("{} {stage}", target.label());
        self.bar(target).set_message(format!("{stage} {}", target.binary));
    }

    fn output_line(&self, target: &BuildTarget, line: &str) {
        tracing::debug!("{} {line}", target.label());
        if self.echo_output {
            // Printed through the MultiProgress so spinners are not torn
            self.multi
                .println(format!("{} {line}", target.label()))
                .ok();
        }
    }

    fn target_finished(
        &self,
        target: &BuildTarget,
        outcome: Result<&ArtifactReference, &BuildError>,
    ) {
        let bar = self.bar(target);
        match outcome {
            Ok(artifact) => {
                tracing::info!("{} built {}", target.label(), artifact.path.display());
                bar.finish_with_message(format!("{} {}", status::SUCCESS, artifact.reference));
            }
            Err(e) => {
                tracing::warn!("{} failed: {e}", target.label());
                let headline = e.to_string().lines().next().unwrap_or_default().to_string();
                bar.finish_with_message(format!("{} {headline}", status::ERROR));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_config_new() {
        let config = OutputConfig::new(true, false, 2);
        assert!(config.quiet);
        assert!(!config.json);
        assert_eq!(config.verbose, 2);
    }

    fn hidden_observer(echo_output: bool) -> ProgressObserver {
        ProgressObserver {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            bars: Mutex::new(HashMap::new()),
            echo_output,
        }
    }

    fn target() -> BuildTarget {
        BuildTarget {
            index: 0,
            function: "create".to_string(),
            binary: "handler_a".to_string(),
            dir: "svc-a".into(),
            source_dir: "/project/svc-a".into(),
        }
    }

    #[test]
    fn test_echoed_output_on_hidden_terminal_is_dropped() {
        let observer = hidden_observer(true);
        let target = target();

        observer.stage_started(&target, Stage::Compile);
        observer.output_line(&target, "   Compiling handler_a v0.1.0");
        observer.target_finished(
            &target,
            Err(&BuildError::Compile {
                target: "create".to_string(),
                cause: "exit code 101".to_string(),
            }),
        );

        let bars = observer.bars.lock().unwrap();
        assert_eq!(bars.len(), 1);
        assert!(bars[&0].is_finished());
    }

    #[test]
    fn test_status_prefixes_are_distinct() {
        let prefixes = [status::SUCCESS, status::ERROR, status::WARNING, status::INFO];
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
