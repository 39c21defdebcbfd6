//! Build targets
//!
//! A build target is one eligible function resolved against the descriptor's
//! directory. Targets are created once per run and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::descriptor::FunctionSpec;
use crate::error::BuildError;
use crate::infra::toolchain::output_dir;

/// One function to compile and package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Position among the eligible functions, used for labelling only
    pub index: usize,
    /// Function key in the descriptor
    pub function: String,
    /// Binary (and archive) name
    pub binary: String,
    /// Source directory as written in the handler locator
    pub dir: PathBuf,
    /// Source directory resolved against the descriptor directory
    pub source_dir: PathBuf,
}

impl BuildTarget {
    /// Directory the compiled executable and the archive end up in
    pub fn output_dir(&self, target: &str) -> PathBuf {
        output_dir(&self.source_dir, target)
    }

    /// On-disk location of the finished archive
    pub fn archive_path(&self, target: &str) -> PathBuf {
        self.output_dir(target).join(self.archive_name())
    }

    /// Archive path as written into the descriptor, relative to the descriptor directory
    pub fn artifact_reference(&self, target: &str) -> String {
        output_dir(&self.dir, target)
            .join(self.archive_name())
            .to_string_lossy()
            .into_owned()
    }

    /// File name of the archive
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.binary)
    }

    /// Label used for this target's log lines
    pub fn label(&self) -> String {
        format!("[{}] {}", self.index + 1, self.function)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}.{})", self.function, self.dir.display(), self.binary)
    }
}

/// Split a `<dir>.<name>` handler locator
///
/// Splits at the last `.`, so directories may themselves contain dots
/// (`../shared.handler`).
pub fn parse_locator(function: &str, locator: &str) -> Result<(String, String), BuildError> {
    let invalid = |reason: &str| BuildError::InvalidLocator {
        function: function.to_string(),
        locator: locator.to_string(),
        reason: reason.to_string(),
    };

    let (dir, name) = locator
        .rsplit_once('.')
        .ok_or_else(|| invalid("expected <dir>.<name>, found no '.' separator"))?;

    if dir.is_empty() {
        return Err(invalid("directory part is empty"));
    }
    if name.is_empty() {
        return Err(invalid("binary name is empty"));
    }

    Ok((dir.to_string(), name.to_string()))
}

/// Build targets for every eligible function, in descriptor order
///
/// Fails on the first eligible function with a malformed or missing handler,
/// or whose handler repeats an earlier function's. Two such functions would
/// share one staging directory. An empty result is not an error here.
pub fn collect_targets(
    functions: &[FunctionSpec],
    base_dir: &Path,
) -> Result<Vec<BuildTarget>, BuildError> {
    let mut seen: HashMap<(PathBuf, String), &str> = HashMap::new();

    functions
        .iter()
        .filter(|f| f.eligible)
        .enumerate()
        .map(|(index, f)| -> Result<BuildTarget, BuildError> {
            let locator = f.handler.as_deref().ok_or_else(|| BuildError::InvalidLocator {
                function: f.name.clone(),
                locator: String::new(),
                reason: "handler is not set".to_string(),
            })?;
            let (dir, binary) = parse_locator(&f.name, locator)?;
            if let Some(first) = seen.insert((base_dir.join(&dir), binary.clone()), &f.name) {
                return Err(BuildError::InvalidLocator {
                    function: f.name.clone(),
                    locator: locator.to_string(),
                    reason: format!("function '{first}' already builds this binary"),
                });
            }
            Ok(BuildTarget {
                index,
                function: f.name.clone(),
                source_dir: base_dir.join(&dir),
                dir: PathBuf::from(dir),
                binary,
            })
        })
        .collect()
}
