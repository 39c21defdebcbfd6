//! Default configuration values

/// Descriptor file looked up when `--file` is not given
pub const DESCRIPTOR_FILE: &str = "serverless.yml";

/// Function tag that marks a function as built by rustlift
pub const ELIGIBILITY_TAG: &str = "rust";

/// Key under `custom` in the descriptor holding rustlift settings
pub const CUSTOM_SECTION: &str = "rust";

/// Default target triple for compiled functions
pub const DEFAULT_TARGET: &str = "aarch64-unknown-linux-musl";

/// Runtime identifier set on functions that don't declare one
pub const DEFAULT_RUNTIME: &str = "provided.al2";

/// Entry name the custom runtime expects inside the archive
pub const ARCHIVE_ENTRY: &str = "bootstrap";

/// Suffix of the per-binary staging directory used while packaging
pub const STAGING_SUFFIX: &str = "-lambda";

/// Cargo profile directory the release build lands in
pub const RELEASE_PROFILE_DIR: &str = "release";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
