//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a temporary
//! project directory and fake `cargo`/`cross`/`zip` programs that stand in for
//! the real toolchain on PATH.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Directory, inside the project, holding the fake programs
const FAKE_BIN: &str = ".fake-bin";

/// File the fake programs append their command lines to
const FAKE_LOG: &str = ".fake-calls.log";

/// Fake `cargo`/`cross`: writes `target/<triple>/release/<bin>` in the
/// working directory, or fails when a `FAIL_BUILD` file is present there
const FAKE_CARGO: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "$(basename "$0") 1.83.0"
  exit 0
fi
echo "$(basename "$0") $*" >> "$FAKE_TOOL_LOG"
target=""
bin=""
while [ $# -gt 0 ]; do
  case "$1" in
    --target) target="$2"; shift ;;
    --bin) bin="$2"; shift ;;
  esac
  shift
done
if [ -f FAIL_BUILD ]; then
  echo "error[E0308]: mismatched types" >&2
  exit 101
fi
echo "   Compiling $bin"
mkdir -p "target/$target/release"
printf 'fake executable %s\n' "$bin" > "target/$target/release/$bin"
"#;

/// Fake `zip -q <archive> <entry>`: copies the entry to the archive name
const FAKE_ZIP: &str = r#"#!/bin/sh
if [ "$1" = "-v" ]; then
  echo "This is Zip 3.0 (July 5th 2008), by Info-ZIP."
  exit 0
fi
echo "zip $*" >> "$FAKE_TOOL_LOG"
[ "$1" = "-q" ] && shift
cp "$2" "$1"
"#;

/// Fake container runtime, only answers `--version`
const FAKE_DOCKER: &str = r#"#!/bin/sh
echo "Docker version 27.3.1, build ce12230"
"#;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a project with the fake toolchain installed
    pub fn with_fake_toolchain() -> Self {
        let project = Self::new();
        project.install_fake("cargo", FAKE_CARGO);
        project.install_fake("cross", FAKE_CARGO);
        project.install_fake("zip", FAKE_ZIP);
        project.install_fake("docker", FAKE_DOCKER);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Create a minimal crate for a handler directory
    pub fn create_crate(&self, dir: &str) {
        self.create_file(
            &format!("{dir}/Cargo.toml"),
            &format!("[package]\nname = \"{dir}\"\nversion = \"0.1.0\"\n"),
        );
    }

    /// Make the fake compiler fail in `dir`
    pub fn fail_build_in(&self, dir: &str) {
        self.create_file(&format!("{dir}/FAIL_BUILD"), "");
    }

    /// Remove one fake program
    pub fn uninstall_fake(&self, program: &str) {
        std::fs::remove_file(self.dir.path().join(FAKE_BIN).join(program))
            .expect("Failed to remove fake program");
    }

    /// Command lines the fake programs were called with
    pub fn fake_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join(FAKE_LOG))
            .map(|log| log.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Run rustlift in the project directory with the fake toolchain first on PATH
    pub fn rustlift(&self, args: &[&str]) -> Output {
        let bin = self.dir.path().join(FAKE_BIN);
        Command::new(env!("CARGO_BIN_EXE_rustlift"))
            .current_dir(self.path())
            .args(args)
            .env("PATH", format!("{}:/usr/bin:/bin", bin.display()))
            .env("FAKE_TOOL_LOG", self.dir.path().join(FAKE_LOG))
            .env("RUSTLIFT_CONFIG_DIR", self.dir.path().join(".config"))
            .env_remove("RUSTLIFT_FILE")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute rustlift")
    }

    fn install_fake(&self, program: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join(FAKE_BIN).join(program);
        self.create_file(&format!("{FAKE_BIN}/{program}"), script);
        let mut perms = std::fs::metadata(&path)
            .expect("Failed to stat fake program")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("Failed to make fake program executable");
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor with two Rust functions and one Node function
pub const SAMPLE_DESCRIPTOR: &str = r#"service: shop
provider:
  name: aws
  region: eu-west-1
functions:
  create:
    handler: svc-a.handler_a
    memorySize: 256
    tags:
      rust: true
  list:
    handler: svc-b.handler_b
    tags:
      rust: true
      team: catalog
  node:
    handler: index.handler
    runtime: nodejs18.x
"#;

/// Project with [`SAMPLE_DESCRIPTOR`], both crates and the fake toolchain
pub fn sample_project() -> TestProject {
    let project = TestProject::with_fake_toolchain();
    project.create_file("serverless.yml", SAMPLE_DESCRIPTOR);
    project.create_crate("svc-a");
    project.create_crate("svc-b");
    project
}

/// Function entry of a rendered descriptor
pub fn function<'a>(doc: &'a serde_yaml::Value, name: &str) -> &'a serde_yaml::Value {
    &doc["functions"][name]
}
