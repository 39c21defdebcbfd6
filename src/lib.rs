//! Rustlift - Rust function packaging for serverless deployments
//!
//! Reads a serverless deployment descriptor, cross-compiles every function
//! tagged `rust`, packages each executable as a zip with a single `bootstrap`
//! entry, and rewrites the descriptor to deploy those archives.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (descriptor, settings, build orchestration)
//! - [`infra`] - Infrastructure layer (processes, toolchains, directories)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
