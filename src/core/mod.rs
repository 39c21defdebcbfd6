//! Core business logic module
//!
//! Process execution and toolchain details live in [`crate::infra`]; this
//! module decides what to build and in which order.
//!
//! # Submodules
//!
//! - [`descriptor`] - Deployment descriptor (serverless.yml) reading and rewriting
//! - [`settings`] - Build settings layering and validation
//! - [`global_config`] - Global configuration management
//! - [`target`] - Handler locators and build targets
//! - [`package`] - Archive creation for one compiled executable
//! - [`builder`] - Build orchestration logic
//! - [`check`] - Build planning without side effects
//! - [`doctor`] - System dependency checks

pub mod builder;
pub mod check;
pub mod descriptor;
pub mod doctor;
pub mod global_config;
pub mod package;
pub mod settings;
pub mod target;
