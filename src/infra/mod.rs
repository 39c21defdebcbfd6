//! Infrastructure layer
//!
//! Handles I/O that leaves the process: spawning programs and locating
//! platform directories.

pub mod dirs;
pub mod process;
pub mod toolchain;
