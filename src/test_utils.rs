//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a directory component (lowercase alphanumeric with hyphens)
    pub fn dir_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}"
    }

    /// Generate a binary name (lowercase alphanumeric with underscores)
    pub fn binary_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,20}"
    }

    /// Generate a well-formed `<dir>.<name>` handler locator
    pub fn locator() -> impl Strategy<Value = (String, String, String)> {
        (dir_name(), binary_name())
            .prop_map(|(dir, name)| (format!("{dir}.{name}"), dir, name))
    }

    /// Generate a valid Rust target triple
    pub fn target_triple() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("aarch64-unknown-linux-musl".to_string()),
            Just("x86_64-unknown-linux-musl".to_string()),
            Just("aarch64-unknown-linux-gnu".to_string()),
            Just("armv7-unknown-linux-musleabihf".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_locator_generator((locator, dir, name) in locator()) {
            prop_assert!(!dir.is_empty());
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('.'));
            prop_assert_eq!(locator, format!("{dir}.{name}"));
        }

        #[test]
        fn test_target_triple_generator(target in target_triple()) {
            prop_assert!(target.split('-').count() >= 3);
        }
    }
}
