//! # doccheck
//!
//! Documentation compliance checker.
//!
//! This is the main facade crate that re-exports core functionality, the
//! `check!()` macro and the built-in checklists.
//!
//! ## Quick Start: `cargo test` Integration
//!
//! ```toml
//! [dev-dependencies]
//! doccheck = "0.1"
//! ```
//!
//! ```rust,ignore
//! // tests/docs.rs
//! doccheck::check!();
//! ```
//!
//! This runs doccheck as part of `cargo test`. Configure via `doccheck.toml`,
//! or pass arguments directly:
//!
//! ```rust,ignore
//! doccheck::check!(preset = "strict", fail_on = "partial");
//! ```
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use doccheck::{declarative, Validator};
//!
//! let rules = declarative::load_rule_set_from_toml(&toml)?;
//! let report = Validator::builder()
//!     .rule_set(rules)
//!     .document("README", readme)
//!     .build()?
//!     .validate();
//! ```

#![forbid(unsafe_code)]

// Re-export core types
pub use doccheck_core::*;

/// Built-in checklists and presets.
pub mod rules {
    pub use doccheck_rules::*;
}

mod runner;

#[doc(hidden)]
pub mod __internal {
    pub use crate::runner::{run_check, CheckArgs};
}

/// Generates a `#[test]` that checks the workspace's documentation.
///
/// Accepts optional `preset = "..."`, `config = "..."` (relative to the
/// workspace root) and `fail_on = "fail" | "partial"` arguments. The test
/// panics with a report of every outcome at or above the threshold.
#[macro_export]
macro_rules! check {
    ($($key:ident = $value:expr),* $(,)?) => {
        #[test]
        fn doccheck() {
            $crate::__internal::run_check(
                $crate::__internal::CheckArgs::default()
                    $(.set(stringify!($key), $value))*
            );
        }
    };
}
