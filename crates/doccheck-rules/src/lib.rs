//! # doccheck-rules
//!
//! Built-in checklists and presets for doccheck.
//!
//! Checklists are plain declarative TOML, so they merge with a project's own
//! `[[documents]]` and `[[checks]]` exactly like user-written rule sets.
//!
//! ## Available Checklists
//!
//! | Name | Document | Checks |
//! |------|----------|--------|
//! | `readme` | `README.md` | README-001 .. README-005 |
//! | `deployment` | `docs/deployment.md` | DEPLOY-001 .. DEPLOY-005 |
//! | `architecture` | `docs/architecture.md` | ARCH-001 .. ARCH-004 |
//!
//! ## Usage
//!
//! ```ignore
//! use doccheck_core::declarative;
//! use doccheck_rules::Preset;
//!
//! let rules = declarative::load_merged(vec![Preset::Recommended.rule_set()?], project_dto)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod checklists;
mod presets;

pub use checklists::{all_checklists, checklist, Checklist, ARCHITECTURE, DEPLOYMENT, README};
pub use presets::{resolve_rule_set, Preset, PresetError};
