//! # doccheck-core
//!
//! Core framework for checking documentation against compliance rule sets.
//!
//! This crate provides the building blocks of a validation run:
//!
//! - [`declarative`] rule sets loaded from TOML into a validated [`declarative::model::RuleSet`]
//! - [`Document`] with a line table, heading index and code fence list
//! - [`evaluate_rule`] / [`evaluate_matcher`] for locating evidence spans
//! - [`Validator`] for evaluating a rule set into a [`Report`]
//! - [`source`] for loading documents with a timeout
//!
//! ## Example
//!
//! ```ignore
//! use doccheck_core::{declarative, DocumentManifest, Validator};
//!
//! let rules = declarative::load_rule_set_from_toml(&toml)?;
//! let report = Validator::builder()
//!     .rule_set(rules)
//!     .document("README", readme_text)
//!     .build()?
//!     .validate();
//!
//! println!("{}", report.summary());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod matcher;
mod report;
mod types;
mod validator;

/// Declarative rule sets: TOML DTOs, loader and domain model.
pub mod declarative;
/// Document sources and async loading.
pub mod source;
/// Text helpers shared by the matcher and the model.
pub mod utils;

pub use config::{Config, ConfigError, MatcherConfig, RuleConfig, ValidatorConfig};
pub use document::{CodeFence, Document, DocumentError, Heading, HeadingStyle, Line};
pub use matcher::{evaluate_matcher, evaluate_rule, MatchOptions};
pub use report::ReportBuilder;
pub use source::{DocumentManifest, SourceError};
pub use types::{MatchResult, Report, RuleOutcome, RuleStatus, Span, Summary, UnknownStatus};
pub use validator::{validate, ValidateError, Validator, ValidatorBuilder};
