//! Declarative rule sets driven by TOML configuration.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! config_dto types        ← presets contribute DTOs too
//!   ↓ merge + validate + convert
//! RuleSet (pure domain model)
//!   ↓ Validator
//! Report
//! ```

pub mod config_dto;
pub mod loader;
pub mod model;

/// Errors from parsing TOML and loading a rule set.
#[derive(Debug, thiserror::Error)]
pub enum LoadRulesError {
    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    Load(#[from] loader::LoadError),
}

/// Parses the declarative sections of a TOML document.
///
/// # Errors
///
/// Returns an error if the TOML is invalid.
pub fn parse_dto(content: &str) -> Result<config_dto::RuleSetDto, toml::de::Error> {
    toml::from_str(content)
}

/// Parses TOML content and builds a validated rule set.
///
/// Returns an empty rule set if no declarative sections are present.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn load_rule_set_from_toml(content: &str) -> Result<model::RuleSet, LoadRulesError> {
    let dto = parse_dto(content)?;
    Ok(loader::load(dto)?)
}

/// Merges preset DTOs (in order) with the project's own DTO and validates
/// the result as one rule set.
///
/// # Errors
///
/// Returns an error if the merged rule set is invalid (e.g., a project
/// check reuses a preset id).
pub fn load_merged(
    presets: Vec<config_dto::RuleSetDto>,
    project: config_dto::RuleSetDto,
) -> Result<model::RuleSet, loader::LoadError> {
    let merged = presets
        .into_iter()
        .fold(config_dto::RuleSetDto::default(), config_dto::RuleSetDto::merge)
        .merge(project);
    loader::load(merged)
}
