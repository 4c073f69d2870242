//! Check command implementation.

use anyhow::{Context, Result};
use doccheck_core::declarative::{self, model::RuleSet};
use doccheck_core::source::load_manifest_blocking;
use doccheck_core::{Config, RuleStatus, ValidateError, Validator};
use doccheck_rules::{resolve_rule_set, PresetError};
use std::path::Path;
use std::process::ExitCode;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Exit status when an outcome reaches the failure threshold.
pub const EXIT_THRESHOLD: u8 = 1;

/// Exit status when the run cannot be set up.
pub const EXIT_SETUP: u8 = 2;

/// Why a check run could not produce a report.
#[derive(Debug)]
pub enum SetupError {
    /// Rule set or document failure, rendered through miette.
    Validate(ValidateError),
    /// Config, preset or output failure.
    Other(anyhow::Error),
}

impl From<ValidateError> for SetupError {
    fn from(error: ValidateError) -> Self {
        Self::Validate(error)
    }
}

impl From<anyhow::Error> for SetupError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error)
    }
}

/// Runs the check command and maps the result to a process exit status.
pub fn run(
    path: &Path,
    format: OutputFormat,
    rules_filter: Option<String>,
    fail_on: Option<String>,
    source: &ConfigSource,
) -> ExitCode {
    let result = execute(path, format, rules_filter, fail_on, source);
    let status = exit_status(&result);
    match result {
        Err(SetupError::Validate(e)) => eprintln!("{:?}", miette::Report::new(e)),
        Err(SetupError::Other(e)) => eprintln!("Error: {e:?}"),
        Ok(_) => {}
    }
    ExitCode::from(status)
}

/// `0` for a clean run, [`EXIT_THRESHOLD`] on a breach, [`EXIT_SETUP`] on
/// any setup failure.
fn exit_status(result: &Result<bool, SetupError>) -> u8 {
    match result {
        Ok(false) => 0,
        Ok(true) => EXIT_THRESHOLD,
        Err(_) => EXIT_SETUP,
    }
}

/// Validates and prints the report. Returns whether the threshold was reached.
fn execute(
    path: &Path,
    format: OutputFormat,
    rules_filter: Option<String>,
    fail_on: Option<String>,
    source: &ConfigSource,
) -> Result<bool, SetupError> {
    if source.is_global() {
        if let Some(p) = source.path() {
            tracing::info!("Using global config: {}", p.display());
        }
    }

    let content = source.read().with_context(|| match source.path() {
        Some(p) => format!("Failed to read config: {}", p.display()),
        None => "Failed to read config".to_string(),
    })?;
    let config = if content.trim().is_empty() {
        Config::default()
    } else {
        Config::parse(&content).context("Failed to parse config")?
    };
    let threshold = resolve_fail_on(fail_on.as_deref(), &config)?;
    let project = declarative::parse_dto(&content).context("Failed to parse checks")?;

    let rule_set = match resolve_rule_set(config.preset.as_deref(), project) {
        Ok(set) => set,
        Err(PresetError::Load(e)) => return Err(ValidateError::from(e).into()),
        Err(other) => return Err(anyhow::Error::from(other).into()),
    };
    let rule_set = match rules_filter {
        Some(filter) => filter_rules(rule_set, &filter),
        None => rule_set,
    };

    let base_dir = source.base_dir(path);
    tracing::info!(
        "Checking {} with {} rule(s)",
        base_dir.display(),
        rule_set.rules().len()
    );

    let manifest = load_manifest_blocking(
        rule_set.referenced_documents(),
        &base_dir,
        config.validator.load_timeout(),
    )
    .map_err(ValidateError::from)?;

    let report = Validator::builder()
        .rule_set(rule_set)
        .manifest(manifest)
        .config(config)
        .build()?
        .validate();
    super::output::print(&report, format)?;

    Ok(report.has_outcomes_at(threshold))
}

/// `--fail-on` wins over the config's `fail_on`.
fn resolve_fail_on(flag: Option<&str>, config: &Config) -> Result<RuleStatus> {
    match flag {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid --fail-on value `{value}`")),
        None => Ok(config.fail_on_status()?),
    }
}

fn filter_rules(rule_set: RuleSet, filter: &str) -> RuleSet {
    let ids: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for id in &ids {
        if rule_set.rule(id).is_none() {
            tracing::warn!("Unknown rule: {}", id);
        }
    }

    rule_set.retain(|r| ids.contains(&r.id().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_on_flag_overrides_config() {
        let config = Config::parse("fail_on = \"fail\"").unwrap();
        assert_eq!(
            resolve_fail_on(Some("partial"), &config).unwrap(),
            RuleStatus::Partial
        );
        assert_eq!(resolve_fail_on(None, &config).unwrap(), RuleStatus::Fail);
        assert!(resolve_fail_on(Some("critical"), &config).is_err());
    }

    #[test]
    fn filter_keeps_listed_rules_in_order() {
        let set = resolve_rule_set(Some("recommended"), Default::default()).unwrap();
        let filtered = filter_rules(set, "DEPLOY-003, README-002,NOPE-1");
        let ids: Vec<&str> = filtered.rules().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["README-002", "DEPLOY-003"]);
    }

    fn run_in(dir: &Path, config: &str) -> Result<bool, SetupError> {
        let path = dir.join("doccheck.toml");
        std::fs::write(&path, config).unwrap();
        execute(
            dir,
            OutputFormat::Compact,
            None,
            None,
            &ConfigSource::Project(path),
        )
    }

    const NOTES_CHECK: &str = r#"
[[documents]]
name = "NOTES"
path = "NOTES.md"

[[checks]]
id = "NOTES-1"
document = "NOTES"
matchers = [{ heading = "Rollback" }]
"#;

    #[test]
    fn unknown_preset_is_a_setup_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = run_in(tmp.path(), "preset = \"paranoid\"\n");
        assert!(matches!(result, Err(SetupError::Other(_))));
        assert_eq!(exit_status(&result), EXIT_SETUP);
    }

    #[test]
    fn invalid_config_is_a_setup_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = run_in(tmp.path(), "fail_on = \"critical\"\n");
        assert_eq!(exit_status(&result), EXIT_SETUP);

        let result = run_in(tmp.path(), "[[checks]\n");
        assert_eq!(exit_status(&result), EXIT_SETUP);
    }

    #[test]
    fn unreadable_config_is_a_setup_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = ConfigSource::Explicit(tmp.path().join("missing.toml"));
        let result = execute(tmp.path(), OutputFormat::Compact, None, None, &source);
        assert_eq!(exit_status(&result), EXIT_SETUP);
    }

    #[test]
    fn missing_document_is_a_setup_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = run_in(tmp.path(), NOTES_CHECK);
        assert!(matches!(
            result,
            Err(SetupError::Validate(ValidateError::DocumentLoad(_)))
        ));
        assert_eq!(exit_status(&result), EXIT_SETUP);
    }

    #[test]
    fn threshold_breach_exits_one() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("NOTES.md"), "# Notes\nNothing yet.\n").unwrap();
        let result = run_in(tmp.path(), NOTES_CHECK);
        assert!(matches!(result, Ok(true)));
        assert_eq!(exit_status(&result), EXIT_THRESHOLD);
    }

    #[test]
    fn clean_run_exits_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("NOTES.md"), "# Notes\n\n## Rollback\n\nRevert.\n").unwrap();
        let result = run_in(tmp.path(), NOTES_CHECK);
        assert_eq!(exit_status(&result), 0);
    }
}
