//! Internal runner for `check!()` macro integration.
//!
//! This module is `#[doc(hidden)]` and not part of the public API.
//! It is called by the generated test function from `doccheck::check!()`.

use doccheck_core::source::load_manifest_blocking;
use doccheck_core::{declarative, Config, RuleStatus, Validator};
use doccheck_rules::resolve_rule_set;
use std::path::{Path, PathBuf};

/// Config file names to search for, in priority order.
const CONFIG_CANDIDATES: &[&str] = &["doccheck.toml", ".doccheck.toml"];

/// Arguments collected from the `check!()` invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    preset: Option<String>,
    config: Option<String>,
    fail_on: Option<String>,
}

impl CheckArgs {
    /// Sets one macro argument by name.
    ///
    /// # Panics
    ///
    /// Panics on an unknown argument name.
    #[must_use]
    pub fn set(mut self, key: &str, value: &str) -> Self {
        let value = Some(value.to_string());
        match key {
            "preset" => self.preset = value,
            "config" => self.config = value,
            "fail_on" => self.fail_on = value,
            other => panic!(
                "doccheck: unknown check! argument `{other}`. Valid arguments: preset, config, fail_on"
            ),
        }
        self
    }
}

/// Runs doccheck as part of `cargo test`.
///
/// Called by the `check!()` macro-generated test function.
///
/// # Panics
///
/// Panics with a formatted report if outcomes at or above `fail_on` are
/// found, or with the setup error if the run cannot start.
pub fn run_check(args: CheckArgs) {
    let root = find_project_root();
    let (content, base_dir) = read_config_content(&root, args.config.as_deref());
    let config = parse_config(&content);

    let preset = args.preset.as_deref().or(config.preset.as_deref());
    let fail_on = resolve_fail_on(args.fail_on.as_deref(), &config);

    let project = declarative::parse_dto(&content)
        .unwrap_or_else(|e| panic!("doccheck: declarative config error: {e}"));
    let rule_set =
        resolve_rule_set(preset, project).unwrap_or_else(|e| panic!("doccheck: {e}"));

    let manifest = load_manifest_blocking(
        rule_set.referenced_documents(),
        &base_dir,
        config.validator.load_timeout(),
    )
    .unwrap_or_else(|e| panic!("doccheck: {e}"));

    let report = Validator::builder()
        .rule_set(rule_set)
        .manifest(manifest)
        .config(config)
        .build()
        .unwrap_or_else(|e| panic!("doccheck: {e}"))
        .validate();

    if report.has_outcomes_at(fail_on) {
        panic!("{}", report.format_test_report(fail_on));
    }
}

/// Reads the raw TOML content and the directory documents resolve against.
///
/// Returns an empty string and the root if no config file is found.
fn read_config_content(root: &Path, explicit_path: Option<&str>) -> (String, PathBuf) {
    let path = match explicit_path {
        Some(path) if Path::new(path).is_absolute() => Some(PathBuf::from(path)),
        Some(path) => Some(root.join(path)),
        None => CONFIG_CANDIDATES
            .iter()
            .map(|name| root.join(name))
            .find(|candidate| candidate.exists()),
    };

    let Some(path) = path else {
        return (String::new(), root.to_path_buf());
    };

    let content = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!(
            "doccheck: failed to read config from {}: {e}",
            path.display()
        );
    });
    let base_dir = path.parent().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    (content, base_dir)
}

/// Parses a `Config` from TOML content.
fn parse_config(content: &str) -> Config {
    if content.trim().is_empty() {
        return Config::default();
    }
    Config::parse(content).unwrap_or_else(|e| {
        panic!("doccheck: failed to parse config: {e}");
    })
}

/// Checks whether a `Cargo.toml` file defines a `[workspace]` section
/// by parsing as TOML, avoiding false positives from comments or strings.
fn has_workspace_section(cargo_toml: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(cargo_toml) else {
        return false;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return false;
    };
    table.contains_key("workspace")
}

/// Finds the workspace root by walking up from `CARGO_MANIFEST_DIR`.
fn find_project_root() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let manifest_path = PathBuf::from(&manifest_dir);
        return manifest_path
            .ancestors()
            .find(|dir| has_workspace_section(&dir.join("Cargo.toml")))
            .map_or_else(|| manifest_path.clone(), Path::to_path_buf);
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolves the effective threshold from macro arg > config > default.
fn resolve_fail_on(macro_arg: Option<&str>, config: &Config) -> RuleStatus {
    let name = macro_arg.or(config.fail_on.as_deref()).unwrap_or("fail");

    name.parse().unwrap_or_else(|_| {
        panic!("doccheck: unknown status `{name}`. Valid values: fail, partial, pass")
    })
}
