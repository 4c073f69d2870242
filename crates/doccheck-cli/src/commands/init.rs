//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# doccheck configuration
# See https://github.com/ynishi/doccheck for documentation

# Built-in checklists: "recommended" (readme + deployment), "strict", "minimal"
preset = "recommended"

# Exit non-zero when any check is at or above this status ("fail" or "partial")
fail_on = "fail"

[matcher]
# Lines captured after a matched heading
section_lines = 20
# Sliding window for keyword sets
window_lines = 10

[validator]
# Per-document load timeout
load_timeout_ms = 5000

# Per-check overrides
# [rules.DEPLOY-004]
# enabled = false
# required = true

# Point a checklist at a different file
# [[documents]]
# name = "DEPLOYMENT"
# path = "docs/ops/deploy.md"

# Project-specific checks
# [[checks]]
# id = "PROJ-001"
# description = "README links the changelog"
# document = "README"
# matchers = [{ pattern = 'CHANGELOG\.md' }]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new("doccheck.toml"), force)?;

    println!("Created doccheck.toml");
    println!("\nNext steps:");
    println!("  1. Edit doccheck.toml to pick a preset and add checks");
    println!("  2. Run: doccheck check");

    Ok(())
}

fn write_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;
    Ok(())
}
