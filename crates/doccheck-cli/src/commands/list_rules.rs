//! List rules command implementation.

use anyhow::{anyhow, Result};
use doccheck_rules::{all_checklists, Preset};

/// Runs the list-rules command.
pub fn run(preset: Option<&str>) -> Result<()> {
    let checks = match preset {
        Some(name) => {
            let preset = Preset::from_name(name).ok_or_else(|| {
                anyhow!("Unknown preset `{name}`. Valid presets: recommended, strict, minimal")
            })?;
            println!("Checks in preset `{preset}`:\n");
            preset.rule_set()?.checks
        }
        None => {
            println!("Available checks:\n");
            let mut checks = Vec::new();
            for list in all_checklists() {
                checks.extend(list.dto()?.checks);
            }
            checks
        }
    };

    println!("{:<12} {:<14} {:<10} Description", "Id", "Document", "Required");
    println!("{}", "-".repeat(80));

    for check in &checks {
        println!(
            "{:<12} {:<14} {:<10} {}",
            check.id.as_deref().unwrap_or("-"),
            check.document.as_deref().unwrap_or("-"),
            if check.required { "yes" } else { "no" },
            check.description
        );
    }

    println!("\nPresets:");
    println!("  recommended  - readme + deployment checklists (default)");
    println!("  strict       - all checklists, every check required");
    println!("  minimal      - README-001..README-004 (for gradual adoption)");

    println!("\nUse --rules to run specific checks, e.g.:");
    println!("  doccheck check --rules README-002,DEPLOY-005");

    Ok(())
}
