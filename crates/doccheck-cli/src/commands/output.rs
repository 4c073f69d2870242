//! Shared output formatting for reports.

use anyhow::Result;
use doccheck_core::{Report, RuleStatus};

use crate::OutputFormat;

/// Print a report in the specified format.
pub fn print(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Compact => print!("{}", report.format_compact()),
        OutputFormat::Markdown => print!("{}", report.format_markdown()),
    }
    Ok(())
}

fn print_text(report: &Report) {
    for outcome in report.outcomes() {
        let status = match outcome.status() {
            RuleStatus::Pass => "\x1b[32mpass\x1b[0m",
            RuleStatus::Partial => "\x1b[33mpartial\x1b[0m",
            RuleStatus::Fail => "\x1b[31mfail\x1b[0m",
        };

        println!(
            "{} {} [{}]",
            outcome.rule_id(),
            outcome.document(),
            status
        );
        println!("  {}", outcome.description());
        for evidence in outcome.evidence() {
            if let Some(span) = evidence.span {
                println!("  = {} at {}: {}", evidence.matcher, span, evidence.snippet);
            }
        }
        for missing in outcome.missing() {
            println!("  = missing: {missing}");
        }
        println!();
    }

    let summary = report.summary();
    let summary_color = if summary.fail_count > 0 {
        "\x1b[31m"
    } else if summary.partial_count > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!("{summary_color}{summary}\x1b[0m");
}
