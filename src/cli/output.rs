//! Output formatting utilities

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::yaml::Summary;

/// Resolve `Auto` for the kind of result being printed
pub fn effective_format(format: OutputFormat, is_report: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_report {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print a serializable value as YAML or JSON
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(value).into_diagnostic()?;
        println!("{}", json);
    } else {
        let yaml = serde_yml::to_string(value).into_diagnostic()?;
        print!("{}", yaml);
    }
    Ok(())
}

/// One-line styled run summary
pub fn print_summary(summary: &Summary) {
    let marker = if summary.errors > 0 {
        style("✗").red()
    } else if summary.warnings > 0 {
        style("!").yellow()
    } else {
        style("✓").green()
    };
    println!(
        "{} {} components ({} synthetic) in {} mode: {} errors, {} warnings, {} info{}",
        marker,
        summary.components,
        summary.synthetic,
        style(&summary.mode).cyan(),
        style(summary.errors).red(),
        style(summary.warnings).yellow(),
        summary.infos,
        if summary.second_pass {
            ", relaxed second pass ran"
        } else {
            ""
        }
    );
}
