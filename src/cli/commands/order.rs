//! `pcfr order` command - Proximity-sequence a document without resolving it

use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{load_components, load_settings};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::report::{anomaly_table, component_table, write_anomalies_csv};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::point_model::{build_all, complete_bends};
use crate::core::sequencer::sequence_with;
use crate::entities::anomaly::Anomaly;

#[derive(clap::Args, Debug)]
pub struct OrderArgs {
    /// Component document (YAML, or JSON by extension)
    pub input: PathBuf,

    /// Refno to start from (default: first component)
    #[arg(long)]
    pub start: Option<String>,

    /// Continuity tolerance in mm (overrides config)
    #[arg(long, short = 't')]
    pub tolerance: Option<f64>,
}

#[derive(Serialize)]
struct OrderReport {
    order: Vec<String>,
    restarts: usize,
    anomalies: Vec<Anomaly>,
}

pub fn run(args: OrderArgs, global: &GlobalOpts) -> Result<()> {
    let settings = load_settings(global)?;
    let tolerance = args.tolerance.unwrap_or(settings.continuity_tolerance);
    let start = args.start.as_deref().or(settings.start_refno.as_deref());

    let mut components = load_components(&args.input)?;
    let mut anomalies = build_all(&mut components, &settings);
    anomalies.extend(complete_bends(&mut components, &settings));

    let sequencing = sequence_with(&components, start, tolerance, &settings.sequencer);
    anomalies.extend(sequencing.anomalies);

    match effective_format(global.format, true) {
        OutputFormat::Id => {
            for refno in &sequencing.order {
                println!("{}", refno);
            }
        }
        OutputFormat::Csv => {
            write_anomalies_csv(std::io::stdout().lock(), &anomalies).into_diagnostic()?
        }
        format @ (OutputFormat::Yaml | OutputFormat::Json) => print_structured(
            &OrderReport {
                order: sequencing.order,
                restarts: sequencing.restarts,
                anomalies,
            },
            format,
        )?,
        _ => {
            println!("{}", component_table(&components, &sequencing.order));
            if sequencing.restarts > 0 {
                println!(
                    "{} chain restarted {} time(s) after hops longer than {} mm",
                    style("!").yellow(),
                    sequencing.restarts,
                    settings.sequencer.max_hop
                );
            }
            if !anomalies.is_empty() {
                println!("{}", anomaly_table(&anomalies));
            }
        }
    }
    Ok(())
}
