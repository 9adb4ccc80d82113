//! `pcfr segment` command - Split over-length runs for fabrication

use std::path::PathBuf;

use console::style;
use miette::Result;

use crate::cli::helpers::{load_components, load_settings};
use crate::cli::output::{effective_format, print_structured, print_summary};
use crate::cli::report::component_table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::pipeline::PipelineOutcome;
use crate::core::point_model::build_all;
use crate::core::segment::segmentize;
use crate::yaml::ResolvedDocument;

#[derive(clap::Args, Debug)]
pub struct SegmentArgs {
    /// Component document (YAML, or JSON by extension)
    pub input: PathBuf,

    /// Longest allowed piece in mm (overrides config)
    #[arg(long, short = 'l')]
    pub max_length: Option<f64>,

    /// Write the segmented document here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: SegmentArgs, global: &GlobalOpts) -> Result<()> {
    let settings = load_settings(global)?;
    let max_length = args.max_length.unwrap_or(settings.max_segment_length);
    if max_length <= 0.0 {
        return Err(miette::miette!(
            help = "pass a positive --max-length",
            "maximum segment length must be positive, got {}",
            max_length
        ));
    }

    let mut components = load_components(&args.input)?;
    let mut anomalies = build_all(&mut components, &settings);
    let segmented = segmentize(components, max_length);
    anomalies.extend(segmented.anomalies);

    let order = segmented.components.iter().map(|c| c.refno.clone()).collect();
    let outcome = PipelineOutcome {
        components: segmented.components,
        anomalies,
        order,
        second_pass: false,
    };
    let doc = ResolvedDocument::from_outcome(outcome, "segment");

    if let Some(path) = &args.output {
        doc.save(path)?;
        print_summary(&doc.summary);
        println!("   {} {}", style("→").dim(), style(path.display()).cyan());
        return Ok(());
    }

    match effective_format(global.format, false) {
        OutputFormat::Table => println!("{}", component_table(&doc.components, &doc.order)),
        OutputFormat::Id => {
            for refno in &doc.order {
                println!("{}", refno);
            }
        }
        format => print_structured(&doc, format)?,
    }
    Ok(())
}
