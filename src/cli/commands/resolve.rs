//! `pcfr resolve` command - Run the full reconstruction pipeline

use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::filters::SeverityFilter;
use crate::cli::helpers::{load_components, load_settings};
use crate::cli::output::{effective_format, print_structured, print_summary};
use crate::cli::report::{anomaly_table, write_anomalies_csv};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{ProcessingMode, Settings};
use crate::core::pipeline::Pipeline;
use crate::yaml::{DocumentFormat, ResolvedDocument};

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Component document (YAML, or JSON by extension)
    pub input: PathBuf,

    /// Processing mode (overrides config)
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<ProcessingMode>,

    /// Continuity tolerance in mm (overrides config)
    #[arg(long, short = 't')]
    pub tolerance: Option<f64>,

    /// Skip the relaxed second repair pass
    #[arg(long)]
    pub single_pass: bool,

    /// Disable sequence-based gap filling in repair mode
    #[arg(long)]
    pub no_gap_fill: bool,

    /// Refno to start sequencing from
    #[arg(long)]
    pub start: Option<String>,

    /// Write the resolved document here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Also write anomalies to this CSV file
    #[arg(long)]
    pub anomalies: Option<PathBuf>,

    /// Lowest severity shown in table output
    #[arg(long, value_enum, default_value_t = SeverityFilter::Info)]
    pub min_severity: SeverityFilter,

    /// Exit with an error when any anomaly reaches this severity
    #[arg(long, value_enum)]
    pub fail_on: Option<SeverityFilter>,
}

impl ResolveArgs {
    /// Apply command-line overrides on top of loaded settings
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(tolerance) = self.tolerance {
            settings.continuity_tolerance = tolerance;
        }
        if self.single_pass {
            settings.multi_pass = false;
        }
        if self.no_gap_fill {
            settings.gap_fill = false;
        }
        if let Some(start) = &self.start {
            settings.start_refno = Some(start.clone());
        }
        settings
    }
}

pub fn run(args: ResolveArgs, global: &GlobalOpts) -> Result<()> {
    let settings = args.apply(load_settings(global)?);
    let mode = settings.mode;
    let components = load_components(&args.input)?;

    let pipeline = Pipeline::new(settings)?;
    let doc = ResolvedDocument::from_outcome(pipeline.run(components), mode);

    if let Some(path) = &args.anomalies {
        let file = std::fs::File::create(path).into_diagnostic()?;
        write_anomalies_csv(file, &doc.anomalies).into_diagnostic()?;
    }

    if let Some(path) = &args.output {
        doc.save(path)?;
        print_summary(&doc.summary);
        println!("   {} {}", style("→").dim(), style(path.display()).cyan());
    } else {
        match effective_format(global.format, false) {
            OutputFormat::Json => println!("{}", doc.render(DocumentFormat::Json)?),
            OutputFormat::Table => {
                print_summary(&doc.summary);
                let shown: Vec<_> = doc
                    .anomalies
                    .iter()
                    .filter(|a| args.min_severity.matches(a))
                    .collect();
                if !shown.is_empty() {
                    println!("{}", anomaly_table(shown));
                }
            }
            OutputFormat::Csv => {
                write_anomalies_csv(std::io::stdout().lock(), &doc.anomalies).into_diagnostic()?
            }
            OutputFormat::Id => {
                for refno in &doc.order {
                    println!("{}", refno);
                }
            }
            _ => print_structured(&doc, OutputFormat::Yaml)?,
        }
    }

    if let Some(level) = args.fail_on {
        let failing = doc.anomalies.iter().filter(|a| level.matches(a)).count();
        if failing > 0 {
            return Err(miette::miette!(
                code = "pcfr::resolve::fail_on",
                "{} anomalies at or above {}",
                failing,
                level
            ));
        }
    }
    Ok(())
}
