//! `pcfr config` command - Show effective settings and where they come from

use console::style;
use miette::Result;

use crate::cli::helpers::load_settings;
use crate::cli::output::print_structured;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{Settings, PROJECT_CONFIG_FILE};

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// List config file locations instead of values
    #[arg(long)]
    pub paths: bool,
}

pub fn run(args: ConfigArgs, global: &GlobalOpts) -> Result<()> {
    if args.paths {
        let user = Settings::user_config_path();
        let project = std::path::PathBuf::from(PROJECT_CONFIG_FILE);
        print_location("user", user.as_deref());
        print_location("project", Some(project.as_path()));
        print_location("explicit", global.config.as_deref());
        return Ok(());
    }

    let settings = load_settings(global)?;
    let format = match global.format {
        OutputFormat::Json => OutputFormat::Json,
        _ => OutputFormat::Yaml,
    };
    print_structured(&settings, format)
}

fn print_location(label: &str, path: Option<&std::path::Path>) {
    match path {
        Some(p) if p.exists() => println!(
            "{:<9} {} {}",
            label,
            style(p.display()).cyan(),
            style("(found)").green()
        ),
        Some(p) => println!("{:<9} {} {}", label, style(p.display()).dim(), style("(absent)").dim()),
        None => println!("{:<9} {}", label, style("-").dim()),
    }
}
