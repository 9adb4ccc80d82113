use clap::Parser;
use miette::Result;
use pcfr::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    if cli.global.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.global.verbose {
            0 => "pcfr=warn",
            1 => "pcfr=info",
            _ => "pcfr=debug",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!cli.global.no_color)
        .init();

    match cli.command {
        Commands::Resolve(args) => pcfr::cli::commands::resolve::run(args, &cli.global),
        Commands::Order(args) => pcfr::cli::commands::order::run(args, &cli.global),
        Commands::Segment(args) => pcfr::cli::commands::segment::run(args, &cli.global),
        Commands::Config(args) => pcfr::cli::commands::config::run(args, &cli.global),
        Commands::Completions(args) => pcfr::cli::commands::completions::run(args),
    }
}
