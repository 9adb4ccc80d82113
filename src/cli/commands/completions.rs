//! `pcfr completions` command - Shell completion scripts

use clap::CommandFactory;
use clap_complete::Shell;
use miette::Result;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "pcfr", &mut std::io::stdout());
    Ok(())
}
