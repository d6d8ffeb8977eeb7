use crate::prelude::*;
use clap::Parser;

mod consolidate;
mod error;
mod extract;
mod pipeline;
mod prelude;
mod report;
mod workbook;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Pull financial tables out of PDF reports and consolidate them into one item × period summary per table position"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "MATOME_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    /// Print the result as JSON instead of tables.
    #[clap(long, global = true, default_value = "false")]
    json: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract the tables of keyword pages into an intermediate workbook
    Extract(crate::extract::ExtractArgs),

    /// Consolidate an intermediate workbook into summary tables
    Consolidate(crate::consolidate::ConsolidateArgs),

    /// Extract and consolidate in one go
    Run(crate::pipeline::RunArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Extract(args) => crate::extract::run(args, app.global),
        SubCommands::Consolidate(args) => crate::consolidate::run(args, app.global),
        SubCommands::Run(args) => crate::pipeline::run(args, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
