use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;

mod aggregate;
mod ballotpedia;
mod dom;
mod electionstats;
mod error;
mod fetch;
mod locate;
mod nc;
mod output;
mod record;
mod registry;
mod resolve;
mod sources;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "ballot", about = "Election results scraper")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,
    /// JSON file replacing the built-in ElectionStats source table
    #[arg(global = true, long)]
    sources: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// ElectionStats portal: statewide results and locality breakdowns
    Stats(electionstats::StatsCmd),
    /// Ballotpedia school board districts and candidates
    Schoolboard(ballotpedia::SchoolBoardCmd),
    /// Ballotpedia site search
    BpSearch(ballotpedia::BpSearchCmd),
    /// North Carolina precinct results archives
    Nc(nc::NcCmd),
    /// List the ElectionStats source table
    Sources(sources::SourcesCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and BALLOT_LOG_FORMAT
    telemetry::config::init_tracing();
    let registry = registry::Registry::load(cli.sources.as_deref())?;

    match cli.command {
        Commands::Stats(args) => electionstats::run(&registry, args).await?,
        Commands::Schoolboard(args) => ballotpedia::run_schoolboard(args).await?,
        Commands::BpSearch(args) => ballotpedia::run_search(args).await?,
        Commands::Nc(args) => nc::run(args).await?,
        Commands::Sources(args) => sources::run(&registry, args)?,
    }

    Ok(())
}
