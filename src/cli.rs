use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "etfpool")]
#[command(about = "ETF data crawler, scoring and pool selection", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl daily data for the configured universe
    Crawl {
        /// Resume an interrupted batch instead of starting fresh
        #[arg(long)]
        resume: bool,
    },
    /// Generate a new pool snapshot
    Pool,
    /// Score a single symbol
    Score {
        /// Fund code, e.g. 510300
        symbol: String,
    },
    /// Show crawl status and cache coverage
    Status,
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl { resume } => {
            commands::crawl::run(resume);
        }
        Commands::Pool => {
            commands::pool::run();
        }
        Commands::Score { symbol } => {
            commands::score::run(&symbol);
        }
        Commands::Status => {
            commands::status::run();
        }
    }
}
