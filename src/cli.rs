use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use flow_engine::{DatasetSelection, Metric};

#[derive(Parser)]
#[command(name = "options-flow")]
#[command(about = "Options flow analytics over trade exports", long_about = None)]
pub struct Cli {
    /// JSON file with default analysis parameters
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge trade files and print strike, momentum and trend analysis
    Analyze(AnalyzeArgs),
    /// List the expiries present in the merged trades
    Expiries {
        /// Trade CSV exports or project JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Bundle trade files into a compact project file
    Pack {
        /// Trade CSV exports or project JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Trade CSV exports or project JSON files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// `all` or the id of one loaded dataset (a CSV file's stem)
    #[arg(short, long)]
    pub dataset: Option<DatasetSelection>,

    /// `All` or an expiry date such as 11/21/2025
    #[arg(short, long)]
    pub expiry: Option<String>,

    /// premium or size
    #[arg(short, long)]
    pub metric: Option<Metric>,

    #[arg(long)]
    pub min_value: Option<f64>,

    /// Moving average window in buckets
    #[arg(long)]
    pub ma_length: Option<usize>,

    /// Print the full analysis as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Write per-strike aggregates to this CSV file
    #[arg(long)]
    pub strikes_csv: Option<PathBuf>,

    /// Write the momentum series to this CSV file
    #[arg(long)]
    pub momentum_csv: Option<PathBuf>,
}
