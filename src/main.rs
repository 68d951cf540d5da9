mod cli;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use flow_engine::{
    analyze, available_expiries, load_project, merge_datasets, save_project, write_csv, Dataset,
    DatasetSelection, FlowAnalysis, FlowConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(cli.config.as_deref(), args)?,
        Commands::Expiries { files } => {
            let datasets = load_datasets(&files)?;
            let records = merge_datasets(&datasets, &DatasetSelection::All);
            for expiry in available_expiries(&records) {
                println!("{}", expiry);
            }
        }
        Commands::Pack { files, out } => {
            let datasets = load_datasets(&files)?;
            fs::write(&out, save_project(&datasets)?)?;
            info!(datasets = datasets.len(), path = %out.display(), "wrote project");
        }
    }

    Ok(())
}

/// Project files contribute all their datasets; anything else is read as a CSV
/// export whose dataset id is the file stem.
fn load_datasets(files: &[PathBuf]) -> flow_engine::Result<Vec<Dataset>> {
    let upload_time = Local::now().format("%-I:%M:%S %p").to_string();
    let mut datasets = Vec::new();

    for path in files {
        let text = fs::read_to_string(path)?;
        let is_project = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_project {
            datasets.extend(load_project(&text)?);
        } else {
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file_name = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dataset = Dataset::from_csv(id, file_name, upload_time.as_str(), &text);
            if dataset.is_empty() {
                warn!(path = %path.display(), "no trades parsed");
            }
            datasets.push(dataset);
        }
    }

    info!(
        files = files.len(),
        datasets = datasets.len(),
        records = datasets.iter().map(Dataset::len).sum::<usize>(),
        "loaded trade files"
    );
    Ok(datasets)
}

fn run_analyze(config_path: Option<&Path>, args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => FlowConfig::from_path(path)?,
        None => FlowConfig::default(),
    }
    .with_env_overrides()?;

    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if let Some(expiry) = args.expiry {
        config.expiry = expiry;
    }
    if let Some(min_value) = args.min_value {
        config.min_value = min_value;
    }
    if let Some(ma_length) = args.ma_length {
        config.window_length = ma_length;
    }
    let params = config.params()?;

    let datasets = load_datasets(&args.files)?;
    let selection = args.dataset.unwrap_or_default();
    selection.validate(&datasets)?;
    let records = merge_datasets(&datasets, &selection);

    let analysis = analyze(&records, &params);

    if let Some(path) = &args.strikes_csv {
        write_csv(&analysis.strikes.aggregates, path)?;
        info!(path = %path.display(), "wrote strike report");
    }
    if let Some(path) = &args.momentum_csv {
        write_csv(&analysis.momentum, path)?;
        info!(path = %path.display(), "wrote momentum report");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_report(&analysis, records.len());
    }

    Ok(())
}

fn print_report(analysis: &FlowAnalysis, trades: usize) {
    let summary = &analysis.summary;
    let metric = summary.metric;

    println!("Analyzed {} trades by {}", trades, metric);
    println!("Total calls: {:.2}", summary.total_calls);
    println!("Total puts:  {:.2}", summary.total_puts);
    match (summary.put_call_ratio, summary.sentiment) {
        (Some(pcr), Some(sentiment)) => println!("Put/call ratio: {:.2} ({})", pcr, sentiment),
        _ => println!("Put/call ratio: N/A"),
    }
    println!(
        "Call/put share: {:.1}% / {:.1}%",
        summary.call_share_pct, summary.put_share_pct
    );
    if let Some(top) = summary.top_strike {
        println!("Top strike: {:.2} ({:.2})", top.strike, top.gross);
    }
    if let Some(spot) = analysis.strikes.avg_spot {
        println!("Average spot: {:.2}", spot);
    }
    if let Some(spot) = analysis.strikes.latest_spot {
        println!("Latest spot:  {:.2}", spot);
    }

    println!("\nStrikes ({}), showing first 20:", analysis.strikes.aggregates.len());
    for agg in analysis.strikes.aggregates.iter().take(20) {
        println!(
            "{:>10.2}  calls={:>16.2}  puts={:>16.2}",
            agg.strike,
            agg.call_total(metric),
            agg.put_total(metric)
        );
    }

    let trend = &analysis.trend;
    println!("\nMomentum: {} buckets", analysis.momentum.len());
    if let Some(last) = analysis.momentum.last() {
        println!("Net flow: {:.2} at {}", last.cumulative, last.full_date);
    }
    println!("Flow trend: {}", trend.net_flow);
    println!("Spot trend: {}", trend.spot);
    if let Some(divergence) = trend.divergence {
        println!("{}", divergence);
    }

    let signals: Vec<_> = analysis
        .momentum
        .iter()
        .filter_map(|p| p.signal.map(|s| (p, s)))
        .collect();
    println!("\nSignals ({}):", signals.len());
    for (point, signal) in signals {
        println!("{:<24} {:<8} flow={:.2}", point.full_date, signal.to_string(), point.cumulative);
    }
}
