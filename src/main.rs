use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod analysis;
mod chart;
mod error;
mod loader;
mod models;
mod ownership;
mod patterns;
mod pricing;
mod report;
mod risk;
mod temporal;

const DEFAULT_CSV: &str = "AssessorSearchResults.csv";

#[derive(Parser)]
#[command(name = "landlord-analyzer")]
#[command(about = "Ownership concentration and predatory landlord risk report for assessor data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full text report and write the charts
    Report {
        #[arg(long, default_value = DEFAULT_CSV)]
        csv: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = ownership::DEFAULT_TOP_OWNERS)]
        top: usize,
        #[arg(long)]
        no_charts: bool,
    },
    /// Print the ranked risk assessment only
    Risk {
        #[arg(long, default_value = DEFAULT_CSV)]
        csv: PathBuf,
        #[arg(long, default_value_t = risk::REPORTED_OWNERS)]
        limit: usize,
    },
    /// Write every computed summary as JSON
    Export {
        #[arg(long, default_value = DEFAULT_CSV)]
        csv: PathBuf,
        #[arg(long, default_value = "analysis.json")]
        out: PathBuf,
    },
}

fn load(csv: &Path) -> anyhow::Result<loader::Dataset> {
    loader::load(csv).with_context(|| format!("could not load {}", csv.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            csv,
            out_dir,
            top,
            no_charts,
        } => {
            let dataset = load(&csv)?;
            if dataset.is_empty() {
                log::warn!("{} contains no property records", csv.display());
            }
            let analysis = analysis::run(&dataset, top);

            let charts = if no_charts {
                Vec::new()
            } else {
                std::fs::create_dir_all(&out_dir)
                    .with_context(|| format!("could not create {}", out_dir.display()))?;
                chart::render_all(&analysis, &dataset, &out_dir)
            };

            print!("{}", report::build_report(&analysis, &charts));
        }
        Commands::Risk { csv, limit } => {
            let dataset = load(&csv)?;
            let owner_counts = ownership::count_by_owner(&dataset.records);
            let assessments = risk::score_owners(&owner_counts);

            if assessments.is_empty() {
                println!("No owners reached the high-risk threshold.");
                return Ok(());
            }

            let mut output = String::new();
            report::write_risk(&mut output, &assessments, limit);
            print!("{output}");
        }
        Commands::Export { csv, out } => {
            let dataset = load(&csv)?;
            let analysis = analysis::run(&dataset, ownership::DEFAULT_TOP_OWNERS);
            let json = serde_json::to_string_pretty(&analysis)?;
            std::fs::write(&out, json)
                .with_context(|| format!("could not write {}", out.display()))?;
            println!("Analysis written to {}.", out.display());
        }
    }

    Ok(())
}
