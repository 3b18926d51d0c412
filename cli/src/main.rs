//! Command-line front end for the procurement risk engine
//!
//! Reads clean input tables from CSV, runs the pipeline and writes the
//! scored (or wide feature) table as CSV.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procurement_risk_core::output::{
    write_feature_table_file, write_joined_file, write_report_file, write_scored_file,
};
use procurement_risk_core::{PipelineConfig, PipelineInputs, ReferenceTables, RiskPipeline};

#[derive(Parser)]
#[command(name = "procurement-risk")]
#[command(about = "Rule-based risk scoring of procurement contracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every contract
    Score {
        #[command(flatten)]
        inputs: InputArgs,

        /// Scored table (CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Run report (JSON)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compute the wide feature table without scoring
    Features {
        #[command(flatten)]
        inputs: InputArgs,

        /// Wide feature table (CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Directory for the per-grain feature tables
        #[arg(long)]
        grain_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Pipeline configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disclosure contract records
    #[arg(long)]
    contracts: PathBuf,

    /// Bid roster (contract_number, bidder)
    #[arg(long)]
    bids: Option<PathBuf>,

    /// Quotation counts (event_id, quotations)
    #[arg(long)]
    quotations: Option<PathBuf>,

    /// Clarification meeting attendance (event_id, attendee)
    #[arg(long)]
    attendance: Option<PathBuf>,

    /// Possible bidders (event_id, company)
    #[arg(long)]
    possible_bidders: Option<PathBuf>,

    /// Secondary portal records
    #[arg(long)]
    secondary: Option<PathBuf>,

    /// Registered suppliers (name, tax_id)
    #[arg(long)]
    registered_suppliers: Option<PathBuf>,

    /// Ghost-company registry (name, tax_id, status)
    #[arg(long)]
    ghost_companies: Option<PathBuf>,

    /// Taxpayers not located by the tax authority (name, tax_id)
    #[arg(long)]
    not_located: Option<PathBuf>,

    /// Sanctioned suppliers (name, tax_id)
    #[arg(long)]
    sanctioned_suppliers: Option<PathBuf>,

    /// Sanctioned individuals (name, tax_id)
    #[arg(long)]
    sanctioned_individuals: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("procurement_risk_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            inputs,
            output,
            report,
        } => score(&inputs, &output, report.as_deref()),
        Commands::Features {
            inputs,
            output,
            grain_dir,
        } => features(&inputs, &output, grain_dir.as_deref()),
    }
}

fn score(args: &InputArgs, output: &Path, report: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(args)?;
    let inputs = load_inputs(args)?;
    let result = pipeline.run(&inputs).context("risk pipeline failed")?;

    write_scored_file(output, &result.scored)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(path = %output.display(), rows = result.scored.len(), "wrote scored table");

    if let Some(path) = report {
        write_report_file(path, &result.report)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote run report");
    }
    Ok(())
}

fn features(args: &InputArgs, output: &Path, grain_dir: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(args)?;
    let inputs = load_inputs(args)?;
    let features = pipeline
        .compute_features(&inputs)
        .context("feature computation failed")?;

    write_joined_file(output, &features.joined)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(path = %output.display(), rows = features.joined.len(), "wrote feature table");

    if let Some(dir) = grain_dir {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        write_feature_table_file(&dir.join("supplier_features.csv"), &features.suppliers)?;
        write_feature_table_file(&dir.join("procedure_features.csv"), &features.procedures)?;
        write_feature_table_file(&dir.join("contract_features.csv"), &features.contracts)?;
        tracing::info!(dir = %dir.display(), "wrote per-grain feature tables");
    }
    Ok(())
}

fn build_pipeline(args: &InputArgs) -> Result<RiskPipeline> {
    let config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            PipelineConfig::from_json(&json)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    let pipeline = RiskPipeline::new(config).context("invalid configuration")?;
    tracing::info!(fingerprint = pipeline.fingerprint(), "configuration loaded");
    Ok(pipeline)
}

fn load_inputs(args: &InputArgs) -> Result<PipelineInputs> {
    let references = ReferenceTables {
        registered_suppliers: read_optional(args.registered_suppliers.as_deref())?,
        ghost_companies: read_optional(args.ghost_companies.as_deref())?,
        not_located: read_optional(args.not_located.as_deref())?,
        sanctioned_suppliers: read_optional(args.sanctioned_suppliers.as_deref())?,
        sanctioned_individuals: read_optional(args.sanctioned_individuals.as_deref())?,
    };

    Ok(PipelineInputs::new(read_csv(&args.contracts)?)
        .with_bids(read_optional(args.bids.as_deref())?)
        .with_quotations(read_optional(args.quotations.as_deref())?)
        .with_attendance(read_optional(args.attendance.as_deref())?)
        .with_possible_bidders(read_optional(args.possible_bidders.as_deref())?)
        .with_secondary(read_optional(args.secondary.as_deref())?)
        .with_references(references))
}

fn read_optional<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    path.map_or_else(|| Ok(Vec::new()), read_csv)
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "read input table");
    Ok(rows)
}
