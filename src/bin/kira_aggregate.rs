use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use kira_omics_agg::aggregation::{AggregationRequest, aggregate_pipeline_results};
use kira_omics_agg::cli;
use kira_omics_agg::output::CsvOutput;

#[derive(Parser, Debug)]
#[command(name = "kira-aggregate")]
#[command(about = "Merge gene metadata with per-study expression statistics")]
#[command(version, author)]
struct Cli {
    /// CSV file containing gene metadata (from kira-hpa-genes)
    #[arg(long, value_name = "PATH")]
    gene_meta_path: PathBuf,

    /// CSV file(s) containing TCGA expression data (from kira-tcga-expression)
    #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
    gene_exp_paths: Vec<PathBuf>,

    /// CSV file to contain the aggregated pipeline data
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
}

fn main() -> ExitCode {
    cli::finish(run())
}

fn run() -> miette::Result<()> {
    cli::init_tracing();
    let args = Cli::parse();
    info!(?args, "pipeline aggregation arguments");

    let request = AggregationRequest {
        gene_meta_path: args.gene_meta_path,
        gene_exp_paths: args.gene_exp_paths,
    };
    let table = aggregate_pipeline_results(&request)?;
    CsvOutput::write(&table, &args.output, "pipeline aggregation")?;
    Ok(())
}
