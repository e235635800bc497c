use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use kira_omics_agg::cli;
use kira_omics_agg::config::ConfigLoader;
use kira_omics_agg::hpa::{DEFAULT_HPA_VERSION, HpaHttpClient, select_genes};
use kira_omics_agg::output::CsvOutput;

#[derive(Parser, Debug)]
#[command(name = "kira-hpa-genes")]
#[command(about = "Select candidate genes from Human Protein Atlas releases by protein class")]
#[command(version, author)]
struct Cli {
    /// HPA version number (repeat to stack several releases)
    #[arg(long = "hpa-version", value_name = "N", default_values_t = [DEFAULT_HPA_VERSION])]
    hpa_versions: Vec<u32>,

    /// CSV file to contain the selected gene/protein metadata
    #[arg(long, value_name = "PATH")]
    output: PathBuf,

    #[arg(long, value_name = "PATH")]
    config: Option<String>,
}

fn main() -> ExitCode {
    cli::finish(run())
}

fn run() -> miette::Result<()> {
    cli::init_tracing();
    let args = Cli::parse();
    info!(?args, "gene selection arguments");

    let settings = ConfigLoader::resolve(args.config.as_deref())?;
    let client = HpaHttpClient::new(&settings)?;
    let table = select_genes(&client, &settings, &args.hpa_versions)?;
    CsvOutput::write(&table, &args.output, "gene selection")?;
    Ok(())
}
