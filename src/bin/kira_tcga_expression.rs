use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::info;

use kira_omics_agg::cgds::CgdsHttpClient;
use kira_omics_agg::cli;
use kira_omics_agg::config::ConfigLoader;
use kira_omics_agg::expression::{ExpressionRequest, get_expression_data};
use kira_omics_agg::output::CsvOutput;
use kira_omics_agg::progress::TracingProgress;

#[derive(Parser, Debug)]
#[command(name = "kira-tcga-expression")]
#[command(about = "Collect TCGA expression z-scores from cBioPortal in long format")]
#[command(version, author)]
struct Cli {
    /// CSV file containing gene metadata (a `Gene` column) to collect expression data for
    #[arg(long, value_name = "PATH")]
    gene_meta_path: PathBuf,

    /// TCGA cohort/study id (eg prad_tcga or prad_tcga_pub)
    #[arg(long, value_name = "STUDYID")]
    study_id: String,

    /// Collect RNA-seq (true) or microarray (false) expression data
    #[arg(long, value_name = "true|false", default_value_t = true, action = ArgAction::Set)]
    use_rna_seq: bool,

    /// Cache directory for CGDS web service calls (repeat runs are faster)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// CSV file to contain the resulting TCGA expression data
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
    info!(?args, "TCGA expression arguments");

    let settings = ConfigLoader::resolve(args.config.as_deref())?;
    let client = CgdsHttpClient::new(&settings)?;
    let request = ExpressionRequest {
        gene_meta_path: args.gene_meta_path,
        study_id: args.study_id,
        use_rna_seq: args.use_rna_seq,
        cache_dir: args.cache_dir,
    };

    let table = get_expression_data(&client, &request, &settings, &TracingProgress)?;
    CsvOutput::write(&table, &args.output, "TCGA expression")?;
    Ok(())
}
