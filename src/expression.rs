use std::path::{Path, PathBuf};

use tracing::info;

use crate::cache::ResultCache;
use crate::cgds::{self, CgdsClient};
use crate::config::Settings;
use crate::domain::DataType;
use crate::error::OmicsError;
use crate::profile::FetchOptions;
use crate::progress::ProgressSink;
use crate::table::Table;
use crate::tcga::{self, DataRequest};

#[derive(Debug, Clone)]
pub struct ExpressionRequest {
    pub gene_meta_path: PathBuf,
    pub study_id: String,
    pub use_rna_seq: bool,
    pub cache_dir: Option<PathBuf>,
}

/// Distinct `Gene` values of a gene-metadata CSV, in file order.
pub fn read_gene_list(path: &Path) -> Result<Vec<String>, OmicsError> {
    let table = Table::read_csv(path)?;
    let genes = cgds::unique_values(&table, "Gene")?;
    if genes.is_empty() {
        return Err(OmicsError::Validation(format!(
            "gene metadata file {} lists no genes",
            path.display()
        )));
    }
    Ok(genes)
}

/// Expression z-scores (RNA-seq or microarray) for one study in long format.
pub fn get_expression_data<C: CgdsClient + ?Sized>(
    client: &C,
    request: &ExpressionRequest,
    settings: &Settings,
    sink: &dyn ProgressSink,
) -> Result<Table, OmicsError> {
    let data_type = DataType::expression_zscores(request.use_rna_seq);
    let genes = read_gene_list(&request.gene_meta_path)?;
    info!(
        genes = genes.len(),
        study = %request.study_id,
        data_type = %data_type,
        "collecting expression data"
    );

    let cache = request
        .cache_dir
        .as_deref()
        .map(ResultCache::from_path)
        .transpose()?;
    let options = FetchOptions::from_settings(settings, cache);
    let data_request = DataRequest::new(vec![request.study_id.clone()], data_type, genes)
        .with_marker(settings.study_marker.clone());
    tcga::get_data(client, &data_request, &options, sink)
}
