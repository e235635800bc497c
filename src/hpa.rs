//! Human Protein Atlas bulk download (`proteinatlas.tab.gz`, one URL per
//! release) and protein-class based gene selection.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::OmicsError;
use crate::fs_util::decode_gzip_text;
use crate::table::Table;

pub const DEFAULT_HPA_VERSION: u32 = 16;
pub const PROTEIN_CLASS: &str = "Protein class";
pub const PROTEIN_CLASSES: &str = "Protein classes";
pub const VERSION: &str = "Version";

/// Classes used when selecting candidate genes.
pub const SELECTED_PROTEIN_CLASSES: [&str; 4] = [
    "FDA approved drug targets",
    "Predicted membrane proteins",
    "Cancer-related genes",
    "CD markers",
];

static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*\)").unwrap());

pub trait HpaClient: Send + Sync {
    fn fetch_table(&self, url: &str) -> Result<Table, OmicsError>;
}

#[derive(Clone)]
pub struct HpaHttpClient {
    client: Client,
}

impl HpaHttpClient {
    pub fn new(settings: &Settings) -> Result<Self, OmicsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-omics-agg/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OmicsError::HpaHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.http_timeout)
            .build()
            .map_err(|err| OmicsError::HpaHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HpaClient for HpaHttpClient {
    fn fetch_table(&self, url: &str) -> Result<Table, OmicsError> {
        debug!(%url, "downloading protein atlas release");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| OmicsError::HpaHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "protein atlas request failed".to_string());
            return Err(OmicsError::HpaStatus { status, message });
        }
        let bytes = response
            .bytes()
            .map_err(|err| OmicsError::HpaHttp(err.to_string()))?;
        let text = decode_gzip_text(&bytes)?;
        Table::parse_tsv(&text)
    }
}

pub fn hpa_url(template: &str, version: u32) -> String {
    template.replace("{version}", &version.to_string())
}

/// Downloads each release and stacks them with a `Version` column.
pub fn get_hpa_data<C: HpaClient + ?Sized>(
    client: &C,
    template: &str,
    versions: &[u32],
) -> Result<Table, OmicsError> {
    if versions.is_empty() {
        return Err(OmicsError::Validation(
            "at least one HPA version is required".to_string(),
        ));
    }
    let mut combined = Table::default();
    for &version in versions {
        let url = hpa_url(template, version);
        let table = client.fetch_table(&url).map_err(|err| match err {
            OmicsError::HpaStatus { status, message } => OmicsError::HpaStatus {
                status,
                message: format!("HPA version {version} (URL = \"{url}\"): {message}"),
            },
            other => OmicsError::HpaHttp(format!(
                "failed to retrieve data for HPA version {version} (URL = \"{url}\"): {other}"
            )),
        })?;
        info!(version, rows = table.len(), "loaded protein atlas release");
        combined.append(table.with_constant_column(VERSION, &version.to_string()));
    }
    Ok(combined)
}

/// Strips parenthetical remarks and surrounding whitespace, e.g.
/// `"Protein evidence (Ezkurdia et al 2014)"` becomes `"Protein evidence"`.
pub fn clean_protein_class_name(name: &str) -> String {
    PARENTHETICAL.replace_all(name, "").trim().to_string()
}

fn split_classes(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(clean_protein_class_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Replaces `Protein class` with the cleaned, deduplicated and sorted
/// `Protein classes` list (comma separated).
pub fn prepare_hpa_data(mut table: Table) -> Result<Table, OmicsError> {
    table.drop_column(PROTEIN_CLASSES);
    let index = table.require_column(PROTEIN_CLASS)?;

    let mut columns = table.columns().to_vec();
    columns.remove(index);
    columns.push(PROTEIN_CLASSES.to_string());
    let mut prepared = Table::new(columns);

    for row in table.rows() {
        let names = row[index].as_deref().map(split_classes).unwrap_or_default();
        let joined = (!names.is_empty()).then(|| names.into_iter().collect::<Vec<_>>().join(","));
        let mut row = row.clone();
        row.remove(index);
        row.push(joined);
        prepared.push_row(row)?;
    }
    Ok(prepared)
}

fn row_classes(row: &[Option<String>], index: usize) -> impl Iterator<Item = &str> {
    row[index]
        .as_deref()
        .into_iter()
        .flat_map(|value| value.split(','))
}

/// Keeps records listing at least one of `protein_classes`.
///
/// Every requested class must occur in some record; a class present nowhere
/// is almost certainly misspelled.
pub fn filter_by_protein_class(
    table: &Table,
    protein_classes: &[&str],
) -> Result<Table, OmicsError> {
    let index = table.column_index(PROTEIN_CLASSES).ok_or_else(|| {
        OmicsError::Validation(format!(
            "filtering requires prepared HPA data (missing field \"{PROTEIN_CLASSES}\")"
        ))
    })?;

    let known = table
        .rows()
        .iter()
        .flat_map(|row| row_classes(row, index))
        .collect::<BTreeSet<_>>();
    let missing = protein_classes
        .iter()
        .filter(|class| !known.contains(**class))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(OmicsError::Validation(format!(
            "the following protein class filters do not exist in any HPA record: {missing:?}"
        )));
    }

    let mut filtered = table.clone();
    filtered.retain_rows(|row| {
        row_classes(row, index).any(|class| protein_classes.contains(&class))
    });
    Ok(filtered)
}

/// Downloads, prepares and filters releases to the selected protein classes.
pub fn select_genes<C: HpaClient + ?Sized>(
    client: &C,
    settings: &Settings,
    versions: &[u32],
) -> Result<Table, OmicsError> {
    let raw = get_hpa_data(client, &settings.hpa_url_template, versions)?;
    let prepared = prepare_hpa_data(raw)?;
    filter_by_protein_class(&prepared, &SELECTED_PROTEIN_CLASSES)
}
