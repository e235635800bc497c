use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::OmicsError;
use crate::table::{Row, Table};

pub const GENE_META_COLUMNS: [&str; 8] = [
    "Gene",
    "Gene synonym",
    "Ensembl",
    "Chromosome",
    "RNA tissue category",
    "RNA TS",
    "RNA TS TPM",
    "Protein classes",
];

/// Percentiles reported per (study, gene) next to count/mean/std/min/max.
pub const PERCENTILES: [f64; 11] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99];

#[derive(Debug, Clone)]
pub struct AggregationRequest {
    pub gene_meta_path: PathBuf,
    pub gene_exp_paths: Vec<PathBuf>,
}

/// Upper-cases the first letter of every alphabetic run and lower-cases
/// the rest (`"RNA TS TPM"` becomes `"Rna Ts Tpm"`).
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

fn compact_name(value: &str) -> String {
    title_case(value).replace(' ', "")
}

/// Gene metadata restricted to the aggregation fields, one row per gene.
pub fn get_gene_meta(path: &Path) -> Result<Table, OmicsError> {
    let raw = Table::read_csv(path)?;
    let mut meta = raw.select(&GENE_META_COLUMNS)?;
    meta.rename_columns(compact_name);

    let gene = meta.require_column("Gene")?;
    let synonym = meta.require_column("GeneSynonym")?;

    let mut counts = HashMap::<String, usize>::new();
    for row in meta.rows() {
        if let Some(name) = &row[gene] {
            *counts.entry(name.clone()).or_default() += 1;
        }
    }
    let mut duplicated = counts
        .into_iter()
        .filter_map(|(name, count)| (count > 1).then_some(name))
        .collect::<Vec<_>>();
    if !duplicated.is_empty() {
        duplicated.sort();
        warn!(genes = ?duplicated, "removing duplicated records lacking a gene synonym");
        let duplicated = duplicated.into_iter().collect::<HashSet<_>>();
        meta.retain_rows(|row| {
            let is_dupe = row[gene]
                .as_ref()
                .map(|name| duplicated.contains(name))
                .unwrap_or(false);
            !is_dupe || row[synonym].is_some()
        });
    }

    let mut seen = HashSet::new();
    for row in meta.rows() {
        if let Some(name) = &row[gene] {
            if !seen.insert(name.as_str()) {
                return Err(OmicsError::Integrity(format!(
                    "gene \"{name}\" is still duplicated after removing records without synonyms"
                )));
            }
        }
    }
    Ok(meta)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub percentiles: Vec<Option<f64>>,
    pub max: Option<f64>,
}

/// Linear interpolation between closest ranks of an ascending slice.
fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn describe(values: &[f64]) -> Summary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
    let std = match (mean, count) {
        (Some(mean), n) if n > 1 => {
            let ss = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };
    Summary {
        count,
        mean,
        std,
        min: sorted.first().copied(),
        percentiles: PERCENTILES.iter().map(|&p| percentile(&sorted, p)).collect(),
        max: sorted.last().copied(),
    }
}

pub fn stat_columns() -> Vec<String> {
    let mut columns = vec![
        "Count".to_string(),
        "Mean".to_string(),
        "Std".to_string(),
        "Min".to_string(),
    ];
    columns.extend(
        PERCENTILES
            .iter()
            .map(|p| format!("{}%", (p * 100.0).round() as u32)),
    );
    columns.push("Max".to_string());
    columns
}

fn number(value: Option<f64>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Per (StudyId, Gene) statistics of a long-format expression CSV, sorted
/// by study then gene.
pub fn get_exp_stats(path: &Path) -> Result<Table, OmicsError> {
    let data = Table::read_csv(path)?;
    let study = data.require_column("StudyId")?;
    let gene = data.require_column("Gene")?;
    let sample = data.require_column("SampleId")?;
    let value = data.require_column("Value")?;

    let mut triples = HashSet::new();
    for row in data.rows() {
        let triple = (&row[study], &row[gene], &row[sample]);
        if !triples.insert(triple) {
            return Err(OmicsError::Integrity(format!(
                "duplicate expression record in {} for {:?}",
                path.display(),
                triple
            )));
        }
    }

    let mut groups = BTreeMap::<(String, String), Vec<f64>>::new();
    for row in data.rows() {
        let (Some(study_id), Some(gene_name)) = (&row[study], &row[gene]) else {
            continue;
        };
        let values = groups
            .entry((study_id.clone(), gene_name.clone()))
            .or_default();
        if let Some(raw) = &row[value] {
            let parsed = raw.trim().parse::<f64>().map_err(|_| {
                OmicsError::Parse(format!(
                    "non-numeric value \"{raw}\" for study \"{study_id}\", gene \"{gene_name}\""
                ))
            })?;
            values.push(parsed);
        }
    }

    let mut columns = vec!["StudyId".to_string(), "Gene".to_string()];
    columns.extend(stat_columns());
    let mut stats = Table::new(columns);
    for ((study_id, gene_name), values) in groups {
        let summary = describe(&values);
        let mut row: Row = vec![
            Some(study_id),
            Some(gene_name),
            Some(summary.count.to_string()),
            number(summary.mean),
            number(summary.std),
            number(summary.min),
        ];
        row.extend(summary.percentiles.into_iter().map(number));
        row.push(number(summary.max));
        stats.push_row(row)?;
    }
    Ok(stats)
}

/// Inner join on `Gene`, in gene-metadata row order.
pub fn merge(gene_meta: &Table, exp_stats: &Table) -> Result<Table, OmicsError> {
    let meta_gene = gene_meta.require_column("Gene")?;
    let stats_gene = exp_stats.require_column("Gene")?;
    let stats_study = exp_stats.require_column("StudyId")?;

    let meta_rest = (0..gene_meta.width())
        .filter(|&i| i != meta_gene)
        .collect::<Vec<_>>();
    let stat_rest = (0..exp_stats.width())
        .filter(|&i| i != stats_gene && i != stats_study)
        .collect::<Vec<_>>();

    let mut columns = vec!["Gene".to_string()];
    columns.extend(
        meta_rest
            .iter()
            .map(|&i| format!("Meta:{}", gene_meta.columns()[i])),
    );
    columns.push("StudyId".to_string());
    columns.extend(
        stat_rest
            .iter()
            .map(|&i| format!("Stat:{}", exp_stats.columns()[i])),
    );

    let mut by_gene = HashMap::<&str, Vec<&Row>>::new();
    for row in exp_stats.rows() {
        if let Some(name) = row[stats_gene].as_deref() {
            by_gene.entry(name).or_default().push(row);
        }
    }

    let mut merged = Table::new(columns);
    for meta_row in gene_meta.rows() {
        let Some(name) = meta_row[meta_gene].as_deref() else {
            continue;
        };
        let Some(matches) = by_gene.get(name) else {
            continue;
        };
        for stat_row in matches {
            let mut row: Row = vec![Some(name.to_string())];
            row.extend(meta_rest.iter().map(|&i| meta_row[i].clone()));
            row.push(stat_row[stats_study].clone());
            row.extend(stat_rest.iter().map(|&i| stat_row[i].clone()));
            merged.push_row(row)?;
        }
    }
    Ok(merged)
}

pub fn aggregate_pipeline_results(request: &AggregationRequest) -> Result<Table, OmicsError> {
    if request.gene_exp_paths.is_empty() {
        return Err(OmicsError::Validation(
            "at least one expression data path is required".to_string(),
        ));
    }
    let gene_meta = get_gene_meta(&request.gene_meta_path)?;
    let mut stats = Table::default();
    for path in &request.gene_exp_paths {
        let part = get_exp_stats(path)?;
        info!(path = %path.display(), groups = part.len(), "summarised expression data");
        stats.append(part);
    }
    merge(&gene_meta, &stats)
}
