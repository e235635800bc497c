use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::cgds::{self, CgdsClient};
use crate::config::DEFAULT_STUDY_MARKER;
use crate::domain::{DataType, StudyId};
use crate::error::OmicsError;
use crate::profile::{self, FetchOptions, ProfileQuery};
use crate::progress::ProgressSink;
use crate::table::Table;

pub const STUDY_ID: &str = "STUDY_ID";
pub const GENE_ID: &str = "GENE_ID";
pub const GENE: &str = "GENE";
pub const COMMON: &str = "COMMON";

pub const LONG_COLUMNS: [&str; 5] = ["StudyId", "GeneId", "Gene", "SampleId", "Value"];

/// Multi-study request; every study id must carry `study_marker`.
#[derive(Debug, Clone)]
pub struct DataRequest {
    pub study_ids: Vec<String>,
    pub data_type: DataType,
    pub gene_ids: Vec<String>,
    pub study_marker: String,
}

impl DataRequest {
    pub fn new(study_ids: Vec<String>, data_type: DataType, gene_ids: Vec<String>) -> Self {
        Self {
            study_ids,
            data_type,
            gene_ids,
            study_marker: DEFAULT_STUDY_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.study_marker = marker.into();
        self
    }
}

/// Fetches `data_type` for every usable study and returns it in long format
/// (`StudyId, GeneId, Gene, SampleId, Value`).
///
/// Studies without a matching genetic profile are skipped with a warning,
/// as are studies returning no rows. Unknown or foreign study ids fail the
/// whole call before any profile data is requested.
pub fn get_data<C: CgdsClient + ?Sized>(
    client: &C,
    request: &DataRequest,
    options: &FetchOptions,
    sink: &dyn ProgressSink,
) -> Result<Table, OmicsError> {
    let studies = parse_studies(request)?;
    if request.gene_ids.is_empty() {
        return Err(OmicsError::Validation(
            "Gene IDs must be iterable and non-empty".to_string(),
        ));
    }

    let valid = validate_studies(client, &studies, &request.data_type)?;
    if valid.is_empty() {
        return Err(OmicsError::Validation(format!(
            "no applicable study ids found for data type \"{}\" (study id list = {:?})",
            request.data_type, request.study_ids
        )));
    }

    let names = valid.iter().map(StudyId::as_str).collect::<Vec<_>>();
    info!(studies = ?names, "beginning data collection");
    let mut combined = Table::default();
    let mut with_data = 0usize;
    for (i, study) in valid.iter().enumerate() {
        let profile_id = study.profile(&request.data_type);
        info!(
            study = %study,
            profile = %profile_id,
            "importing data for study ({} of {})",
            i + 1,
            valid.len()
        );
        let query =
            ProfileQuery::from_parts(study.all_cases(), profile_id, request.gene_ids.clone())?;
        let data = profile::get_profile_data(client, &query, options, sink)?;
        if data.is_empty() {
            info!(study = %study, "no rows returned; skipping study");
            continue;
        }
        with_data += 1;
        combined.append(data.with_constant_column(STUDY_ID, study.as_str()));
    }

    if with_data == 0 {
        return Err(OmicsError::Validation(format!(
            "no data found for study ids = {:?}, data type = \"{}\"",
            request.study_ids, request.data_type
        )));
    }

    combined.rename_column(COMMON, GENE);
    check_gene_integrity(&combined)?;
    to_long_format(&combined)
}

fn parse_studies(request: &DataRequest) -> Result<Vec<StudyId>, OmicsError> {
    if request.study_ids.is_empty() {
        return Err(OmicsError::Validation(
            "at least one study id is required".to_string(),
        ));
    }
    request
        .study_ids
        .iter()
        .map(|raw| {
            let study: StudyId = raw.parse()?;
            if !study.as_str().contains(&request.study_marker) {
                return Err(OmicsError::Validation(format!(
                    "Study Id \"{study}\" is not valid in this context because it does not \
                     pertain to \"{}\" studies",
                    request.study_marker
                )));
            }
            Ok(study)
        })
        .collect()
}

fn validate_studies<C: CgdsClient + ?Sized>(
    client: &C,
    studies: &[StudyId],
    data_type: &DataType,
) -> Result<Vec<StudyId>, OmicsError> {
    let catalog = cgds::cancer_studies(client)?;
    let known = cgds::unique_values(&catalog, "cancer_study_id")?
        .into_iter()
        .collect::<HashSet<_>>();

    if let Some(unknown) = studies.iter().find(|study| !known.contains(study.as_str())) {
        return Err(OmicsError::Validation(format!(
            "Study Id \"{unknown}\" is not a known identifier within cBioPortal"
        )));
    }

    let mut valid = Vec::new();
    for study in studies {
        let profile_id = study.profile(data_type);
        let profiles = cgds::genetic_profiles(client, study)?;
        let profiles = cgds::unique_values(&profiles, "genetic_profile_id")?;
        if !profiles.iter().any(|p| p == profile_id.as_str()) {
            warn!(
                study = %study,
                data_type = %data_type,
                "study has no data for this type; it will be ignored"
            );
            continue;
        }
        valid.push(study.clone());
    }
    Ok(valid)
}

fn integrity_column(table: &Table, name: &str) -> Result<usize, OmicsError> {
    table.column_index(name).ok_or_else(|| {
        OmicsError::Integrity(format!(
            "profile data is missing column \"{name}\" (columns = {:?})",
            table.columns()
        ))
    })
}

/// Gene ids and names must map one-to-one, and each (study, gene id, gene)
/// triple may appear only once.
pub fn check_gene_integrity(table: &Table) -> Result<(), OmicsError> {
    let study_col = integrity_column(table, STUDY_ID)?;
    let id_col = integrity_column(table, GENE_ID)?;
    let gene_col = integrity_column(table, GENE)?;

    let mut id_by_gene = HashMap::<&str, &str>::new();
    let mut gene_by_id = HashMap::<&str, &str>::new();
    let mut triples = HashSet::new();

    for (i, row) in table.rows().iter().enumerate() {
        let (Some(study), Some(id), Some(gene)) = (
            row[study_col].as_deref(),
            row[id_col].as_deref(),
            row[gene_col].as_deref(),
        ) else {
            return Err(OmicsError::Integrity(format!(
                "row {} is missing a study, gene id or gene name",
                i + 1
            )));
        };

        if let Some(previous) = id_by_gene.insert(gene, id) {
            if previous != id {
                return Err(OmicsError::Integrity(format!(
                    "gene \"{gene}\" maps to several gene ids ({previous}, {id})"
                )));
            }
        }
        if let Some(previous) = gene_by_id.insert(id, gene) {
            if previous != gene {
                return Err(OmicsError::Integrity(format!(
                    "gene id \"{id}\" maps to several genes ({previous}, {gene})"
                )));
            }
        }
        if !triples.insert((study, id, gene)) {
            return Err(OmicsError::Integrity(format!(
                "duplicate record for study \"{study}\", gene id \"{id}\", gene \"{gene}\""
            )));
        }
    }
    Ok(())
}

/// Stacks sample columns into rows, dropping missing values.
pub fn to_long_format(table: &Table) -> Result<Table, OmicsError> {
    let study_col = integrity_column(table, STUDY_ID)?;
    let id_col = integrity_column(table, GENE_ID)?;
    let gene_col = integrity_column(table, GENE)?;
    let samples = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| ![study_col, id_col, gene_col].contains(i))
        .collect::<Vec<_>>();

    let mut long = Table::new(LONG_COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in table.rows() {
        for (index, sample) in &samples {
            let Some(value) = &row[*index] else {
                continue;
            };
            long.push_row(vec![
                row[study_col].clone(),
                row[id_col].clone(),
                row[gene_col].clone(),
                Some((*sample).clone()),
                Some(value.clone()),
            ])?;
        }
    }
    Ok(long)
}
