//! cBioPortal (CGDS) web-service commands.
//!
//! Every command is a GET of `base_url + "cmd=<command>&k=v..."` answering
//! with a tab-separated table whose `#` lines are comments.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::config::Settings;
use crate::domain::{CaseListId, StudyId};
use crate::error::OmicsError;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CancerStudies,
    TypesOfCancer,
    GeneticProfiles,
    CaseLists,
    ClinicalData,
    ProfileData,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::CancerStudies => "getCancerStudies",
            Command::TypesOfCancer => "getTypesOfCancer",
            Command::GeneticProfiles => "getGeneticProfiles",
            Command::CaseLists => "getCaseLists",
            Command::ClinicalData => "getClinicalData",
            Command::ProfileData => "getProfileData",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One blocking remote call per `query`; retrying is the caller's concern.
pub trait CgdsClient: Send + Sync {
    fn query(&self, command: Command, params: &[(&str, String)]) -> Result<Table, OmicsError>;
}

#[derive(Clone)]
pub struct CgdsHttpClient {
    client: Client,
    base_url: String,
}

impl CgdsHttpClient {
    pub fn new(settings: &Settings) -> Result<Self, OmicsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-omics-agg/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OmicsError::CgdsHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.http_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| OmicsError::CgdsHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.cgds_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl CgdsClient for CgdsHttpClient {
    fn query(&self, command: Command, params: &[(&str, String)]) -> Result<Table, OmicsError> {
        let url = to_url(&self.base_url, command, params);
        debug!(%url, "invoking cBioPortal endpoint");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| OmicsError::CgdsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "cBioPortal request failed".to_string());
            return Err(OmicsError::CgdsStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| OmicsError::CgdsHttp(err.to_string()))?;
        parse_response(&body)
    }
}

/// Builds the request URL, keeping parameter order and values verbatim.
pub fn to_url(base_url: &str, command: Command, params: &[(&str, String)]) -> String {
    let mut url = format!("{base_url}cmd={}", command.as_str());
    for (key, value) in params {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.push_str(value);
    }
    url
}

/// The service reports some failures as a plain-text body with status 200.
pub fn parse_response(body: &str) -> Result<Table, OmicsError> {
    let first = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'));
    if let Some(line) = first {
        if line.starts_with("Error") {
            return Err(OmicsError::Parse(line.to_string()));
        }
    }
    Table::parse_commented_tsv(body)
}

pub fn cancer_studies<C: CgdsClient + ?Sized>(client: &C) -> Result<Table, OmicsError> {
    client.query(Command::CancerStudies, &[])
}

pub fn cancer_types<C: CgdsClient + ?Sized>(client: &C) -> Result<Table, OmicsError> {
    client.query(Command::TypesOfCancer, &[])
}

pub fn genetic_profiles<C: CgdsClient + ?Sized>(
    client: &C,
    study: &StudyId,
) -> Result<Table, OmicsError> {
    client.query(
        Command::GeneticProfiles,
        &[("cancer_study_id", study.to_string())],
    )
}

pub fn case_lists<C: CgdsClient + ?Sized>(
    client: &C,
    study: &StudyId,
) -> Result<Table, OmicsError> {
    client.query(Command::CaseLists, &[("cancer_study_id", study.to_string())])
}

pub fn clinical_data<C: CgdsClient + ?Sized>(
    client: &C,
    case_list: &CaseListId,
) -> Result<Table, OmicsError> {
    client.query(Command::ClinicalData, &[("case_set_id", case_list.to_string())])
}

/// Distinct non-missing values of `column`, in first-seen order.
pub fn unique_values(table: &Table, column: &str) -> Result<Vec<String>, OmicsError> {
    let index = table.require_column(column)?;
    let mut seen = std::collections::HashSet::new();
    let mut values = Vec::new();
    for row in table.rows() {
        if let Some(value) = &row[index] {
            if seen.insert(value.as_str()) {
                values.push(value.clone());
            }
        }
    }
    Ok(values)
}
