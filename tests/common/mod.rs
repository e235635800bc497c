#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use kira_omics_agg::cgds::{CgdsClient, Command};
use kira_omics_agg::error::OmicsError;
use kira_omics_agg::progress::{ProgressEvent, ProgressSink};
use kira_omics_agg::table::Table;

#[derive(Debug, Clone)]
pub struct Call {
    pub command: Command,
    pub params: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory cBioPortal: studies, their profiles and per-profile samples.
/// Profile rows are `GENE_ID = "ID-<gene>"`, `COMMON = <gene>` and one
/// `<gene>:<sample>` value per sample.
#[derive(Default)]
pub struct MockCgds {
    pub studies: Vec<String>,
    pub profiles: HashMap<String, Vec<String>>,
    pub samples: HashMap<String, Vec<String>>,
    pub failures_before_success: Mutex<u32>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockCgds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_study(mut self, study: &str, profiles: &[&str]) -> Self {
        self.studies.push(study.to_string());
        self.profiles.insert(
            study.to_string(),
            profiles.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn with_samples(mut self, profile: &str, samples: &[&str]) -> Self {
        self.samples.insert(
            profile.to_string(),
            samples.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn failing(self, times: u32) -> Self {
        *self.failures_before_success.lock().unwrap() = times;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: Command) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.command == command)
            .count()
    }

    fn profile_data(&self, profile: &str, genes: &str) -> Table {
        let samples = self.samples.get(profile).cloned().unwrap_or_default();
        let mut columns = vec!["GENE_ID".to_string(), "COMMON".to_string()];
        columns.extend(samples.iter().cloned());
        let mut table = Table::new(columns);
        if samples.is_empty() {
            return table;
        }
        for gene in genes.split(',') {
            let mut row = vec![Some(format!("ID-{gene}")), Some(gene.to_string())];
            row.extend(samples.iter().map(|s| Some(format!("{gene}:{s}"))));
            table.push_row(row).unwrap();
        }
        table
    }
}

impl CgdsClient for MockCgds {
    fn query(&self, command: Command, params: &[(&str, String)]) -> Result<Table, OmicsError> {
        let call = Call {
            command,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        self.calls.lock().unwrap().push(call.clone());

        match command {
            Command::CancerStudies => {
                let mut table = Table::new(vec!["cancer_study_id".into(), "name".into()]);
                for study in &self.studies {
                    table
                        .push_row(vec![Some(study.clone()), Some(study.to_uppercase())])
                        .unwrap();
                }
                Ok(table)
            }
            Command::GeneticProfiles => {
                let study = call.param("cancer_study_id").unwrap_or_default();
                let mut table = Table::new(vec!["genetic_profile_id".into()]);
                for profile in self.profiles.get(study).cloned().unwrap_or_default() {
                    table.push_row(vec![Some(profile)]).unwrap();
                }
                Ok(table)
            }
            Command::ProfileData => {
                let mut failures = self.failures_before_success.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(OmicsError::CgdsHttp("connection reset by peer".to_string()));
                }
                let profile = call.param("genetic_profile_id").unwrap_or_default();
                let genes = call.param("gene_list").unwrap_or_default();
                Ok(self.profile_data(profile, genes))
            }
            other => Err(OmicsError::CgdsHttp(format!("{other} not mocked"))),
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

pub fn genes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("GENE{i:03}")).collect()
}
