use std::collections::HashMap;
use std::sync::Mutex;

use assert_matches::assert_matches;

use kira_omics_agg::config::{DEFAULT_HPA_URL_TEMPLATE, Settings};
use kira_omics_agg::error::OmicsError;
use kira_omics_agg::hpa::{
    HpaClient, PROTEIN_CLASS, PROTEIN_CLASSES, VERSION, filter_by_protein_class, get_hpa_data,
    hpa_url, prepare_hpa_data, select_genes,
};
use kira_omics_agg::table::Table;

#[derive(Default)]
struct MockHpa {
    releases: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl MockHpa {
    fn with_release(mut self, version: u32, tsv: &str) -> Self {
        self.releases
            .insert(hpa_url(DEFAULT_HPA_URL_TEMPLATE, version), tsv.to_string());
        self
    }
}

impl HpaClient for MockHpa {
    fn fetch_table(&self, url: &str) -> Result<Table, OmicsError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.releases.get(url) {
            Some(tsv) => Table::parse_tsv(tsv),
            None => Err(OmicsError::HpaStatus {
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }
}

const RELEASE_16: &str = "Gene\tEnsembl\tProtein class\n\
TP53\tENSG00000141510\tCancer-related genes, Disease related genes (Uhlen 2015)\n\
EGFR\tENSG00000146648\tFDA approved drug targets,Enzymes,Cancer-related genes\n\
ALB\tENSG00000163631\tPlasma proteins\n\
ORPHAN\tENSG00000000001\t\n";

const RELEASE_15: &str = "Gene\tEnsembl\tProtein class\n\
CD4\tENSG00000010610\tCD markers, Predicted membrane proteins\n";

#[test]
fn releases_are_stacked_with_version() {
    let client = MockHpa::default()
        .with_release(16, RELEASE_16)
        .with_release(15, RELEASE_15);

    let table = get_hpa_data(&client, DEFAULT_HPA_URL_TEMPLATE, &[16, 15]).unwrap();

    assert_eq!(table.len(), 5);
    let versions = table.column(VERSION).unwrap().collect::<Vec<_>>();
    assert_eq!(
        versions,
        vec![Some("16"), Some("16"), Some("16"), Some("16"), Some("15")]
    );
    assert_eq!(
        client.requested.lock().unwrap().clone(),
        vec![
            "http://v16.proteinatlas.org/download/proteinatlas.tab.gz".to_string(),
            "http://v15.proteinatlas.org/download/proteinatlas.tab.gz".to_string(),
        ]
    );
}

#[test]
fn failed_release_names_version_and_url() {
    let client = MockHpa::default().with_release(16, RELEASE_16);
    let err = get_hpa_data(&client, DEFAULT_HPA_URL_TEMPLATE, &[16, 3]).unwrap_err();
    assert_matches!(
        err,
        OmicsError::HpaStatus { status: 404, message }
            if message.contains("version 3") && message.contains("v3.proteinatlas.org")
    );
}

#[test]
fn empty_version_list_rejected() {
    let client = MockHpa::default();
    assert_matches!(
        get_hpa_data(&client, DEFAULT_HPA_URL_TEMPLATE, &[]),
        Err(OmicsError::Validation(_))
    );
}

#[test]
fn prepare_cleans_and_sorts_classes() {
    let raw = Table::parse_tsv(RELEASE_16).unwrap();
    let prepared = prepare_hpa_data(raw).unwrap();

    assert!(prepared.column_index(PROTEIN_CLASS).is_none());
    assert_eq!(prepared.columns(), ["Gene", "Ensembl", PROTEIN_CLASSES]);
    let classes = prepared.column(PROTEIN_CLASSES).unwrap().collect::<Vec<_>>();
    assert_eq!(
        classes,
        vec![
            Some("Cancer-related genes,Disease related genes"),
            Some("Cancer-related genes,Enzymes,FDA approved drug targets"),
            Some("Plasma proteins"),
            None,
        ]
    );
}

#[test]
fn prepare_requires_protein_class() {
    let raw = Table::parse_tsv("Gene\tEnsembl\nTP53\tENSG00000141510\n").unwrap();
    assert_matches!(prepare_hpa_data(raw), Err(OmicsError::Validation(_)));
}

#[test]
fn filter_keeps_any_matching_class() {
    let prepared = prepare_hpa_data(Table::parse_tsv(RELEASE_16).unwrap()).unwrap();
    let filtered = filter_by_protein_class(&prepared, &["Enzymes", "Plasma proteins"]).unwrap();
    let genes = filtered.column("Gene").unwrap().collect::<Vec<_>>();
    assert_eq!(genes, vec![Some("EGFR"), Some("ALB")]);
}

#[test]
fn filter_rejects_unknown_class() {
    let prepared = prepare_hpa_data(Table::parse_tsv(RELEASE_16).unwrap()).unwrap();
    assert_matches!(
        filter_by_protein_class(&prepared, &["Enzymes", "Transcription factors"]),
        Err(OmicsError::Validation(message)) if message.contains("Transcription factors")
    );
}

#[test]
fn filter_requires_prepared_table() {
    let raw = Table::parse_tsv(RELEASE_16).unwrap();
    assert_matches!(
        filter_by_protein_class(&raw, &["Enzymes"]),
        Err(OmicsError::Validation(_))
    );
}

#[test]
fn select_genes_uses_selected_classes() {
    let client = MockHpa::default()
        .with_release(16, RELEASE_16)
        .with_release(15, RELEASE_15);
    let settings = Settings::default();

    let selected = select_genes(&client, &settings, &[16, 15]).unwrap();

    let genes = selected.column("Gene").unwrap().collect::<Vec<_>>();
    assert_eq!(genes, vec![Some("TP53"), Some("EGFR"), Some("CD4")]);
    assert!(selected.column_index(VERSION).is_some());
}
