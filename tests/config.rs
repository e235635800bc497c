use std::time::Duration;

use assert_matches::assert_matches;
use kira_omics_agg::config::{Config, ConfigLoader, DEFAULT_CGDS_BASE_URL};
use kira_omics_agg::error::OmicsError;

#[test]
fn parse_config_overrides() {
    let config: Config = serde_json::from_str(
        r#"{ "batch_size": 25, "retry_pause_secs": 0, "study_marker": "ccle" }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.batch_size, 25);
    assert_eq!(resolved.retry.pause, Duration::ZERO);
    assert_eq!(resolved.retry.max_retries, 5);
    assert_eq!(resolved.study_marker, "ccle");
    assert_eq!(resolved.cgds_base_url, DEFAULT_CGDS_BASE_URL);
}

#[test]
fn zero_batch_size_rejected() {
    let config = Config {
        batch_size: Some(0),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(OmicsError::Validation(_))
    );
}

#[test]
fn hpa_template_needs_placeholder() {
    let config = Config {
        hpa_url_template: Some("http://example.org/proteinatlas.tab.gz".to_string()),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(OmicsError::Validation(_))
    );
}

#[test]
fn explicit_missing_file_is_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, OmicsError::ConfigRead(_));
}

#[test]
fn malformed_file_is_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-omics.json");
    std::fs::write(&path, "{ batch_size: ").unwrap();
    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, OmicsError::ConfigParse(_));
}
