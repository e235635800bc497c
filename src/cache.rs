use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::Builder;
use tracing::info;

use crate::domain::{CaseListId, GeneticProfileId};
use crate::error::OmicsError;
use crate::table::Table;

pub const CACHE_EXTENSION: &str = "json";

/// Deterministic key of a profile query: the gene set is sorted and
/// deduplicated, so gene order never changes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    normalized: String,
    digest: String,
}

impl CacheKey {
    pub fn new(case_list: &CaseListId, profile: &GeneticProfileId, gene_ids: &[String]) -> Self {
        let genes = gene_ids
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
            .join(",");
        let normalized = format!("{case_list}:{profile}:{genes}");
        let digest = hex::encode(Sha256::digest(normalized.as_bytes()));
        Self { normalized, digest }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub case_list_id: String,
    pub genetic_profile_id: String,
    pub gene_count: usize,
    pub created_at: String,
    pub table: Table,
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    key: &'a str,
    case_list_id: &'a str,
    genetic_profile_id: &'a str,
    gene_count: usize,
    created_at: String,
    table: &'a Table,
}

/// Flat directory of `<digest>.json` entries. Entries are never expired.
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: Utf8PathBuf,
}

impl ResultCache {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn from_path(path: &Path) -> Result<Self, OmicsError> {
        let root = Utf8PathBuf::from_path_buf(path.to_path_buf())
            .map_err(|_| OmicsError::Filesystem("invalid cache path".to_string()))?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn entry_path(&self, key: &CacheKey) -> Utf8PathBuf {
        self.root.join(format!("{}.{CACHE_EXTENSION}", key.digest()))
    }

    pub fn load(&self, key: &CacheKey) -> Result<Option<Table>, OmicsError> {
        let path = self.entry_path(key);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read(path.as_std_path())
            .map_err(|err| OmicsError::Cache(format!("read {path}: {err}")))?;
        let entry: CacheEntry = serde_json::from_slice(&content)
            .map_err(|err| OmicsError::Cache(format!("corrupt entry {path}: {err}")))?;
        if entry.key != key.normalized() {
            return Err(OmicsError::Cache(format!(
                "entry {path} belongs to a different query ({})",
                entry.key
            )));
        }
        info!(path = %path, "using batch profile data result from cache");
        Ok(Some(entry.table))
    }

    pub fn store(
        &self,
        key: &CacheKey,
        case_list: &CaseListId,
        profile: &GeneticProfileId,
        gene_count: usize,
        table: &Table,
    ) -> Result<Utf8PathBuf, OmicsError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| OmicsError::Filesystem(err.to_string()))?;
        let path = self.entry_path(key);
        let entry = CacheEntryRef {
            key: key.normalized(),
            case_list_id: case_list.as_str(),
            genetic_profile_id: profile.as_str(),
            gene_count,
            created_at: chrono::Utc::now().to_rfc3339(),
            table,
        };
        let content =
            serde_json::to_vec(&entry).map_err(|err| OmicsError::Cache(err.to_string()))?;

        let mut temp = Builder::new()
            .prefix("kira-omics-entry")
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| OmicsError::Filesystem(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| OmicsError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| OmicsError::Filesystem(err.to_string()))?;

        info!(
            case_list = %case_list,
            profile_id = %profile,
            path = %path,
            "stored CGDS result in cache"
        );
        Ok(path)
    }
}
