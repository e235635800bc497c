use std::time::Instant;

use crate::batch;
use crate::cache::{CacheKey, ResultCache};
use crate::cgds::{CgdsClient, Command};
use crate::config::{DEFAULT_BATCH_SIZE, Settings};
use crate::domain::{CaseListId, GeneticProfileId};
use crate::error::OmicsError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::retry::RetryPolicy;
use crate::table::Table;

/// A validated `getProfileData` request over a gene list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileQuery {
    pub case_list: CaseListId,
    pub profile: GeneticProfileId,
    /// Insertion order drives batch composition; the cache key ignores it.
    pub gene_ids: Vec<String>,
}

impl ProfileQuery {
    pub fn new<I, S>(case_list: &str, profile: &str, gene_ids: I) -> Result<Self, OmicsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let case_list: CaseListId = case_list.parse()?;
        let profile: GeneticProfileId = profile.parse()?;
        let gene_ids = gene_ids.into_iter().map(Into::into).collect::<Vec<String>>();
        Self::from_parts(case_list, profile, gene_ids)
    }

    pub fn from_parts(
        case_list: CaseListId,
        profile: GeneticProfileId,
        gene_ids: Vec<String>,
    ) -> Result<Self, OmicsError> {
        if gene_ids.is_empty() {
            return Err(OmicsError::Validation(
                "Gene IDs must be iterable and non-empty".to_string(),
            ));
        }
        if let Some(position) = gene_ids.iter().position(|gene| gene.trim().is_empty()) {
            return Err(OmicsError::Validation(format!(
                "gene id at position {position} is empty"
            )));
        }
        Ok(Self {
            case_list,
            profile,
            gene_ids,
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.case_list, &self.profile, &self.gene_ids)
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id_type", "gene_symbol".to_string()),
            ("case_set_id", self.case_list.to_string()),
            ("genetic_profile_id", self.profile.to_string()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub cache: Option<ResultCache>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            cache: None,
        }
    }
}

impl FetchOptions {
    pub fn from_settings(settings: &Settings, cache: Option<ResultCache>) -> Self {
        Self {
            batch_size: settings.batch_size,
            retry: settings.retry,
            cache,
        }
    }
}

/// One remote call wrapped in the retry policy.
pub fn fetch_with_retry<C: CgdsClient + ?Sized>(
    client: &C,
    command: Command,
    params: &[(&str, String)],
    policy: &RetryPolicy,
) -> Result<Table, OmicsError> {
    policy.run(command.as_str(), || client.query(command, params))
}

/// Fetches profile data batch by batch, concatenating in batch order.
///
/// With a cache configured, a stored result for the same key is returned
/// without any remote call, and a fresh result is stored before returning.
pub fn get_profile_data<C: CgdsClient + ?Sized>(
    client: &C,
    query: &ProfileQuery,
    options: &FetchOptions,
    sink: &dyn ProgressSink,
) -> Result<Table, OmicsError> {
    if options.batch_size == 0 {
        return Err(OmicsError::Validation("batch size must be at least 1".to_string()));
    }

    let key = options.cache.as_ref().map(|_| query.cache_key());
    if let (Some(cache), Some(key)) = (&options.cache, &key) {
        if let Some(table) = cache.load(key)? {
            return Ok(table);
        }
    }

    let batches = batch::split(&query.gene_ids, options.batch_size)?;
    let total = batches.len();
    let stride = batch::progress_stride(total);
    let start = Instant::now();

    let mut combined = Table::default();
    for (i, genes) in batches.into_iter().enumerate() {
        if i % stride == 0 {
            sink.event(ProgressEvent {
                message: format!("processing batch {} of {total}", i + 1),
                elapsed: Some(start.elapsed()),
            });
        }
        let mut params = query.base_params();
        params.push(("gene_list", genes.join(",")));
        let part = fetch_with_retry(client, Command::ProfileData, &params, &options.retry)?;
        combined.append(part);
    }

    if let (Some(cache), Some(key)) = (&options.cache, &key) {
        cache.store(
            key,
            &query.case_list,
            &query.profile,
            query.gene_ids.len(),
            &combined,
        )?;
    }
    Ok(combined)
}
