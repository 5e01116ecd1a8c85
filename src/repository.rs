//! JSON ad repository documents
//!
//! A repository is `{ "contents": [ { "data": "<json>" }, ... ] }` where each
//! `data` string is itself a JSON object describing one ad. Targeting lists
//! inside an ad are replaced by Base64 filters on build, and the verifier
//! pairs source and filtered rows by index.

use crate::builder::build_filter;
use crate::verifier::{check_filter, FalsePositiveReport};
use crate::{CuckooError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Targeting list keys and the keys their filters are stored under
pub const TARGETING_FIELDS: [(&str, &str); 3] = [
    ("excludes", "excludeFilter"),
    ("keywords", "keywordFilter"),
    ("apps", "appFilter"),
];

/// An ad repository document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub contents: Vec<Row>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// JSON-encoded ad record, absent on rows that carry no ad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Row {
    /// Decode `data` as an ad record.
    ///
    /// Rows whose data is missing, empty or not object shaped carry no
    /// targeting and yield `None`.
    pub fn ad_record(&self) -> Result<Option<Map<String, Value>>> {
        let Some(data) = self.data.as_deref().filter(|d| d.starts_with('{')) else {
            return Ok(None);
        };
        serde_json::from_str(data)
            .map(Some)
            .map_err(|e| CuckooError::InvalidArgument(format!("invalid ad record: {}", e)))
    }
}

/// Result of checking one targeting field of one row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub row: usize,
    pub field: &'static str,
    pub items: usize,
    pub false_positives: FalsePositiveReport,
}

impl Repository {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CuckooError::InvalidArgument(format!("invalid repository: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Read repository");
        Self::from_json(&text)
    }

    /// Pretty JSON with two space indentation
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CuckooError::InvalidArgument(format!("cannot encode repository: {}", e)))
    }
}

/// Read a targeting list from an ad record.
fn string_list(record: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>> {
    let Some(value) = record.get(key) else {
        return Ok(None);
    };
    let Value::Array(values) = value else {
        return Err(CuckooError::InvalidArgument(format!(
            "\"{}\" must be an array of strings",
            key
        )));
    };
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            other => Err(CuckooError::InvalidArgument(format!(
                "\"{}\" holds a non-string element {}",
                key, other
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Replace every targeting list in `repository` with a filter.
///
/// Each list gets its own filter sized for exactly its length. Rows without
/// an object shaped `data` string pass through untouched.
pub fn build_repository(repository: &Repository, target_fp_rate: f64) -> Result<Repository> {
    let mut output = repository.clone();
    let mut built = 0;
    for (index, row) in output.contents.iter_mut().enumerate() {
        let Some(mut record) = row.ad_record()? else {
            continue;
        };
        for (input_key, output_key) in TARGETING_FIELDS {
            let Some(items) = string_list(&record, input_key)? else {
                continue;
            };
            let filter = build_filter(&items, target_fp_rate, items.len())?;
            debug!(row = index, field = input_key, items = items.len(), "Replaced list with filter");
            record.insert(output_key.to_string(), Value::String(filter));
            record.shift_remove(input_key);
            built += 1;
        }
        let data = serde_json::to_string(&record)
            .map_err(|e| CuckooError::InvalidArgument(format!("cannot encode ad record: {}", e)))?;
        row.data = Some(data);
    }
    info!(rows = output.contents.len(), filters = built, "Built cuckoo filters");
    Ok(output)
}

/// Check every filter in `filtered` against the lists in `source`.
///
/// Rows are matched by index. A list present in a source row must have its
/// filter in the matching filtered row. Stops at the first failing field.
pub fn verify_repository<R: Rng + ?Sized>(
    source: &Repository,
    filtered: &Repository,
    target_fp_rate: f64,
    rng: &mut R,
) -> Result<Vec<FieldReport>> {
    let mut reports = Vec::new();
    verify_repository_with(source, filtered, target_fp_rate, rng, |report| {
        reports.push(report.clone())
    })?;
    Ok(reports)
}

/// Like [`verify_repository`], handing each passed field to `on_field` as
/// soon as it is checked.
pub fn verify_repository_with<R, F>(
    source: &Repository,
    filtered: &Repository,
    target_fp_rate: f64,
    rng: &mut R,
    mut on_field: F,
) -> Result<()>
where
    R: Rng + ?Sized,
    F: FnMut(&FieldReport),
{
    for (index, row) in source.contents.iter().enumerate() {
        let Some(record) = row.ad_record()? else {
            continue;
        };
        let filtered_row = filtered.contents.get(index).ok_or_else(|| {
            CuckooError::CorruptData(format!("filter file has no row {}", index))
        })?;
        let Some(filtered_record) = filtered_row.ad_record()? else {
            continue;
        };

        for (input_key, output_key) in TARGETING_FIELDS {
            let Some(items) = string_list(&record, input_key)? else {
                continue;
            };
            let serialized = filtered_record
                .get(output_key)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    CuckooError::CorruptData(format!(
                        "row {} has no \"{}\" filter for its \"{}\" list",
                        index, output_key, input_key
                    ))
                })?;
            let false_positives = check_filter(&items, serialized, target_fp_rate, rng)?;
            on_field(&FieldReport {
                row: index,
                field: input_key,
                items: items.len(),
                false_positives,
            });
        }
    }
    Ok(())
}
