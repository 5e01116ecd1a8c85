//! Matching ads against a request
//!
//! An ad may carry its targeting as raw lists, as filters, or both. A request
//! supplies a keyword and the set of apps installed on the device.

use crate::cuckoo::CuckooFilter;
use crate::serialize::from_base64;
use crate::{CuckooError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Targeting criteria of one ad
#[derive(Debug, Clone, Default)]
pub struct AdTargeting {
    pub keywords: Vec<String>,
    pub apps: Vec<String>,
    pub excludes: Vec<String>,
    pub keyword_filter: Option<CuckooFilter>,
    pub app_filter: Option<CuckooFilter>,
    pub exclude_filter: Option<CuckooFilter>,
}

/// Lowercase and trim a request keyword.
pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn read_list(record: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
    match record.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    CuckooError::InvalidArgument(format!("\"{}\" must hold strings", key))
                })
            })
            .collect(),
        Some(_) => Err(CuckooError::InvalidArgument(format!(
            "\"{}\" must be an array",
            key
        ))),
    }
}

fn read_filter(record: &Map<String, Value>, key: &str) -> Result<Option<CuckooFilter>> {
    match record.get(key) {
        None => Ok(None),
        Some(Value::String(text)) => from_base64(text).map(Some),
        Some(_) => Err(CuckooError::InvalidArgument(format!(
            "\"{}\" must be a Base64 string",
            key
        ))),
    }
}

impl AdTargeting {
    /// Parse the targeting keys of an ad record, ignoring everything else.
    pub fn from_data(data: &str) -> Result<Self> {
        let record: Map<String, Value> = serde_json::from_str(data)
            .map_err(|e| CuckooError::InvalidArgument(format!("invalid ad record: {}", e)))?;
        Ok(AdTargeting {
            keywords: read_list(&record, "keywords")?,
            apps: read_list(&record, "apps")?,
            excludes: read_list(&record, "excludes")?,
            keyword_filter: read_filter(&record, "keywordFilter")?,
            app_filter: read_filter(&record, "appFilter")?,
            exclude_filter: read_filter(&record, "excludeFilter")?,
        })
    }

    /// Does this ad apply to a request for `keyword` on a device with
    /// `installed_apps`?
    ///
    /// `keyword` is compared as given; pass it through [`normalize_keyword`]
    /// first. Every present criterion must hold.
    pub fn is_match(&self, keyword: &str, installed_apps: &HashSet<String>) -> bool {
        if !self.keywords.is_empty() && !self.keywords.iter().any(|k| k == keyword) {
            return false;
        }
        if !self.apps.is_empty() && !any_installed_in_list(&self.apps, installed_apps) {
            return false;
        }
        if !self.excludes.is_empty()
            && (self.excludes.iter().any(|e| e == keyword)
                || any_installed_in_list(&self.excludes, installed_apps))
        {
            return false;
        }
        if let Some(filter) = &self.keyword_filter {
            if !filter.contains(keyword) {
                return false;
            }
        }
        if let Some(filter) = &self.exclude_filter {
            if filter.contains(keyword) || any_installed_in_filter(filter, installed_apps) {
                return false;
            }
        }
        if let Some(filter) = &self.app_filter {
            if !any_installed_in_filter(filter, installed_apps) {
                return false;
            }
        }
        true
    }

    /// Is an installed app excluded by this ad?
    pub fn is_blocked(&self, installed_apps: &HashSet<String>) -> bool {
        self.exclude_filter
            .as_ref()
            .is_some_and(|filter| any_installed_in_filter(filter, installed_apps))
            || any_installed_in_list(&self.excludes, installed_apps)
    }
}

fn any_installed_in_list(list: &[String], installed_apps: &HashSet<String>) -> bool {
    list.iter().any(|app| installed_apps.contains(app))
}

fn any_installed_in_filter(filter: &CuckooFilter, installed_apps: &HashSet<String>) -> bool {
    installed_apps.iter().any(|app| filter.contains(app))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_filter;

    fn installed(apps: &[&str]) -> HashSet<String> {
        apps.iter().map(|a| a.to_string()).collect()
    }

    fn filtered_ad(keywords: &[&str], apps: &[&str], excludes: &[&str]) -> AdTargeting {
        let mut record = Map::new();
        for (key, items) in [
            ("keywordFilter", keywords),
            ("appFilter", apps),
            ("excludeFilter", excludes),
        ] {
            if !items.is_empty() {
                let filter = build_filter(items, 0.0001, items.len()).unwrap();
                record.insert(key.to_string(), Value::String(filter));
            }
        }
        AdTargeting::from_data(&Value::Object(record).to_string()).unwrap()
    }

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Shoes \n"), "shoes");
    }

    #[test]
    fn test_untargeted_ad_matches_everything() {
        let ad = AdTargeting::from_data("{\"text\": \"hello\"}").unwrap();
        assert!(ad.is_match("", &HashSet::new()));
        assert!(ad.is_match("shoes", &installed(&["com.example.a"])));
        assert!(!ad.is_blocked(&installed(&["com.example.a"])));
    }

    #[test]
    fn test_list_targeting() {
        let ad = AdTargeting::from_data(
            r#"{"keywords": ["shoes"], "apps": ["com.example.store"], "excludes": ["kids", "com.example.blocked"]}"#,
        )
        .unwrap();

        assert!(ad.is_match("shoes", &installed(&["com.example.store"])));
        assert!(!ad.is_match("hats", &installed(&["com.example.store"])));
        assert!(!ad.is_match("shoes", &installed(&["com.example.other"])));
        assert!(!ad.is_match("shoes", &HashSet::new()));
        assert!(!ad.is_match(
            "shoes",
            &installed(&["com.example.store", "com.example.blocked"])
        ));
        assert!(ad.is_blocked(&installed(&["com.example.blocked"])));
    }

    #[test]
    fn test_filter_targeting() {
        let ad = filtered_ad(&["shoes", "boots"], &["com.example.store"], &[]);

        assert!(ad.is_match("boots", &installed(&["com.example.store"])));
        assert!(!ad.is_match("boots", &installed(&["com.example.other"])));
        assert!(!ad.is_match("boots", &HashSet::new()));
    }

    #[test]
    fn test_exclude_filter() {
        let ad = filtered_ad(&[], &[], &["kids", "com.example.blocked"]);

        assert!(!ad.is_match("kids", &HashSet::new()));
        assert!(!ad.is_match("shoes", &installed(&["com.example.blocked"])));
        assert!(ad.is_blocked(&installed(&["com.example.blocked"])));
        assert!(!ad.is_blocked(&HashSet::new()));
    }

    #[test]
    fn test_rejects_bad_targeting() {
        assert!(AdTargeting::from_data("{\"keywords\": \"shoes\"}").is_err());
        assert!(AdTargeting::from_data("{\"appFilter\": 7}").is_err());
        assert!(matches!(
            AdTargeting::from_data("{\"appFilter\": \"!!\"}"),
            Err(CuckooError::CorruptData(_))
        ));
    }
}
