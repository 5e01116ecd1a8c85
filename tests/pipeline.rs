use std::fs;

use cuckoo_targeting::repository::{build_repository, verify_repository, Repository};
use cuckoo_targeting::verifier::validate_target_fp_rate;
use cuckoo_targeting::{AdTargeting, CuckooError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::HashSet;

/// Write an ad repository with `rows` ads, each targeting a handful of
/// keywords and apps, to a temporary file.
fn write_repository(dir: &tempfile::TempDir, rows: usize) -> std::path::PathBuf {
    let contents: Vec<_> = (0..rows)
        .map(|i| {
            let keywords: Vec<String> = (0..20).map(|k| format!("keyword{}-{}", i, k)).collect();
            let apps: Vec<String> = (0..5).map(|a| format!("com.example.app{}.{}", i, a)).collect();
            let data = json!({
                "max_cpc": 0.5 + i as f64,
                "keywords": keywords,
                "apps": apps,
                "excludes": ["kids"],
                "landingPage": format!("https://example.com/{}", i),
            });
            json!({ "key": format!("ad{}", i), "data": data.to_string() })
        })
        .collect();
    let document = json!({ "contents": contents });

    let path = dir.path().join("ads.json");
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    path
}

#[test]
fn test_build_then_verify_files() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_repository(&dir, 4);

    let source = Repository::from_path(&source_path).unwrap();
    let built = build_repository(&source, 0.01).unwrap();
    let output_path = dir.path().join("filters.json");
    fs::write(&output_path, built.to_json_pretty().unwrap()).unwrap();

    let filtered = Repository::from_path(&output_path).unwrap();
    assert_eq!(filtered, built);

    let mut rng = StdRng::seed_from_u64(1);
    let reports = verify_repository(&source, &filtered, 0.01, &mut rng).unwrap();
    assert_eq!(reports.len(), 12);
    for report in &reports {
        assert!(report.false_positives.relative_difference <= 0.05);
    }
}

#[test]
fn test_output_is_two_space_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    let source = Repository::from_path(write_repository(&dir, 1)).unwrap();
    let output = build_repository(&source, 0.01)
        .unwrap()
        .to_json_pretty()
        .unwrap();

    assert!(output.starts_with("{\n  \"contents\": [\n    {\n"));
    assert!(!output.contains("\"keywords\""));
    assert!(output.contains("keywordFilter"));
}

#[test]
fn test_built_ads_still_match() {
    let dir = tempfile::tempdir().unwrap();
    let source = Repository::from_path(write_repository(&dir, 2)).unwrap();
    let built = build_repository(&source, 0.001).unwrap();

    let installed: HashSet<String> = ["com.example.app1.3".to_string()].into_iter().collect();
    let ad = AdTargeting::from_data(built.contents[1].data.as_deref().unwrap()).unwrap();
    assert!(ad.keywords.is_empty());
    assert!(ad.is_match("keyword1-7", &installed));
    assert!(!ad.is_match("kids", &installed));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Repository::from_path(dir.path().join("missing.json")),
        Err(CuckooError::Io(_))
    ));
}

#[test]
fn test_rate_precheck() {
    assert!(validate_target_fp_rate(0.5).is_ok());
    assert!(validate_target_fp_rate(0.5f64.powi(16)).is_ok());
    assert!(matches!(
        validate_target_fp_rate(0.51),
        Err(CuckooError::InvalidArgument(_))
    ));
    assert!(matches!(
        validate_target_fp_rate(0.5f64.powi(17)),
        Err(CuckooError::InvalidArgument(_))
    ));
}
