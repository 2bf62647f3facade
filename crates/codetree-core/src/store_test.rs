use chrono::TimeZone;

use super::*;
use crate::category::CategoryLink;
use crate::tree::build_tree;

const BASE: &str = "https://simplycodes.com";

fn link(title: &str, path: &str) -> CategoryLink {
    CategoryLink::from_href(title, path, BASE).unwrap()
}

fn coupon(code: &str, idx: usize) -> Coupon {
    Coupon::from_fields(Some("Foo"), Some(code), Some("10% off"), idx).unwrap()
}

#[test]
fn missing_artifacts_load_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    assert!(store.load_categories().unwrap().is_none());
    assert!(store.load_tree().unwrap().is_none());
    assert!(store.load_extracted_coupons().unwrap().is_none());
}

#[test]
fn categories_survive_a_save_load_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    let categories = vec![
        link("Makeup", "/category/beauty/makeup"),
        link("Lipstick", "/category/beauty/makeup/lipstick"),
    ];

    let path = store.save_categories(&categories).unwrap();
    assert_eq!(path, dir.path().join(DISCOVERED_CATEGORIES_FILE));
    assert_eq!(store.load_categories().unwrap(), Some(categories));
}

#[test]
fn write_creates_missing_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = DataStore::new(&nested);
    store.save_extracted_coupons(&[coupon("SAVE10", 0)]).unwrap();
    assert!(nested.join(EXTRACTED_COUPONS_FILE).is_file());
}

#[test]
fn write_replaces_previous_contents_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    store
        .save_extracted_coupons(&[coupon("OLD", 0), coupon("OLDER", 1)])
        .unwrap();
    store.save_extracted_coupons(&[coupon("NEW", 0)]).unwrap();

    let loaded = store.load_extracted_coupons().unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].code, "NEW");

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from(EXTRACTED_COUPONS_FILE)]);
}

#[test]
fn output_is_pretty_printed() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    let path = store.save_extracted_coupons(&[coupon("SAVE10", 0)]).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("[\n  {"));
    assert!(text.ends_with('\n'));
}

#[test]
fn corrupt_file_reports_json_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    std::fs::write(dir.path().join(CATEGORY_TREE_FILE), "{ not json").unwrap();

    let err = store.load_tree().unwrap_err();
    match err {
        StoreError::Json { path, .. } => {
            assert_eq!(path, dir.path().join(CATEGORY_TREE_FILE));
        }
        other => panic!("expected Json error, got {other:?}"),
    }
}

#[test]
fn tree_and_flat_coupons_persist_together() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    let makeup = link("Makeup", "/category/beauty/makeup");
    let scraped = vec![ScrapedCoupon::from_link(coupon("SAVE10", 0), &makeup)];
    let tree = build_tree(std::slice::from_ref(&makeup), &scraped);

    store.save_tree(&tree).unwrap();
    store.save_comprehensive_coupons(&scraped).unwrap();

    assert_eq!(store.load_tree().unwrap(), Some(tree));
    assert_eq!(store.load_comprehensive_coupons().unwrap(), Some(scraped));
}

#[test]
fn run_summary_serializes_timestamps_as_rfc3339() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    let summary = RunSummary {
        started_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        finished_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap(),
        categories_processed: 4,
        succeeded: 2,
        empty: 1,
        blocked: 1,
        timed_out: 0,
        failed: 0,
        coupons_collected: 17,
        tree_written: true,
    };

    let path = store.save_run_summary(&summary).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["started_at"], "2026-03-01T12:00:00Z");
    assert_eq!(value["coupons_collected"], 17);
    assert_eq!(store.read_json::<RunSummary>(RUN_SUMMARY_FILE).unwrap(), Some(summary));
}
