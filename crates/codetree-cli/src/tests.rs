use super::*;

use codetree_core::{CategoryLink, DataStore};
use codetree_scraper::testing::{coupon_block, coupon_page, FakePage, FakeSession};
use codetree_scraper::{CategoryRun, CategoryStats, ScrapeSettings};

const BASE: &str = "https://simplycodes.com";
const ROOT: &str = "https://simplycodes.com/category";
const MAKEUP: &str = "https://simplycodes.com/category/beauty/makeup";

fn link(path: &str) -> CategoryLink {
    CategoryLink::from_href("Category", path, BASE).expect("valid category href")
}

#[test]
fn parses_discover_tree_command() {
    let cli = Cli::try_parse_from(["codetree", "discover-tree"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::DiscoverTree { deep: false }
    ));
}

#[test]
fn parses_discover_tree_deep_flag() {
    let cli = Cli::try_parse_from(["codetree", "discover-tree", "--deep"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::DiscoverTree { deep: true }));
}

#[test]
fn scrape_single_defaults_to_makeup_page() {
    let cli = Cli::try_parse_from(["codetree", "scrape-single"]).expect("expected valid cli args");
    match cli.command {
        Commands::ScrapeSingle { url, no_retry } => {
            assert_eq!(url, DEFAULT_CATEGORY_URL);
            assert!(!no_retry);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn scrape_single_accepts_url_and_no_retry() {
    let cli = Cli::try_parse_from([
        "codetree",
        "scrape-single",
        "--url",
        "https://simplycodes.com/category/home/kitchen",
        "--no-retry",
    ])
    .expect("expected valid cli args");
    match cli.command {
        Commands::ScrapeSingle { url, no_retry } => {
            assert_eq!(url, "https://simplycodes.com/category/home/kitchen");
            assert!(no_retry);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn comprehensive_defaults() {
    let cli = Cli::try_parse_from(["codetree", "comprehensive"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Comprehensive {
            max_categories: None,
            rediscover: false,
            no_tree: false,
            deep: false
        }
    ));
}

#[test]
fn comprehensive_with_all_flags() {
    let cli = Cli::try_parse_from([
        "codetree",
        "comprehensive",
        "--max-categories",
        "5",
        "--rediscover",
        "--no-tree",
        "--deep",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Comprehensive {
            max_categories: Some(5),
            rediscover: true,
            no_tree: true,
            deep: true
        }
    ));
}

#[test]
fn comprehensive_rejects_non_numeric_max() {
    let result = Cli::try_parse_from(["codetree", "comprehensive", "--max-categories", "all"]);
    assert!(result.is_err());
}

#[test]
fn validate_defaults_to_first_coupon() {
    let cli = Cli::try_parse_from(["codetree", "validate"]).expect("expected valid cli args");
    match cli.command {
        Commands::Validate { index, url } => {
            assert_eq!(index, 0);
            assert_eq!(url, DEFAULT_CATEGORY_URL);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn validate_accepts_index() {
    let cli = Cli::try_parse_from(["codetree", "validate", "--index", "3"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Validate { index: 3, .. }));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["codetree"]).is_err());
}

#[test]
fn select_categories_truncates_in_discovery_order() {
    let categories = vec![
        link("/category/beauty/makeup"),
        link("/category/beauty/skincare"),
        link("/category/home/kitchen"),
    ];

    let selected = crawl::select_categories(&categories, Some(2));
    let paths: Vec<_> = selected.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, ["/category/beauty/makeup", "/category/beauty/skincare"]);
}

#[test]
fn select_categories_keeps_all_when_max_exceeds_len() {
    let categories = vec![link("/category/beauty/makeup")];
    assert_eq!(crawl::select_categories(&categories, Some(10)).len(), 1);
    assert_eq!(crawl::select_categories(&categories, None).len(), 1);
    assert!(crawl::select_categories(&categories, Some(0)).is_empty());
}

#[test]
fn run_summary_copies_stats() {
    let started_at = chrono::Utc::now();
    let run = CategoryRun {
        coupons: Vec::new(),
        stats: CategoryStats {
            processed: 4,
            succeeded: 1,
            empty: 1,
            blocked: 1,
            timed_out: 1,
            failed: 0,
            coupons: 0,
        },
    };

    let summary = crawl::run_summary(started_at, &run, true);
    assert_eq!(summary.started_at, started_at);
    assert!(summary.finished_at >= started_at);
    assert_eq!(summary.categories_processed, 4);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.blocked, 1);
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.coupons_collected, 0);
    assert!(summary.tree_written);
}

fn root_page() -> FakePage {
    let html = r#"<html><body>
        <div class="flex flex-row items-center justify-between rounded-16">
          <div class="title"><a href="/category/beauty/makeup">Makeup</a></div>
        </div>
        <div class="overflow-hidden">
          <ul class="ml-6 gap-4 flex flex-col pb-12">
            <li><a href="/category/beauty/makeup/lipstick">Lipstick</a></li>
          </ul>
        </div>
    </body></html>"#;
    FakePage::new("All Categories | SimplyCodes", html)
}

fn seeded_store(dir: &std::path::Path) -> (DataStore, Vec<CategoryLink>) {
    let store = DataStore::new(dir);
    let categories = vec![link("/category/home/kitchen")];
    discover::persist_discovery(&store, &categories)
        .expect("seed artifacts")
        .expect("non-empty discovery writes artifacts");
    (store, categories)
}

#[tokio::test]
async fn blocked_root_keeps_previous_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let (store, previous) = seeded_store(dir.path());
    let tree_before = store.load_tree().unwrap();

    let settings = ScrapeSettings::immediate(BASE);
    let mut session = FakeSession::new().page(ROOT, FakePage::forbidden());
    let categories = discover::discover_categories(&mut session, &settings, false).await;
    assert!(categories.is_empty());

    let written = discover::persist_discovery(&store, &categories).unwrap();
    assert!(written.is_none());
    assert_eq!(store.load_categories().unwrap(), Some(previous));
    assert_eq!(store.load_tree().unwrap(), tree_before);
}

#[tokio::test]
async fn discovery_persists_categories_and_tree() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    let settings = ScrapeSettings::immediate(BASE);
    let mut session = FakeSession::new().page(ROOT, root_page());

    let categories = discover::discover_categories(&mut session, &settings, false).await;
    let artifacts = discover::persist_discovery(&store, &categories)
        .unwrap()
        .expect("artifacts written");

    assert_eq!(artifacts.categories, 2);
    assert_eq!(artifacts.level2, 1);
    assert_eq!(artifacts.level3, 1);
    assert_eq!(artifacts.top_level, 1);
    assert_eq!(artifacts.subcategories, 2);
    assert_eq!(store.load_categories().unwrap(), Some(categories));
}

#[tokio::test]
async fn comprehensive_with_blocked_root_collects_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (store, previous) = seeded_store(dir.path());

    let settings = ScrapeSettings::immediate(BASE);
    let mut session = FakeSession::new().page(ROOT, FakePage::forbidden());
    let options = crawl::ComprehensiveOptions {
        rediscover: true,
        build_tree: true,
        ..crawl::ComprehensiveOptions::default()
    };

    let collected = crawl::collect(&mut session, &settings, None, &options).await;
    assert!(collected.is_none());
    assert_eq!(session.navigations(), &[ROOT]);
    assert_eq!(store.load_categories().unwrap(), Some(previous));
    assert!(store.load_comprehensive_coupons().unwrap().is_none());
}

#[tokio::test]
async fn comprehensive_from_persisted_categories_skips_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    let persisted = vec![link("/category/beauty/makeup")];
    let page = coupon_page(&[coupon_block(Some("Foo"), Some("SAVE10"), Some("10% off"))]);

    let settings = ScrapeSettings::immediate(BASE);
    let mut session = FakeSession::new().page(MAKEUP, FakePage::new("Makeup", page));
    let options = crawl::ComprehensiveOptions {
        build_tree: true,
        ..crawl::ComprehensiveOptions::default()
    };

    let collected = crawl::collect(&mut session, &settings, Some(persisted), &options)
        .await
        .expect("categories to scrape");
    assert!(!collected.fresh);
    assert_eq!(session.navigations(), &[MAKEUP]);

    let started_at = chrono::Utc::now();
    let artifacts = crawl::persist_crawl(&store, &collected, true, started_at).unwrap();
    assert_eq!(artifacts.summary.coupons_collected, 1);
    assert!(artifacts.summary.tree_written);
    assert!(store.load_categories().unwrap().is_none());

    let tree = store.load_tree().unwrap().expect("tree written");
    let coupons = tree.coupons_at("/category/beauty/makeup").expect("makeup node");
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].code, "SAVE10");
}

#[test]
fn deep_forces_rediscovery() {
    let plain = crawl::ComprehensiveOptions::default();
    assert!(!plain.rediscovers());

    let deep = crawl::ComprehensiveOptions {
        deep: true,
        ..crawl::ComprehensiveOptions::default()
    };
    assert!(deep.rediscovers());

    let rediscover = crawl::ComprehensiveOptions {
        rediscover: true,
        ..crawl::ComprehensiveOptions::default()
    };
    assert!(rediscover.rediscovers());
}
