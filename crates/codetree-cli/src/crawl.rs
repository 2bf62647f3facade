use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use codetree_core::{build_tree, AppConfig, CategoryLink, DataStore, RunSummary};
use codetree_scraper::{
    scrape_categories, BrowserSession, CategoryRun, CouponExtractor, OutcomeKind, RetryPolicy,
    ScrapeSettings,
};

use crate::discover::discover_categories;
use crate::session;

#[derive(Debug, Clone, Default)]
pub(crate) struct ComprehensiveOptions {
    pub(crate) max_categories: Option<usize>,
    pub(crate) rediscover: bool,
    pub(crate) build_tree: bool,
    pub(crate) deep: bool,
}

impl ComprehensiveOptions {
    /// Deep discovery only happens on a fresh discovery, so `--deep` forces one.
    pub(crate) fn rediscovers(&self) -> bool {
        self.rediscover || self.deep
    }
}

/// Everything the category loop produced, ready to persist.
#[derive(Debug)]
pub(crate) struct Collected {
    pub(crate) categories: Vec<CategoryLink>,
    /// `categories` came from discovery in this run rather than from disk.
    pub(crate) fresh: bool,
    /// How many leading entries of `categories` were scraped.
    pub(crate) selected: usize,
    pub(crate) run: CategoryRun,
}

/// What `comprehensive` wrote.
#[derive(Debug)]
pub(crate) struct CrawlArtifacts {
    pub(crate) coupons_path: PathBuf,
    pub(crate) tree_path: Option<PathBuf>,
    pub(crate) summary: RunSummary,
}

pub(crate) async fn run_scrape_single(
    config: &AppConfig,
    url: &str,
    no_retry: bool,
) -> anyhow::Result<()> {
    let settings = ScrapeSettings::from_config(config);
    let store = DataStore::new(&config.data_dir);
    let policy = if no_retry {
        RetryPolicy::single()
    } else {
        settings.retry
    };

    let mut session = session::acquire(config).await?;
    let report = CouponExtractor::new(&mut session, &settings)
        .scrape_with_retry(url, &policy)
        .await;
    session.release().await;

    let kind = report.outcome.kind();
    let attempts = report.attempts;
    let coupons = report.outcome.into_coupons();
    if kind != OutcomeKind::Succeeded {
        tracing::warn!(url, outcome = %kind, attempts, "no coupons extracted");
    }

    let path = store
        .save_extracted_coupons(&coupons)
        .context("failed to save extracted coupons")?;
    println!(
        "{url}: {kind} after {attempts} attempt(s), {} coupons",
        coupons.len()
    );
    println!("coupons: {}", path.display());
    Ok(())
}

/// Categories to scrape: persisted ones unless `rediscover` is set or none
/// can be read.
fn load_persisted(store: &DataStore, rediscover: bool) -> Option<Vec<CategoryLink>> {
    if rediscover {
        return None;
    }
    match store.load_categories() {
        Ok(Some(categories)) if !categories.is_empty() => {
            tracing::info!(count = categories.len(), "using persisted categories");
            Some(categories)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "persisted categories unreadable, rediscovering");
            None
        }
    }
}

/// The first `max` categories in discovery order, or all of them.
pub(crate) fn select_categories(
    categories: &[CategoryLink],
    max: Option<usize>,
) -> &[CategoryLink] {
    match max {
        Some(max) if max < categories.len() => &categories[..max],
        _ => categories,
    }
}

pub(crate) fn run_summary(
    started_at: DateTime<Utc>,
    run: &CategoryRun,
    tree_written: bool,
) -> RunSummary {
    let stats = run.stats;
    RunSummary {
        started_at,
        finished_at: Utc::now(),
        categories_processed: stats.processed,
        succeeded: stats.succeeded,
        empty: stats.empty,
        blocked: stats.blocked,
        timed_out: stats.timed_out,
        failed: stats.failed,
        coupons_collected: run.coupons.len(),
        tree_written,
    }
}

/// Resolves the categories to scrape and runs the category loop over them.
///
/// `persisted` is used as-is when present; otherwise categories are
/// discovered. Returns `None` without scraping when there are no categories.
pub(crate) async fn collect<S: BrowserSession>(
    session: &mut S,
    settings: &ScrapeSettings,
    persisted: Option<Vec<CategoryLink>>,
    options: &ComprehensiveOptions,
) -> Option<Collected> {
    let (categories, fresh) = match persisted {
        Some(categories) => (categories, false),
        None => (
            discover_categories(session, settings, options.deep).await,
            true,
        ),
    };
    if categories.is_empty() {
        tracing::warn!(url = %settings.category_root_url, "no categories to scrape");
        return None;
    }

    let selected = select_categories(&categories, options.max_categories);
    tracing::info!(
        discovered = categories.len(),
        selected = selected.len(),
        "starting category loop"
    );
    let run = scrape_categories(session, settings, selected).await;
    let selected = selected.len();
    Some(Collected {
        categories,
        fresh,
        selected,
        run,
    })
}

/// Writes the artifacts of a finished category loop.
pub(crate) fn persist_crawl(
    store: &DataStore,
    collected: &Collected,
    with_tree: bool,
    started_at: DateTime<Utc>,
) -> anyhow::Result<CrawlArtifacts> {
    if collected.fresh {
        store
            .save_categories(&collected.categories)
            .context("failed to save discovered categories")?;
    }
    let coupons_path = store
        .save_comprehensive_coupons(&collected.run.coupons)
        .context("failed to save comprehensive coupons")?;

    let tree_path = if with_tree {
        let tree = build_tree(
            &collected.categories[..collected.selected],
            &collected.run.coupons,
        );
        tracing::info!(
            top_level = tree.len(),
            coupons = tree.coupon_count(),
            "category tree built"
        );
        Some(
            store
                .save_tree(&tree)
                .context("failed to save category tree")?,
        )
    } else {
        None
    };

    let summary = run_summary(started_at, &collected.run, tree_path.is_some());
    store
        .save_run_summary(&summary)
        .context("failed to save run summary")?;

    Ok(CrawlArtifacts {
        coupons_path,
        tree_path,
        summary,
    })
}

pub(crate) async fn run_comprehensive(
    config: &AppConfig,
    options: &ComprehensiveOptions,
) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let settings = ScrapeSettings::from_config(config);
    let store = DataStore::new(&config.data_dir);
    if options.deep && !options.rediscover {
        tracing::info!("deep discovery requested, ignoring persisted categories");
    }
    let persisted = load_persisted(&store, options.rediscovers());

    let mut session = session::acquire(config).await?;
    let collected = collect(&mut session, &settings, persisted, options).await;
    session.release().await;

    let Some(collected) = collected else {
        println!(
            "no categories to scrape from {}; nothing written",
            settings.category_root_url
        );
        return Ok(());
    };
    let artifacts = persist_crawl(&store, &collected, options.build_tree, started_at)?;

    let summary = &artifacts.summary;
    println!(
        "processed {} categories: {} succeeded, {} empty, {} blocked, {} timed out, {} failed",
        summary.categories_processed,
        summary.succeeded,
        summary.empty,
        summary.blocked,
        summary.timed_out,
        summary.failed
    );
    println!("collected {} coupons", summary.coupons_collected);
    println!("data dir: {}", store.dir().display());
    println!("coupons: {}", artifacts.coupons_path.display());
    if let Some(path) = artifacts.tree_path {
        println!("tree: {}", path.display());
    }
    Ok(())
}
