use std::path::PathBuf;

use anyhow::Context;
use codetree_core::{build_tree, AppConfig, CategoryLevel, CategoryLink, DataStore};
use codetree_scraper::{BrowserSession, CategoryDiscoverer, ScrapeSettings};

use crate::session;

/// Runs discovery (plain or deep) on an already-acquired session.
pub(crate) async fn discover_categories<S: BrowserSession>(
    session: &mut S,
    settings: &ScrapeSettings,
    deep: bool,
) -> Vec<CategoryLink> {
    let mut discoverer = CategoryDiscoverer::new(session, settings);
    if deep {
        discoverer.discover_deep(settings.category_delay).await
    } else {
        discoverer.discover().await
    }
}

/// What `discover-tree` wrote.
#[derive(Debug)]
pub(crate) struct DiscoveryArtifacts {
    pub(crate) categories: usize,
    pub(crate) level2: usize,
    pub(crate) level3: usize,
    pub(crate) top_level: usize,
    pub(crate) subcategories: usize,
    pub(crate) categories_path: PathBuf,
    pub(crate) tree_path: PathBuf,
}

/// Persists discovered categories and their coupon-less tree.
///
/// An empty discovery writes nothing and returns `Ok(None)`, so a blocked
/// root never replaces the artifacts of an earlier run.
pub(crate) fn persist_discovery(
    store: &DataStore,
    categories: &[CategoryLink],
) -> anyhow::Result<Option<DiscoveryArtifacts>> {
    if categories.is_empty() {
        tracing::warn!(
            dir = %store.dir().display(),
            "no categories discovered, keeping existing artifacts"
        );
        return Ok(None);
    }

    let categories_path = store
        .save_categories(categories)
        .context("failed to save discovered categories")?;
    let tree = build_tree(categories, &[]);
    let tree_path = store
        .save_tree(&tree)
        .context("failed to save category tree")?;

    Ok(Some(DiscoveryArtifacts {
        categories: categories.len(),
        level2: count_level(categories, CategoryLevel::Two),
        level3: count_level(categories, CategoryLevel::Three),
        top_level: tree.len(),
        subcategories: tree.subcategory_count(),
        categories_path,
        tree_path,
    }))
}

pub(crate) async fn run_discover_tree(config: &AppConfig, deep: bool) -> anyhow::Result<()> {
    let settings = ScrapeSettings::from_config(config);
    let store = DataStore::new(&config.data_dir);

    let mut session = session::acquire(config).await?;
    let categories = discover_categories(&mut session, &settings, deep).await;
    session.release().await;

    let Some(artifacts) = persist_discovery(&store, &categories)? else {
        println!(
            "no categories discovered at {}; nothing written",
            settings.category_root_url
        );
        return Ok(());
    };

    println!(
        "discovered {} categories ({} level-2, {} level-3) across {} top-level categories",
        artifacts.categories, artifacts.level2, artifacts.level3, artifacts.top_level
    );
    println!("tree holds {} subcategories", artifacts.subcategories);
    println!("categories: {}", artifacts.categories_path.display());
    println!("tree: {}", artifacts.tree_path.display());
    Ok(())
}

pub(crate) fn count_level(categories: &[CategoryLink], level: CategoryLevel) -> usize {
    categories.iter().filter(|c| c.level == level).count()
}
