mod crawl;
mod discover;
mod session;
mod validate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Category page scraped by `scrape-single` and checked by `validate` when no
/// `--url` is given.
const DEFAULT_CATEGORY_URL: &str = "https://simplycodes.com/category/beauty/makeup";

#[derive(Debug, Parser)]
#[command(name = "codetree")]
#[command(about = "Crawl a coupon site into a three-level category tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover the category taxonomy and persist it with an empty tree
    DiscoverTree {
        /// Also visit every level-2 page to find more subcategories
        #[arg(long)]
        deep: bool,
    },
    /// Scrape one category page and persist its coupons
    ScrapeSingle {
        #[arg(long, default_value = DEFAULT_CATEGORY_URL)]
        url: String,
        /// Make a single attempt instead of retrying empty results
        #[arg(long)]
        no_retry: bool,
    },
    /// Scrape every discovered category and build the category tree
    Comprehensive {
        /// Process at most this many categories, in discovery order
        #[arg(long)]
        max_categories: Option<usize>,
        /// Ignore persisted categories and discover again
        #[arg(long)]
        rediscover: bool,
        /// Skip building and persisting the tree
        #[arg(long)]
        no_tree: bool,
        /// Explore every level-2 page during discovery; implies --rediscover
        #[arg(long)]
        deep: bool,
    },
    /// Re-locate a previously extracted coupon on a fresh copy of its page
    Validate {
        /// Position of the coupon in extracted_coupons.json
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Page the coupon was extracted from
        #[arg(long, default_value = DEFAULT_CATEGORY_URL)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = codetree_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::DiscoverTree { deep } => discover::run_discover_tree(&config, deep).await,
        Commands::ScrapeSingle { url, no_retry } => {
            crawl::run_scrape_single(&config, &url, no_retry).await
        }
        Commands::Comprehensive {
            max_categories,
            rediscover,
            no_tree,
            deep,
        } => {
            let options = crawl::ComprehensiveOptions {
                max_categories,
                rediscover,
                build_tree: !no_tree,
                deep,
            };
            crawl::run_comprehensive(&config, &options).await
        }
        Commands::Validate { index, url } => validate::run_validate(&config, index, &url).await,
    }
}

#[cfg(test)]
mod tests;
