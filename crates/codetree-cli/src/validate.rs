use anyhow::{bail, Context};
use codetree_core::{AppConfig, DataStore};
use codetree_scraper::{validate_coupon, ScrapeSettings, Validation};

use crate::session;

pub(crate) async fn run_validate(config: &AppConfig, index: usize, url: &str) -> anyhow::Result<()> {
    let settings = ScrapeSettings::from_config(config);
    let store = DataStore::new(&config.data_dir);

    let coupons = store
        .load_extracted_coupons()
        .context("failed to read extracted coupons")?
        .unwrap_or_default();
    let Some(expected) = coupons.get(index) else {
        bail!(
            "no extracted coupon at index {index} ({} available); run scrape-single first",
            coupons.len()
        );
    };

    let mut session = session::acquire(config).await?;
    let validation = validate_coupon(&mut session, &settings, url, expected).await;
    session.release().await;

    let verdict = match &validation {
        Validation::Confirmed {
            shop_url: Some(shop_url),
        } => format!("confirmed, shop url {shop_url}"),
        Validation::Confirmed { shop_url: None } => "confirmed, shop url unavailable".to_owned(),
        Validation::Mismatch { found } => format!(
            "mismatch: found {} / {} / {}",
            found.brand, found.code, found.description
        ),
        Validation::OutOfRange { blocks } => format!("page only has {blocks} coupon blocks"),
        Validation::Incomplete { missing } => format!("block is missing its {missing}"),
        Validation::Blocked { title } => format!("blocked ({title})"),
        Validation::Timeout => "navigation timed out".to_owned(),
        Validation::NotFound => "no coupon grid on page".to_owned(),
        Validation::Failed(reason) => format!("failed: {reason}"),
    };
    println!(
        "coupon #{index} {} / {}: {verdict}",
        expected.brand, expected.code
    );
    Ok(())
}
