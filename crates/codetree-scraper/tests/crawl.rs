//! End-to-end crawl over a scripted session: discovery, extraction with
//! retries and recovery, tree assembly and persistence.

use codetree_core::{build_tree, CategoryLevel, DataStore};
use codetree_scraper::testing::{coupon_block, coupon_page, FakePage, FakeSession};
use codetree_scraper::{scrape_categories, CategoryDiscoverer, ScrapeSettings};

const BASE: &str = "https://simplycodes.com";
const ROOT: &str = "https://simplycodes.com/category";
const MAKEUP: &str = "https://simplycodes.com/category/beauty/makeup";
const LIPSTICK: &str = "https://simplycodes.com/category/beauty/makeup/lipstick";
const SKINCARE: &str = "https://simplycodes.com/category/beauty/skincare";
const GADGETS: &str = "https://simplycodes.com/category/tech/gadgets";

fn root_page() -> FakePage {
    let html = r#"<html><body>
        <div class="flex flex-row items-center justify-between rounded-16">
          <div class="title"><a href="/category/beauty/makeup">Makeup</a></div>
        </div>
        <div class="flex flex-row items-center justify-between rounded-16">
          <div class="title"><a href="/category/beauty/skincare">Skincare</a></div>
        </div>
        <div class="flex flex-row items-center justify-between rounded-16">
          <div class="title"><a href="https://simplycodes.com/category/tech/gadgets/">Gadgets</a></div>
        </div>
        <div class="overflow-hidden">
          <ul class="ml-6 gap-4 flex flex-col pb-12">
            <li><a href="/category/beauty/makeup/lipstick">Lipstick</a></li>
          </ul>
        </div>
    </body></html>"#;
    FakePage::new("All Categories | SimplyCodes", html)
}

fn coupons(blocks: &[(&str, &str, &str)]) -> String {
    let blocks: Vec<_> = blocks
        .iter()
        .map(|(brand, code, desc)| coupon_block(Some(brand), Some(code), Some(desc)))
        .collect();
    coupon_page(&blocks)
}

#[tokio::test]
async fn crawl_builds_a_tree_from_a_flaky_site() {
    let settings = ScrapeSettings::immediate(BASE);
    let mut session = FakeSession::new()
        .page(ROOT, root_page())
        // first visit times out, the retry succeeds
        .page(MAKEUP, FakePage::timeout())
        .page(
            MAKEUP,
            FakePage::new(
                "Makeup",
                coupons(&[("Glossier", "GLOSS10", "10% off"), ("Fenty", "FENTY", "Free gift")]),
            ),
        )
        .page(SKINCARE, FakePage::new("Skincare", coupon_page(&[])))
        // blocked until the user agent is swapped
        .page(
            GADGETS,
            FakePage::forbidden().recovers_to("Gadgets", coupons(&[("Anker", "ANK15", "15% off")])),
        )
        .page(
            LIPSTICK,
            FakePage::new("Lipstick", coupons(&[("MAC", "MAC20", "20% off")])),
        );

    let categories = CategoryDiscoverer::new(&mut session, &settings)
        .discover()
        .await;
    let paths: Vec<_> = categories.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/category/beauty/makeup",
            "/category/beauty/skincare",
            "/category/tech/gadgets",
            "/category/beauty/makeup/lipstick",
        ]
    );

    let run = scrape_categories(&mut session, &settings, &categories).await;
    assert_eq!(run.stats.processed, 4);
    assert_eq!(run.stats.succeeded, 3);
    assert_eq!(run.stats.empty, 1);
    assert_eq!(run.stats.coupons, 4);
    assert_eq!(session.navigation_count(MAKEUP), 2);
    assert_eq!(session.navigation_count(SKINCARE), 3);
    assert_eq!(session.reloads(), 1);

    let tree = build_tree(&categories, &run.coupons);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.coupon_count(), 4);

    let beauty = &tree.categories["beauty"];
    assert_eq!(beauty.category_name, "Beauty");
    let makeup = &beauty.subcategories["makeup"];
    assert_eq!(makeup.subcategories_name, "Makeup");
    assert_eq!(makeup.coupons.len(), 2);
    assert_eq!(makeup.coupons[1].button_index, 1);
    assert_eq!(makeup.subcategories["lipstick"].coupons[0].code, "MAC20");
    assert!(beauty.subcategories["skincare"].coupons.is_empty());
    assert_eq!(
        tree.coupons_at("/category/tech/gadgets").map(<[_]>::len),
        Some(1)
    );

    let lipstick = run
        .coupons
        .iter()
        .find(|c| c.coupon.code == "MAC20")
        .unwrap();
    assert_eq!(lipstick.category_level, CategoryLevel::Three);
    assert_eq!(lipstick.parent_category.as_deref(), Some("beauty > makeup"));

    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    store.save_categories(&categories).unwrap();
    store.save_comprehensive_coupons(&run.coupons).unwrap();
    store.save_tree(&tree).unwrap();

    let reloaded = store.load_tree().unwrap().unwrap();
    assert_eq!(reloaded, tree);
    let rebuilt = build_tree(
        &store.load_categories().unwrap().unwrap(),
        &store.load_comprehensive_coupons().unwrap().unwrap(),
    );
    assert_eq!(rebuilt, tree, "tree is reproducible from persisted artifacts");
}

#[tokio::test]
async fn blocked_root_produces_an_empty_tree_without_scraping() {
    let settings = ScrapeSettings::immediate(BASE);
    let mut session = FakeSession::new().page(ROOT, FakePage::forbidden());

    let categories = CategoryDiscoverer::new(&mut session, &settings)
        .discover()
        .await;
    let run = scrape_categories(&mut session, &settings, &categories).await;
    let tree = build_tree(&categories, &run.coupons);

    assert!(categories.is_empty());
    assert!(tree.is_empty());
    assert_eq!(session.navigations(), &[ROOT]);
}
