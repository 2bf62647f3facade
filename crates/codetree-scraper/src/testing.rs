//! Scripted in-memory [`BrowserSession`] for tests.
//!
//! Pages are HTML strings keyed by URL and queried with real CSS selectors
//! through the `scraper` crate. Each navigation to a URL consumes the next
//! scripted page for it; the last one repeats.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::session::{BrowserSession, USER_AGENT_HEADER};

/// One scripted response for a URL.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    title: String,
    html: String,
    timeout: bool,
    recovered: Option<(String, String)>,
    on_scroll: Option<String>,
    on_click: Option<String>,
    popup: Option<String>,
}

impl FakePage {
    pub fn new(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html: html.into(),
            ..Self::default()
        }
    }

    /// A navigation that never finishes loading.
    #[must_use]
    pub fn timeout() -> Self {
        Self {
            timeout: true,
            ..Self::default()
        }
    }

    /// A 403 block page.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new("403 Forbidden", "<html><body><h1>Forbidden</h1></body></html>")
    }

    /// After a `User-Agent` header swap, a reload serves this page instead.
    #[must_use]
    pub fn recovers_to(mut self, title: impl Into<String>, html: impl Into<String>) -> Self {
        self.recovered = Some((title.into(), html.into()));
        self
    }

    /// The first scroll replaces the document with `html`.
    #[must_use]
    pub fn on_scroll(mut self, html: impl Into<String>) -> Self {
        self.on_scroll = Some(html.into());
        self
    }

    /// The first click replaces the document with `html`.
    #[must_use]
    pub fn on_click(mut self, html: impl Into<String>) -> Self {
        self.on_click = Some(html.into());
        self
    }

    /// Clicking any element opens a separate page holding `html`.
    #[must_use]
    pub fn opens_popup(mut self, html: impl Into<String>) -> Self {
        self.popup = Some(html.into());
        self
    }
}

/// Node position within the parsed current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeElement(usize);

#[derive(Debug)]
struct Loaded {
    page: FakePage,
    title: String,
    html: String,
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, VecDeque<FakePage>>,
    current: Option<Loaded>,
    headers: BTreeMap<String, String>,
    failing_selectors: Vec<String>,
    navigations: Vec<String>,
    reloads: u32,
    clicks: u32,
    scrolls: u32,
}

impl FakeSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `page` as the next response for `url`.
    #[must_use]
    pub fn page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.entry(url.into()).or_default().push_back(page);
        self
    }

    /// Every query using exactly `selector` fails with a session error.
    #[must_use]
    pub fn failing_selector(mut self, selector: impl Into<String>) -> Self {
        self.failing_selectors.push(selector.into());
        self
    }

    #[must_use]
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    #[must_use]
    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations.iter().filter(|u| *u == url).count()
    }

    #[must_use]
    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    #[must_use]
    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    #[must_use]
    pub fn scrolls(&self) -> u32 {
        self.scrolls
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn next_page(&mut self, url: &str) -> FakePage {
        match self.pages.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => FakePage::new("Not Found", "<html><body></body></html>"),
        }
    }

    fn loaded(&self) -> Result<&Loaded, ScraperError> {
        self.current
            .as_ref()
            .ok_or_else(|| ScraperError::Session("no page loaded".to_owned()))
    }

    fn document(&self) -> Result<Html, ScraperError> {
        Ok(Html::parse_document(&self.loaded()?.html))
    }

    fn selector(&self, selector: &str) -> Result<Selector, ScraperError> {
        if self.failing_selectors.iter().any(|s| s == selector) {
            return Err(ScraperError::Session(format!("query failed: {selector}")));
        }
        Selector::parse(selector)
            .map_err(|e| ScraperError::Session(format!("invalid selector {selector}: {e}")))
    }

    fn replace_document(&mut self, pick: fn(&FakePage) -> Option<&String>) {
        if let Some(loaded) = self.current.as_mut() {
            if let Some(html) = pick(&loaded.page).cloned() {
                loaded.html = html;
            }
        }
    }
}

fn position(doc: &Html, element: ElementRef<'_>) -> Option<usize> {
    doc.tree.nodes().position(|n| n.id() == element.id())
}

fn resolve(doc: &Html, element: FakeElement) -> Result<ElementRef<'_>, ScraperError> {
    doc.tree
        .nodes()
        .nth(element.0)
        .and_then(ElementRef::wrap)
        .ok_or_else(|| ScraperError::Session(format!("stale element handle {}", element.0)))
}

impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        self.navigations.push(url.to_owned());
        let page = self.next_page(url);
        if page.timeout {
            self.current = None;
            return Err(ScraperError::NavigationTimeout {
                url: url.to_owned(),
                timeout_secs: timeout.as_secs(),
            });
        }
        self.current = Some(Loaded {
            title: page.title.clone(),
            html: page.html.clone(),
            page,
        });
        Ok(())
    }

    async fn reload(&mut self, _timeout: Duration) -> Result<(), ScraperError> {
        self.reloads += 1;
        let swapped = self.headers.contains_key(USER_AGENT_HEADER);
        let Some(loaded) = self.current.as_mut() else {
            return Err(ScraperError::Session("reload without a page".to_owned()));
        };
        match (&loaded.page.recovered, swapped) {
            (Some((title, html)), true) => {
                loaded.title.clone_from(title);
                loaded.html.clone_from(html);
            }
            _ => {
                loaded.title.clone_from(&loaded.page.title);
                loaded.html.clone_from(&loaded.page.html);
            }
        }
        Ok(())
    }

    async fn title(&mut self) -> Result<String, ScraperError> {
        Ok(self.loaded()?.title.clone())
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<FakeElement>, ScraperError> {
        let sel = self.selector(selector)?;
        let doc = self.document()?;
        Ok(doc
            .select(&sel)
            .filter_map(|el| position(&doc, el))
            .map(FakeElement)
            .collect())
    }

    async fn query_within(
        &mut self,
        scope: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, ScraperError> {
        let sel = self.selector(selector)?;
        let doc = self.document()?;
        let scope = resolve(&doc, *scope)?;
        Ok(scope
            .select(&sel)
            .filter_map(|el| position(&doc, el))
            .map(FakeElement)
            .collect())
    }

    async fn attribute(
        &mut self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        let doc = self.document()?;
        Ok(resolve(&doc, *element)?.value().attr(name).map(str::to_owned))
    }

    async fn inner_text(&mut self, element: &FakeElement) -> Result<Option<String>, ScraperError> {
        let doc = self.document()?;
        Ok(Some(resolve(&doc, *element)?.text().collect::<String>()))
    }

    async fn click(&mut self, element: &FakeElement) -> Result<(), ScraperError> {
        resolve(&self.document()?, *element)?;
        self.clicks += 1;
        self.replace_document(|p| p.on_click.as_ref());
        Ok(())
    }

    async fn read_after_click(
        &mut self,
        element: &FakeElement,
        selector: &str,
        attribute: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, ScraperError> {
        self.click(element).await?;
        let sel = self.selector(selector)?;
        let doc = match &self.loaded()?.page.popup {
            Some(popup) => Html::parse_document(popup),
            None => self.document()?,
        };
        Ok(doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(attribute))
            .map(str::to_owned))
    }

    async fn set_header(&mut self, name: &str, value: &str) -> Result<(), ScraperError> {
        self.headers.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        self.loaded()?;
        self.scrolls += 1;
        self.replace_document(|p| p.on_scroll.as_ref());
        Ok(())
    }
}

/// One coupon block as the site renders it. `None` omits that field.
#[must_use]
pub fn coupon_block(brand: Option<&str>, code: Option<&str>, description: Option<&str>) -> String {
    let mut block = String::from(r#"<div role="button" class="coupon">"#);
    if let Some(brand) = brand {
        block.push_str(&format!("<h3>{brand}</h3>"));
    }
    if let Some(description) = description {
        block.push_str(&format!("<h4>{description}</h4>"));
    }
    if let Some(code) = code {
        block.push_str(&format!(
            r#"<button><span class="uppercase truncate">{code}</span></button>"#
        ));
    }
    block.push_str("</div>");
    block
}

/// A category page whose coupon grid holds `blocks`.
#[must_use]
pub fn coupon_page(blocks: &[String]) -> String {
    format!(
        r#"<html><body><main><div class="grid grid-cols-1 gap-4">{}</div></main></body></html>"#,
        blocks.concat()
    )
}
