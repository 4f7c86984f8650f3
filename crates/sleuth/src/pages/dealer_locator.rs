//! Dealer locator: reach it from the homepage, search by ZIP code, wait for
//! dealers.

use super::{capped, first_visible};
use crate::config::SleuthConfig;
use crate::dom::{DomNode, ElementPath, HtmlSnapshot};
use crate::locator::{Region, Role, SearchScope, Selector};
use crate::page::{snapshot, Page};
use crate::page_object::PageObject;
use crate::resolver::{Candidate, ControlResolver, InputResolver, ResolveOrder, Strategy};
use crate::result::{SleuthError, SleuthResult};
use crate::wait::retry_until;
use tracing::{debug, info};

const DEALER_URL_PATTERN: &str = "dealer|where-to-buy|store-locator";

const DEALER_MAP: &str = r#"iframe, [id*="map" i], [class*="map" i]"#;
const DEALER_LIST: &str = r#"[class*="dealer" i], [class*="result" i], ul, ol"#;

const RESULTS_TIMEOUT_MS: u64 = 15_000;

/// Dealer locator page object
#[derive(Debug)]
pub struct DealerLocatorPage<'a, P: ?Sized> {
    page: &'a P,
    config: &'a SleuthConfig,
}

impl<'a, P: Page + ?Sized> DealerLocatorPage<'a, P> {
    /// Bind to a page
    #[must_use]
    pub const fn new(page: &'a P, config: &'a SleuthConfig) -> Self {
        Self { page, config }
    }

    /// Open the configured homepage
    pub async fn goto_homepage(&self) -> SleuthResult<()> {
        self.page.goto(&self.config.base_url).await
    }

    /// Find the dealer locator entry point by any of its names, looking in
    /// the header before the footer before the rest of the page, and click it
    pub async fn open_dealer_locator(&self) -> SleuthResult<Candidate> {
        let resolver = ControlResolver::new();
        let scope = SearchScope::header_footer_anywhere();
        let synonyms = &self.config.synonyms.dealer_locator;
        let entry = retry_until(self.page, &self.config.wait, |doc| {
            resolver.resolve(doc, "dealer locator", synonyms, &scope)
        })
        .await?;
        info!(text = %entry.text, region = %entry.region, "opening dealer locator");
        self.page.click(&entry.path).await?;
        Ok(entry)
    }

    /// Fill the ZIP field and submit.
    ///
    /// A submit button inside the field's form wins over one elsewhere on
    /// the page; without any, Enter is pressed in the field.
    pub async fn enter_zip_and_submit(&self, zip: &str) -> SleuthResult<()> {
        let inputs = InputResolver::default();
        let field = retry_until(self.page, &self.config.wait, |doc| {
            inputs.resolve(doc, "ZIP code")
        })
        .await?;
        self.page.fill(&field.path, zip).await?;

        let submit = {
            let doc = snapshot(self.page).await?;
            self.submit_button(&doc, &field.path)?
        };
        match submit {
            Some(button) => {
                debug!(text = %button.text, "submitting ZIP search");
                self.page.click(&button.path).await
            }
            None => {
                debug!("no submit button, pressing Enter");
                self.page.press(&field.path, "Enter").await
            }
        }
    }

    /// Wait for a map or a dealer list to become visible
    pub async fn assert_dealers_or_map_visible(&self) -> SleuthResult<Candidate> {
        let options = capped(&self.config.wait, RESULTS_TIMEOUT_MS);
        let map = Selector::css(DEALER_MAP);
        let list = Selector::css(DEALER_LIST);
        let shown = retry_until(self.page, &options, |doc| {
            first_visible(doc, &map).or_else(|_| first_visible(doc, &list))
        })
        .await
        .map_err(|e| match e {
            SleuthError::NotFound { diagnostics, .. } => SleuthError::not_found(
                "dealer results or map",
                diagnostics,
            ),
            other => other,
        })?;
        info!(tag = %shown.tag, "dealer results visible");
        Ok(shown)
    }

    fn submit_button(
        &self,
        doc: &HtmlSnapshot,
        field: &ElementPath,
    ) -> SleuthResult<Option<Candidate>> {
        let mut regions = Vec::new();
        if let Some(form) = enclosing_form(doc, field)? {
            regions.push(Region::css("form", form.as_css()));
        }
        regions.push(Region::anywhere());

        let resolver = ControlResolver::new()
            .with_strategies(vec![Strategy::Role(Role::Button)])
            .with_order(ResolveOrder::ScopeMajor);
        match resolver.resolve(
            doc,
            "submit button",
            &self.config.synonyms.submit,
            &SearchScope::new(regions),
        ) {
            Ok(button) => Ok(Some(button)),
            Err(e) if e.is_not_found_like() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Path of the `<form>` around the element at `path`, if any
fn enclosing_form(doc: &HtmlSnapshot, path: &ElementPath) -> SleuthResult<Option<ElementPath>> {
    let Some(node) = doc.resolve(path)? else {
        return Ok(None);
    };
    Ok(std::iter::successors(node.parent(), |n| n.parent())
        .find(|n| n.tag_name() == "form")
        .map(|form| form.path()))
}

impl<P: Page + ?Sized> PageObject for DealerLocatorPage<'_, P> {
    type Target = P;

    fn page(&self) -> &P {
        self.page
    }

    fn url_pattern(&self) -> &str {
        DEALER_URL_PATTERN
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config.wait.timeout_ms
    }
}
