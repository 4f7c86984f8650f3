//! Service and repair entry points.

use super::{any_visible, capped};
use crate::config::SleuthConfig;
use crate::dom::{Document, DomNode};
use crate::locator::{Region, Role, SearchScope, Selector};
use crate::page::{snapshot, Page};
use crate::page_object::PageObject;
use crate::pattern::{SynonymSet, TextPattern};
use crate::resolver::{Candidate, ControlResolver, ResolveOrder, Strategy};
use crate::result::{SleuthError, SleuthResult};
use crate::wait::{retry_until, wait_for_url};
use tracing::info;

const REPAIR_URL_PATTERN: &str = "repair";
const REPAIR_CONTENT_PATTERN: &str = "repair|service";
const MAIN_CONTENT: &str = "main, .main, #main, body";

const REPAIR_URL_TIMEOUT_MS: u64 = 15_000;

/// Service section page object
#[derive(Debug)]
pub struct ServicePage<'a, P: ?Sized> {
    page: &'a P,
    config: &'a SleuthConfig,
}

impl<'a, P: Page + ?Sized> ServicePage<'a, P> {
    /// Bind to a page
    #[must_use]
    pub const fn new(page: &'a P, config: &'a SleuthConfig) -> Self {
        Self { page, config }
    }

    /// Open the configured homepage
    pub async fn goto_homepage(&self) -> SleuthResult<()> {
        self.page.goto(&self.config.base_url).await
    }

    /// Click the service or support link, preferring one outside the footer
    pub async fn open_service_menu(&self) -> SleuthResult<Candidate> {
        let resolver = ControlResolver::new()
            .with_strategies(vec![Strategy::Role(Role::Link)])
            .with_order(ResolveOrder::ScopeMajor);
        let scope = SearchScope::new(vec![Region::anywhere(), Region::footer()]);
        let synonyms = &self.config.synonyms.service;
        self.resolve_and_click(&resolver, "service menu", synonyms, &scope)
            .await
    }

    /// Click the tool repair link, or any text naming it
    pub async fn click_tool_repair(&self) -> SleuthResult<Candidate> {
        let resolver = ControlResolver::new()
            .with_strategies(vec![Strategy::Role(Role::Link), Strategy::Text]);
        let synonyms = &self.config.synonyms.repair;
        self.resolve_and_click(&resolver, "tool repair", synonyms, &SearchScope::anywhere())
            .await
    }

    /// The repair page is loaded when the URL mentions repair and the page
    /// says something about repair or service
    pub async fn assert_repair_page_loaded(&self) -> SleuthResult<Candidate> {
        let options = capped(&self.config.wait, REPAIR_URL_TIMEOUT_MS);
        let url = wait_for_url(self.page, &TextPattern::regex(REPAIR_URL_PATTERN)?, &options).await?;

        let content = TextPattern::regex(REPAIR_CONTENT_PATTERN)?;
        let doc = snapshot(self.page).await?;
        if let Some(found) = any_visible(&doc, &Selector::text(content.clone()))? {
            info!(%url, text = %found.text, "repair page loaded");
            return Ok(found);
        }
        match doc.select(MAIN_CONTENT)?.into_iter().next() {
            Some(main) if content.matches(&main.normalized_text()) => Ok(Candidate::from_node(
                &main,
                "anywhere",
                format!("css={MAIN_CONTENT}"),
            )),
            _ => Err(SleuthError::assertion(format!(
                "repair page at {url} mentions neither repair nor service"
            ))),
        }
    }

    async fn resolve_and_click(
        &self,
        resolver: &ControlResolver,
        what: &str,
        synonyms: &SynonymSet,
        scope: &SearchScope,
    ) -> SleuthResult<Candidate> {
        let control = retry_until(self.page, &self.config.wait, |doc| {
            resolver.resolve(doc, what, synonyms, scope)
        })
        .await?;
        self.page.click(&control.path).await?;
        Ok(control)
    }
}

impl<P: Page + ?Sized> PageObject for ServicePage<'_, P> {
    type Target = P;

    fn page(&self) -> &P {
        self.page
    }

    fn url_pattern(&self) -> &str {
        REPAIR_URL_PATTERN
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config.wait.timeout_ms
    }
}
