//! Homepage: consent banner, title, search bar, category navigation, footer
//! link health and the mobile menu.

use super::{capped, search_button, wait_any_visible, wait_visible};
use crate::assertion::Assertion;
use crate::config::SleuthConfig;
use crate::link_check::{collect_links, LinkChecker, LinkReport, StatusProbe};
use crate::locator::{Role, SearchScope, Selector};
use crate::page::{snapshot, Page};
use crate::page_object::PageObject;
use crate::pattern::TextPattern;
use crate::resolver::{Candidate, ControlResolver, Strategy};
use crate::result::SleuthResult;
use crate::wait::{retry_until, wait_for_state, wait_for_url, ElementState};
use serde::Serialize;
use tracing::info;

/// Hamburger button shown on narrow viewports
pub const MOBILE_MENU_TOGGLE: &str = ".m-mainNavigation__toggle";

/// Drawer revealed by the hamburger button
pub const MOBILE_NAV_CONTAINER: &str =
    "nav.mobile-navigation, div#mobile-menu, .m-mainNavigation__itemsWrapper";

/// Link that must show up inside the opened mobile drawer
const MOBILE_MENU_PROBE_LINK: &str = "Power Tools";

const CONSENT_TIMEOUT_MS: u64 = 5_000;
const CATEGORY_TIMEOUT_MS: u64 = 15_000;
const MOBILE_TOGGLE_TIMEOUT_MS: u64 = 10_000;
const MOBILE_DRAWER_TIMEOUT_MS: u64 = 5_000;

/// Outcome of a verified category click
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryVisit {
    /// Link text as rendered
    pub label: String,
    /// URL the link led to
    pub url: String,
    /// Title of the category page
    pub title: String,
}

/// Homepage page object
#[derive(Debug)]
pub struct HomePage<'a, P: ?Sized> {
    page: &'a P,
    config: &'a SleuthConfig,
    url_pattern: String,
}

impl<'a, P: Page + ?Sized> HomePage<'a, P> {
    /// Bind to a page
    #[must_use]
    pub fn new(page: &'a P, config: &'a SleuthConfig) -> Self {
        let url_pattern = format!(
            "^{}/?$",
            regex::escape(config.base_url.trim_end_matches('/'))
        );
        Self {
            page,
            config,
            url_pattern,
        }
    }

    /// Open the homepage and wait until the URL is the base URL
    pub async fn navigate(&self) -> SleuthResult<String> {
        self.page.goto(&self.config.base_url).await?;
        self.wait_until_loaded().await
    }

    /// Click the cookie consent button if one shows up within five seconds.
    ///
    /// Returns whether a banner was dismissed; a missing banner is not an
    /// error.
    pub async fn dismiss_consent_banner(&self) -> SleuthResult<bool> {
        let resolver = ControlResolver::new().with_strategies(vec![Strategy::Role(Role::Button)]);
        let scope = SearchScope::anywhere();
        let synonyms = &self.config.synonyms.consent;
        let options = capped(&self.config.wait, CONSENT_TIMEOUT_MS);

        let found = retry_until(self.page, &options, |doc| {
            resolver.resolve(doc, "consent banner", synonyms, &scope)
        })
        .await;

        match found {
            Ok(button) => {
                self.page.click(&button.path).await?;
                info!(button = %button.text, "consent banner dismissed");
                Ok(true)
            }
            Err(e) if e.is_not_found_like() => {
                info!("no visible consent banner");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Assert the document title matches `expected`
    pub async fn verify_title(&self, expected: &TextPattern) -> SleuthResult<String> {
        let title = self.page.title().await?;
        info!(%title, "page title");
        Assertion::matches(&title, expected, "title").into_result()?;
        Ok(title)
    }

    /// Wait for the header search button
    pub async fn verify_search_bar_visible(&self) -> SleuthResult<Candidate> {
        wait_visible(self.page, &search_button(), &self.config.wait).await
    }

    /// Click the category link named `name` and check where it went.
    ///
    /// The URL must contain the first dash-separated segment of `slug` and the
    /// title must contain every word of the link text. The homepage is then
    /// reloaded and made ready for the next click.
    pub async fn click_and_verify_category_link(
        &self,
        name: &str,
        slug: &str,
    ) -> SleuthResult<CategoryVisit> {
        let options = capped(&self.config.wait, CATEGORY_TIMEOUT_MS);
        let link = Selector::role(Role::Link, TextPattern::contains(name));
        let found = wait_visible(self.page, &link, &options).await?;
        let label = if found.text.is_empty() {
            name.to_string()
        } else {
            found.text.clone()
        };
        self.page.click(&found.path).await?;

        let anchor = slug.split('-').next().unwrap_or(slug).to_lowercase();
        let url = wait_for_url(self.page, &TextPattern::contains(&anchor), &options).await?;
        let title = self.page.title().await?;
        Assertion::contains_all_words(&title, &label).into_result()?;
        info!(%label, %url, %title, "category page verified");

        self.page.goto(&self.config.base_url).await?;
        wait_visible(self.page, &search_button(), &options).await?;
        let _ = self.dismiss_consent_banner().await?;

        Ok(CategoryVisit { label, url, title })
    }

    /// Probe every link under `scope_css` and fail if any is unhealthy
    pub async fn verify_footer_links<S: StatusProbe>(
        &self,
        scope_css: &str,
        checker: &LinkChecker<S>,
    ) -> SleuthResult<LinkReport> {
        let _ = wait_for_state(self.page, scope_css, ElementState::Attached, &self.config.wait)
            .await?;
        let links = {
            let doc = snapshot(self.page).await?;
            collect_links(&doc, scope_css)?
        };
        let report = checker.probe_links(&self.config.base_url, links).await;
        report.ensure_healthy()?;
        Ok(report)
    }

    /// Open the hamburger menu, check the drawer, then close it again
    pub async fn verify_mobile_menu(&self) -> SleuthResult<()> {
        let toggle = Selector::css(MOBILE_MENU_TOGGLE);
        let options = capped(&self.config.wait, MOBILE_TOGGLE_TIMEOUT_MS);
        let drawer = capped(&self.config.wait, MOBILE_DRAWER_TIMEOUT_MS);

        let button = wait_visible(self.page, &toggle, &options).await?;
        self.page.click(&button.path).await?;

        let probe = Selector::role(Role::Link, TextPattern::contains(MOBILE_MENU_PROBE_LINK));
        let _ = wait_any_visible(self.page, &probe, &options).await?;
        let _ = wait_for_state(self.page, MOBILE_NAV_CONTAINER, ElementState::Visible, &drawer)
            .await?;
        info!("mobile navigation opened");

        let button = wait_visible(self.page, &toggle, &options).await?;
        self.page.click(&button.path).await?;
        let _ = wait_for_state(self.page, MOBILE_NAV_CONTAINER, ElementState::Hidden, &drawer)
            .await?;
        info!("mobile navigation closed");
        Ok(())
    }
}

impl<P: Page + ?Sized> PageObject for HomePage<'_, P> {
    type Target = P;

    fn page(&self) -> &P {
        self.page
    }

    fn url_pattern(&self) -> &str {
        &self.url_pattern
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config.wait.timeout_ms
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::fixtures::{config, BASE};
    use super::*;
    use crate::link_check::LinkPolicy;
    use crate::page::{PageAction, StaticPage};
    use crate::result::SleuthError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use url::Url;

    const HOME_HTML: &str = r#"<html><head><title>Bosch Power Tools | Boschtools</title></head>
        <body>
          <header>
            <button aria-label="Onsite Search"></button>
            <nav>
              <a href="/us/en/power-tools">Power Tools</a>
              <a href="/us/en/measuring-tools-and-lasers">Measuring Tools</a>
            </nav>
          </header>
          <div class="consent"><button>Accept All</button></div>
          <footer>
            <a href="about">About Us</a>
            <a href="https://example.com/careers">Careers</a>
            <a href="mailto:help@example.com">Email</a>
            <a href="newsletter">Subscribe</a>
          </footer>
        </body></html>"#;

    fn site() -> StaticPage {
        StaticPage::new()
            .with_page(BASE, HOME_HTML)
            .with_page(
                "https://example.com/us/en/power-tools",
                "<title>Power Tools | Bosch</title><h1>Power Tools</h1>",
            )
            .with_page(
                "https://example.com/us/en/measuring-tools-and-lasers",
                "<title>Lasers | Bosch</title><h1>Lasers</h1>",
            )
    }

    struct TableProbe(HashMap<String, u16>);

    #[async_trait]
    impl StatusProbe for TableProbe {
        async fn head(&self, url: &Url, _timeout: Duration) -> Result<u16, String> {
            self.0
                .get(url.as_str())
                .copied()
                .ok_or_else(|| "connection refused".to_string())
        }
    }

    fn checker(responses: &[(&str, u16)]) -> LinkChecker<TableProbe> {
        let table = responses.iter().map(|(u, s)| ((*u).to_string(), *s)).collect();
        LinkChecker::new(TableProbe(table), LinkPolicy::default())
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_title_and_search_bar() {
            let page = site();
            let config = config();
            let home = HomePage::new(&page, &config);
            assert_eq!(home.navigate().await.unwrap(), BASE);
            assert!(home.is_current().await.unwrap());

            let expected = TextPattern::regex(r"Bosch Power Tools \| Boschtools").unwrap();
            home.verify_title(&expected).await.unwrap();
            let button = home.verify_search_bar_visible().await.unwrap();
            assert_eq!(button.tag, "button");

            let wrong = TextPattern::regex("Dremel").unwrap();
            let err = home.verify_title(&wrong).await.unwrap_err();
            assert!(matches!(err, SleuthError::AssertionFailed { .. }));
        }

        #[tokio::test]
        async fn test_navigate_unknown_base_fails() {
            let page = StaticPage::new();
            let config = config();
            let err = HomePage::new(&page, &config).navigate().await.unwrap_err();
            assert!(matches!(err, SleuthError::Navigation { .. }));
        }

        #[tokio::test]
        async fn test_dismiss_consent_banner() {
            let page = site();
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();
            assert!(home.dismiss_consent_banner().await.unwrap());
            assert!(matches!(page.actions().last(), Some(PageAction::Click(_))));
        }

        #[tokio::test]
        async fn test_missing_consent_banner_is_fine() {
            let page = StaticPage::loaded(BASE, "<button>Booking</button><a href='/'>OK Go</a>");
            let config = config();
            let home = HomePage::new(&page, &config);
            assert!(!home.dismiss_consent_banner().await.unwrap());
            assert!(page.actions().is_empty());
        }

        #[tokio::test]
        async fn test_category_link_round_trip() {
            let page = site();
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();

            let visit = home
                .click_and_verify_category_link("Power Tools", "power-tools")
                .await
                .unwrap();
            assert_eq!(visit.label, "Power Tools");
            assert_eq!(visit.url, "https://example.com/us/en/power-tools");
            assert_eq!(page.url().await.unwrap(), BASE);
        }

        #[tokio::test]
        async fn test_category_title_must_contain_link_words() {
            let page = site();
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();

            let err = home
                .click_and_verify_category_link("Measuring Tools", "measuring-tools-and-lasers")
                .await
                .unwrap_err();
            assert!(err.to_string().contains("missing: Measuring, Tools"));
        }
    }

    mod footer_tests {
        use super::*;

        #[tokio::test]
        async fn test_healthy_footer() {
            let page = site();
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();

            let checker = checker(&[
                ("https://example.com/us/en/about", 200),
                ("https://example.com/careers", 403),
            ]);
            let report = home.verify_footer_links("footer", &checker).await.unwrap();
            assert_eq!(report.healthy_count(), 2);
            assert_eq!(report.skipped_count(), 2);
        }

        #[tokio::test]
        async fn test_broken_footer_link_fails() {
            let page = site();
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();

            let checker = checker(&[
                ("https://example.com/us/en/about", 404),
                ("https://example.com/careers", 200),
            ]);
            let err = home.verify_footer_links("footer", &checker).await.unwrap_err();
            match err {
                SleuthError::LinkCheckFailed { failures } => {
                    assert_eq!(failures.len(), 1);
                    assert!(failures[0].contains("About Us"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_missing_footer_times_out() {
            let page = StaticPage::loaded(BASE, "<main></main>");
            let config = config();
            let home = HomePage::new(&page, &config);
            let err = home
                .verify_footer_links("footer", &checker(&[]))
                .await
                .unwrap_err();
            assert!(matches!(err, SleuthError::Timeout { .. }));
        }
    }

    mod mobile_menu_tests {
        use super::*;

        const OPEN: &str = "https://example.com/us/en/#menu";

        fn mobile_site(open_html: &str) -> StaticPage {
            let closed = r#"<button class="m-mainNavigation__toggle">Menu</button>
                <div class="m-mainNavigation__itemsWrapper" hidden>
                  <a href="/us/en/power-tools">Power Tools</a>
                </div>"#;
            StaticPage::new()
                .with_page(BASE, closed)
                .with_page(OPEN, open_html)
                .with_transition(BASE, MOBILE_MENU_TOGGLE, OPEN)
                .with_transition(OPEN, MOBILE_MENU_TOGGLE, BASE)
        }

        #[tokio::test]
        async fn test_menu_opens_and_closes() {
            let page = mobile_site(
                r#"<button class="m-mainNavigation__toggle">Close</button>
                <div class="m-mainNavigation__itemsWrapper">
                  <a href="/us/en/power-tools">Power Tools</a>
                </div>"#,
            );
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();
            home.verify_mobile_menu().await.unwrap();
            assert_eq!(page.url().await.unwrap(), BASE);
            let clicks = page
                .actions()
                .iter()
                .filter(|a| matches!(a, PageAction::Click(_)))
                .count();
            assert_eq!(clicks, 2);
        }

        #[tokio::test]
        async fn test_drawer_without_links_fails() {
            let page = mobile_site(
                r#"<button class="m-mainNavigation__toggle">Close</button>
                <div class="m-mainNavigation__itemsWrapper"></div>"#,
            );
            let config = config();
            let home = HomePage::new(&page, &config);
            home.navigate().await.unwrap();
            let err = home.verify_mobile_menu().await.unwrap_err();
            assert!(err.is_not_found_like());
        }
    }
}
