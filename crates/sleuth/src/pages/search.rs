//! Search overlay and search results page.

use super::{any_visible, capped, first_visible, search_button, wait_visible};
use crate::config::SleuthConfig;
use crate::dom::{Document, DomNode, ElementPath, HtmlSnapshot};
use crate::locator::{accessible_name, Role, Selector};
use crate::page::{snapshot, Page};
use crate::page_object::PageObject;
use crate::pattern::{contains_ignore_case, TextPattern};
use crate::resolver::Candidate;
use crate::result::{SleuthError, SleuthResult};
use crate::wait::{retry_until, wait_for_state, ElementState};
use serde::Serialize;
use tracing::{debug, info, warn};

/// URLs of the search results page
const SEARCH_URL_PATTERN: &str = r"search|\?q=";

const SEARCH_INPUT_NAME: &str = "Search";
const RESULT_CARD: &str = r#"[data-track_moduletype="Product List"]"#;
const RESULT_HEADINGS: &str = "h1, h2, .search-results-title, .page-title";
const PRODUCT_CARDS: &str = r#"[data-track_moduletype="Product List"], .product-card"#;
const FILTER_SECTION: &str = r#"dialog[aria-label*="Filter" i], aside[aria-label*="Filter" i], [aria-label*="Refine" i], [aria-label*="facet" i]"#;
const COLLAPSED_GROUPS: &str = r#"a[aria-expanded="false"], button[aria-expanded="false"], [role="button"][aria-expanded="false"]"#;
const NO_RESULTS_MESSAGE: &str = "No Results Found";
const TESTID_PRODUCT_CARD: &str = r#"[data-testid="product-card"]"#;

/// Auto-suggest containers, most specific first
const SUGGESTION_CONTAINERS: &[&str] = &[
    r#"ul[role="listbox"]"#,
    "ul",
    r#"div[role="listbox"]"#,
    r#"div.suggestions, div[aria-label*="suggestion"]"#,
];

const SEARCH_CONTROL_TIMEOUT_MS: u64 = 5_000;
const RESULTS_TIMEOUT_MS: u64 = 15_000;
const HEADING_TIMEOUT_MS: u64 = 5_000;
const SUGGEST_TIMEOUT_MS: u64 = 2_500;
const FILTER_SECTION_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// REPORTS
// =============================================================================

/// A loaded results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    /// Results URL
    pub url: String,
    /// Heading that echoed the search term
    pub heading: String,
}

/// Which suggestions showed up for a partial term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestReport {
    /// Selector of the container that appeared, if any
    pub container: Option<String>,
    /// Expected suggestions present in the container
    pub found: Vec<String>,
    /// Expected suggestions absent from the container
    pub missing: Vec<String>,
}

impl SuggestReport {
    /// Whether any suggestion list appeared
    #[must_use]
    pub fn appeared(&self) -> bool {
        self.container.is_some()
    }

    /// Whether every expected suggestion was found
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.appeared() && self.missing.is_empty()
    }
}

/// Outcome of a filtered search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    /// Filter label that was checked
    pub label: String,
    /// Collapsed filter groups that were expanded
    pub expanded: usize,
    /// Product cards left after filtering, all mentioning the label
    pub cards: usize,
}

/// Evidence that a search came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoResultsSignal {
    /// A visible "No Results Found" message
    Message,
    /// No product cards at all
    NoProductCards,
    /// A "Products (0)" tab
    EmptyProductsTab,
}

// =============================================================================
// SEARCH PAGE
// =============================================================================

/// Search page object
#[derive(Debug)]
pub struct SearchPage<'a, P: ?Sized> {
    page: &'a P,
    config: &'a SleuthConfig,
}

impl<'a, P: Page + ?Sized> SearchPage<'a, P> {
    /// Bind to a page
    #[must_use]
    pub const fn new(page: &'a P, config: &'a SleuthConfig) -> Self {
        Self { page, config }
    }

    /// Click the header search button and wait for the search combobox
    pub async fn open_search(&self) -> SleuthResult<Candidate> {
        let options = capped(&self.config.wait, SEARCH_CONTROL_TIMEOUT_MS);
        let button = wait_visible(self.page, &search_button(), &options).await?;
        self.page.click(&button.path).await?;
        let input = Selector::role(Role::Combobox, TextPattern::contains(SEARCH_INPUT_NAME));
        wait_visible(self.page, &input, &options).await
    }

    /// Type `term`, press Enter and wait for a results URL
    pub async fn submit_search(&self, term: &str) -> SleuthResult<String> {
        info!(term, "searching");
        let input = self.open_search().await?;
        self.page.fill(&input.path, term).await?;
        self.page.press(&input.path, "Enter").await?;
        self.wait_until_loaded().await
    }

    /// Search and verify the results page lists products and echoes `term`
    pub async fn search_for_product(&self, term: &str) -> SleuthResult<SearchResults> {
        let url = self.submit_search(term).await?;

        let results = capped(&self.config.wait, RESULTS_TIMEOUT_MS);
        let _ = wait_visible(self.page, &Selector::css(RESULT_CARD), &results).await?;

        let options = capped(&self.config.wait, HEADING_TIMEOUT_MS);
        let heading = retry_until(self.page, &options, |doc| {
            let heading = first_visible(doc, &Selector::css(RESULT_HEADINGS))?;
            if contains_ignore_case(&heading.text, term) {
                Ok(heading.text)
            } else {
                Err(SleuthError::not_found(
                    format!("results heading containing '{term}'"),
                    vec![format!("heading: '{}'", heading.text)],
                ))
            }
        })
        .await?;

        info!(term, %url, %heading, "search results displayed");
        Ok(SearchResults { url, heading })
    }

    /// Type a partial term without submitting and report which expected
    /// suggestions appear.
    ///
    /// A missing suggestion list is reported, not raised.
    pub async fn auto_suggest(&self, partial: &str, expected: &[&str]) -> SleuthResult<SuggestReport> {
        let input = self.open_search().await?;
        self.page.fill(&input.path, partial).await?;

        let options = capped(&self.config.wait, SUGGEST_TIMEOUT_MS);
        let outcome = retry_until(self.page, &options, |doc| suggestions(doc, expected)).await;

        match outcome {
            Ok(report) => {
                for missing in &report.missing {
                    warn!(partial, suggestion = %missing, "expected suggestion not found");
                }
                info!(partial, found = report.found.len(), "auto-suggest checked");
                Ok(report)
            }
            Err(e) if e.is_not_found_like() => {
                warn!(partial, "no auto-suggest list appeared");
                Ok(SuggestReport {
                    container: None,
                    found: Vec::new(),
                    missing: expected.iter().map(|s| (*s).to_string()).collect(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Search for `tool`, tick the filter checkbox named `label` and verify
    /// every remaining product card mentions it
    pub async fn filter_by_battery_system(&self, tool: &str, label: &str) -> SleuthResult<FilterReport> {
        let _ = self.search_for_product(tool).await?;

        let section = capped(&self.config.wait, FILTER_SECTION_TIMEOUT_MS);
        if let Err(e) = wait_for_state(self.page, FILTER_SECTION, ElementState::Visible, &section).await {
            if !e.is_not_found_like() {
                return Err(e);
            }
            debug!("no filter section found, looking for checkboxes anyway");
        }

        let expanded = self.expand_filter_groups().await?;

        let checkbox = Selector::role(Role::Checkbox, TextPattern::contains(label));
        let options = capped(&self.config.wait, FILTER_SECTION_TIMEOUT_MS);
        let target = retry_until(self.page, &options, |doc| {
            any_visible(doc, &checkbox)?
                .ok_or_else(|| SleuthError::not_found(format!("filter '{label}'"), checkbox_labels(doc)))
        })
        .await?;
        self.page.check(&target.path).await?;

        let results = capped(&self.config.wait, RESULTS_TIMEOUT_MS);
        let outcome = retry_until(self.page, &results, |doc| cards_mentioning(doc, label)).await;
        let cards = match outcome {
            Ok(cards) => cards,
            Err(SleuthError::NotFound { diagnostics, .. }) if !diagnostics.is_empty() => {
                return Err(SleuthError::assertion(format!(
                    "product cards not matching '{label}': {}",
                    diagnostics.join("; ")
                )));
            }
            Err(e) => return Err(e),
        };

        info!(label, cards, expanded, "filter applied");
        Ok(FilterReport {
            label: label.to_string(),
            expanded,
            cards,
        })
    }

    /// Search for a term that should match nothing and report how the page
    /// said so
    pub async fn assert_no_results(&self, term: &str) -> SleuthResult<NoResultsSignal> {
        let _ = self.submit_search(term).await?;
        let signal = {
            let doc = snapshot(self.page).await?;
            no_results_signal(&doc)?
        };
        match signal {
            Some(signal) => {
                info!(term, ?signal, "empty search confirmed");
                Ok(signal)
            }
            None => Err(SleuthError::assertion(format!(
                "search for '{term}' shows products and no empty-results message"
            ))),
        }
    }

    /// Click every collapsed filter group; failures are ignored
    async fn expand_filter_groups(&self) -> SleuthResult<usize> {
        let groups: Vec<ElementPath> = {
            let doc = snapshot(self.page).await?;
            doc.select(COLLAPSED_GROUPS)?.iter().map(|g| g.path()).collect()
        };
        let mut expanded = 0;
        for path in &groups {
            match self.page.click(path).await {
                Ok(()) => expanded += 1,
                Err(e) => debug!(%path, error = %e, "filter group not expandable"),
            }
        }
        Ok(expanded)
    }
}

impl<P: Page + ?Sized> PageObject for SearchPage<'_, P> {
    type Target = P;

    fn page(&self) -> &P {
        self.page
    }

    fn url_pattern(&self) -> &str {
        SEARCH_URL_PATTERN
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config.wait.timeout_ms
    }
}

// =============================================================================
// SNAPSHOT QUERIES
// =============================================================================

/// First visible suggestion container and the expected entries it lists
fn suggestions(doc: &HtmlSnapshot, expected: &[&str]) -> SleuthResult<SuggestReport> {
    for css in SUGGESTION_CONTAINERS {
        let container = match first_visible(doc, &Selector::css(*css)) {
            Ok(container) => container,
            Err(e) if e.is_not_found_like() => continue,
            Err(e) => return Err(e),
        };
        let Some(node) = doc.resolve(&container.path)? else {
            continue;
        };
        let items: Vec<String> = doc
            .select_within(&node, "li")?
            .iter()
            .filter(|li| li.is_visible())
            .map(|li| li.normalized_text())
            .collect();

        let (found, missing): (Vec<&str>, Vec<&str>) = expected
            .iter()
            .copied()
            .partition(|s| items.iter().any(|item| contains_ignore_case(item, s)));
        return Ok(SuggestReport {
            container: Some((*css).to_string()),
            found: found.into_iter().map(str::to_string).collect(),
            missing: missing.into_iter().map(str::to_string).collect(),
        });
    }
    Err(SleuthError::not_found("auto-suggest list", Vec::new()))
}

/// Names of every checkbox, for diagnostics
fn checkbox_labels(doc: &HtmlSnapshot) -> Vec<String> {
    doc.select(Role::Checkbox.css())
        .map(|boxes| boxes.iter().map(|b| accessible_name(doc, b)).collect())
        .unwrap_or_default()
}

/// Number of product cards, provided there is at least one and all mention
/// `label`. Mismatching cards are returned as diagnostics.
fn cards_mentioning(doc: &HtmlSnapshot, label: &str) -> SleuthResult<usize> {
    let cards = doc.select(PRODUCT_CARDS)?;
    if cards.is_empty() {
        return Err(SleuthError::not_found("product cards", Vec::new()));
    }
    let mismatched: Vec<String> = cards
        .iter()
        .enumerate()
        .map(|(i, card)| (i, card.normalized_text()))
        .filter(|(_, text)| !contains_ignore_case(text, label))
        .map(|(i, text)| format!("card {}: '{text}'", i + 1))
        .collect();
    if mismatched.is_empty() {
        Ok(cards.len())
    } else {
        Err(SleuthError::not_found(
            format!("product cards mentioning '{label}'"),
            mismatched,
        ))
    }
}

fn no_results_signal(doc: &HtmlSnapshot) -> SleuthResult<Option<NoResultsSignal>> {
    let message = Selector::text(TextPattern::contains(NO_RESULTS_MESSAGE));
    if any_visible(doc, &message)?.is_some() {
        return Ok(Some(NoResultsSignal::Message));
    }
    if doc.select(TESTID_PRODUCT_CARD)?.is_empty() {
        return Ok(Some(NoResultsSignal::NoProductCards));
    }
    let tab = Selector::has_text("a", TextPattern::contains("Products"));
    let empty = TextPattern::regex(r"Products\s*\(0\)")?;
    if let Ok(tab) = first_visible(doc, &tab) {
        if empty.matches(&tab.text) {
            return Ok(Some(NoResultsSignal::EmptyProductsTab));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::fixtures::{config, BASE};
    use super::*;
    use crate::page::{PageAction, StaticPage};

    const SEARCH_OVERLAY: &str = r#"
        <header>
          <button aria-label="Onsite Search"></button>
          <div class="overlay"><input type="search" role="combobox" aria-label="Search products"></div>
        </header>"#;

    fn home(extra: &str) -> String {
        format!("<html><body>{SEARCH_OVERLAY}{extra}</body></html>")
    }

    fn results_url(term: &str) -> String {
        format!("https://example.com/us/en/search?q={term}")
    }

    fn site(term: &str, results_html: &str) -> StaticPage {
        StaticPage::loaded(BASE, home(""))
            .with_page(results_url(term), results_html)
            .with_transition(BASE, "input[role=combobox]", results_url(term))
    }

    mod search_tests {
        use super::*;

        #[tokio::test]
        async fn test_search_for_product() {
            let page = site(
                "GWX10-45E",
                r#"<h1>Search results for "gwx10-45e"</h1>
                   <div data-track_moduletype="Product List">GWX10-45E Angle Grinder</div>"#,
            );
            let config = config();
            let search = SearchPage::new(&page, &config);
            let results = search.search_for_product("GWX10-45E").await.unwrap();
            assert_eq!(results.url, results_url("GWX10-45E"));
            assert!(results.heading.contains("gwx10-45e"));

            let actions = page.actions();
            assert!(matches!(&actions[1], PageAction::Fill { value, .. } if value == "GWX10-45E"));
            assert!(matches!(&actions[2], PageAction::Press { key, .. } if key == "Enter"));
        }

        #[tokio::test]
        async fn test_heading_must_echo_term() {
            let page = site(
                "drill",
                r#"<h1>Results</h1><div data-track_moduletype="Product List">Hammer</div>"#,
            );
            let config = config();
            let err = SearchPage::new(&page, &config)
                .search_for_product("drill")
                .await
                .unwrap_err();
            assert_eq!(err.diagnostics(), ["heading: 'Results'"]);
        }

        #[tokio::test]
        async fn test_missing_search_button() {
            let page = StaticPage::loaded(BASE, "<header><button>Menu</button></header>");
            let config = config();
            let err = SearchPage::new(&page, &config).open_search().await.unwrap_err();
            assert!(err.is_not_found_like());
        }
    }

    mod suggest_tests {
        use super::*;

        #[tokio::test]
        async fn test_reports_found_and_missing() {
            let page = StaticPage::loaded(
                BASE,
                home(r#"<ul role="listbox"><li>Drill/Drivers</li><li>Hammer Drills</li></ul>"#),
            );
            let config = config();
            let report = SearchPage::new(&page, &config)
                .auto_suggest("drill", &["Drill/Drivers", "hammer drills", "Rotary Hammers"])
                .await
                .unwrap();
            assert_eq!(report.container.as_deref(), Some(r#"ul[role="listbox"]"#));
            assert_eq!(report.found, ["Drill/Drivers", "hammer drills"]);
            assert_eq!(report.missing, ["Rotary Hammers"]);
            assert!(!report.is_complete());
        }

        #[tokio::test]
        async fn test_plain_list_is_accepted() {
            let page = StaticPage::loaded(BASE, home("<ul><li>Drill/Drivers</li></ul>"));
            let config = config();
            let report = SearchPage::new(&page, &config)
                .auto_suggest("drill", &["Drill/Drivers"])
                .await
                .unwrap();
            assert_eq!(report.container.as_deref(), Some("ul"));
            assert!(report.is_complete());
        }

        #[tokio::test]
        async fn test_no_container_is_reported() {
            let page = StaticPage::loaded(BASE, home(""));
            let config = config();
            let report = SearchPage::new(&page, &config)
                .auto_suggest("drill", &["Drill/Drivers"])
                .await
                .unwrap();
            assert!(!report.appeared());
            assert_eq!(report.missing, ["Drill/Drivers"]);
        }
    }

    mod filter_tests {
        use super::*;

        const UNFILTERED: &str = r#"
            <h1>drill</h1>
            <aside aria-label="Filters">
              <button aria-expanded="false">Battery System</button>
              <label><input type="checkbox" name="system"> 18V Drill/Drivers</label>
              <label><input type="checkbox" name="system"> 12V Max Drill/Drivers</label>
            </aside>
            <div class="product-card" data-track_moduletype="Product List">GSR18V-535C 18V Drill/Drivers</div>
            <div class="product-card" data-track_moduletype="Product List">PS31 12V Max Drill/Drivers</div>"#;

        const FILTERED_URL: &str = "https://example.com/us/en/search?q=drill&system=18v";

        fn filter_site(with_transition: bool) -> StaticPage {
            let page = site("drill", UNFILTERED).with_page(
                FILTERED_URL,
                r#"<h1>drill</h1>
                   <div class="product-card" data-track_moduletype="Product List">GSR18V-535C 18V Drill/Drivers</div>"#,
            );
            if with_transition {
                page.with_transition(results_url("drill"), "input[type=checkbox]", FILTERED_URL)
            } else {
                page
            }
        }

        #[tokio::test]
        async fn test_filter_narrows_results() {
            let page = filter_site(true);
            let config = config();
            let report = SearchPage::new(&page, &config)
                .filter_by_battery_system("drill", "18V Drill/Drivers")
                .await
                .unwrap();
            assert_eq!(report.expanded, 1);
            assert_eq!(report.cards, 1);
            assert_eq!(page.url().await.unwrap(), FILTERED_URL);
            assert!(page.actions().iter().any(|a| matches!(a, PageAction::Check(_))));
        }

        #[tokio::test]
        async fn test_unfiltered_cards_fail() {
            let page = filter_site(false);
            let config = config();
            let err = SearchPage::new(&page, &config)
                .filter_by_battery_system("drill", "18V Drill/Drivers")
                .await
                .unwrap_err();
            assert!(matches!(err, SleuthError::AssertionFailed { .. }));
            assert!(err.to_string().contains("PS31"));
        }

        #[tokio::test]
        async fn test_unknown_filter_lists_checkboxes() {
            let page = filter_site(true);
            let config = config();
            let err = SearchPage::new(&page, &config)
                .filter_by_battery_system("drill", "Cordless Hammer Drill/Drivers")
                .await
                .unwrap_err();
            assert_eq!(
                err.diagnostics(),
                ["18V Drill/Drivers", "12V Max Drill/Drivers"]
            );
        }
    }

    mod no_results_tests {
        use super::*;

        async fn signal(results_html: &str) -> SleuthResult<NoResultsSignal> {
            let page = site("XYZ-999-BOSCH", results_html);
            let config = config();
            SearchPage::new(&page, &config)
                .assert_no_results("XYZ-999-BOSCH")
                .await
        }

        #[tokio::test]
        async fn test_message() {
            let found = signal("<h1>XYZ-999-BOSCH</h1><p>No results found</p>").await.unwrap();
            assert_eq!(found, NoResultsSignal::Message);
        }

        #[tokio::test]
        async fn test_no_cards() {
            let found = signal("<h1>XYZ-999-BOSCH</h1>").await.unwrap();
            assert_eq!(found, NoResultsSignal::NoProductCards);
        }

        #[tokio::test]
        async fn test_empty_products_tab() {
            let html = r##"<nav><a href="#p">Products (0)</a><a href="#c">Content (4)</a></nav>
                <div data-testid="product-card">Recommended</div>"##;
            assert_eq!(signal(html).await.unwrap(), NoResultsSignal::EmptyProductsTab);
        }

        #[tokio::test]
        async fn test_products_shown_fails() {
            let html = r##"<nav><a href="#p">Products (3)</a></nav>
                <div data-testid="product-card">GSR18V</div>"##;
            let err = signal(html).await.unwrap_err();
            assert!(matches!(err, SleuthError::AssertionFailed { .. }));
        }
    }
}
