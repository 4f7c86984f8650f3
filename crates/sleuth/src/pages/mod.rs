//! Retail site page objects.
//!
//! Each page object borrows a [`Page`] and the suite's [`SleuthConfig`](crate::config::SleuthConfig) and
//! composes the resolvers, the extractor and the link checker into the steps
//! a scenario performs. Every step follows the same rhythm: take a snapshot,
//! answer a question about it, drop it, then act on the live page through
//! the element path that came out.

mod dealer_locator;
mod home;
mod product;
mod search;
mod service;

pub use dealer_locator::DealerLocatorPage;
pub use home::{CategoryVisit, HomePage, MOBILE_MENU_TOGGLE, MOBILE_NAV_CONTAINER};
pub use product::{AccessoryCheck, ProductPage, WhereToBuyDestination};
pub use search::{FilterReport, NoResultsSignal, SearchPage, SearchResults, SuggestReport};
pub use service::ServicePage;

use crate::dom::{Document, DomNode, HtmlSnapshot};
use crate::locator::{Role, Selector};
use crate::page::Page;
use crate::pattern::TextPattern;
use crate::resolver::Candidate;
use crate::result::{SleuthError, SleuthResult};
use crate::wait::{retry_until, WaitOptions};

/// Accessible name of the header button that opens the search overlay
pub const SEARCH_BUTTON_NAME: &str = "Onsite Search";

/// The header search button, matched by exact name
pub(crate) fn search_button() -> Selector {
    Selector::role(Role::Button, TextPattern::exact(SEARCH_BUTTON_NAME))
}

/// Same polling interval, deadline no later than `ms`
pub(crate) fn capped(options: &WaitOptions, ms: u64) -> WaitOptions {
    options.clone().with_timeout(options.timeout_ms.min(ms))
}

/// First match of `selector`, accepted only if visible
pub(crate) fn first_visible<D: Document>(doc: &D, selector: &Selector) -> SleuthResult<Candidate> {
    match selector.query(doc)?.into_iter().next() {
        Some(node) if node.is_visible() => {
            Ok(Candidate::from_node(&node, "anywhere", selector.to_string()))
        }
        Some(_) => Err(SleuthError::not_found(
            selector.to_string(),
            vec!["first match is hidden".to_string()],
        )),
        None => Err(SleuthError::not_found(selector.to_string(), Vec::new())),
    }
}

/// Any visible match of `selector`, in document order
pub(crate) fn any_visible<D: Document>(doc: &D, selector: &Selector) -> SleuthResult<Option<Candidate>> {
    Ok(selector
        .query(doc)?
        .into_iter()
        .find(|node| node.is_visible())
        .map(|node| Candidate::from_node(&node, "anywhere", selector.to_string())))
}

/// Poll until the first match of `selector` is visible
pub(crate) async fn wait_visible<P: Page + ?Sized>(
    page: &P,
    selector: &Selector,
    options: &WaitOptions,
) -> SleuthResult<Candidate> {
    retry_until(page, options, |doc: &HtmlSnapshot| first_visible(doc, selector)).await
}

/// Poll until any match of `selector` is visible
pub(crate) async fn wait_any_visible<P: Page + ?Sized>(
    page: &P,
    selector: &Selector,
    options: &WaitOptions,
) -> SleuthResult<Candidate> {
    retry_until(page, options, |doc: &HtmlSnapshot| {
        any_visible(doc, selector)?
            .ok_or_else(|| SleuthError::not_found(selector.to_string(), Vec::new()))
    })
    .await
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::config::SleuthConfig;

    /// Homepage URL used by every fixture site
    pub const BASE: &str = "https://example.com/us/en/";

    /// Configuration pointed at the fixture site with a short wait budget
    pub fn config() -> SleuthConfig {
        SleuthConfig::default()
            .with_base_url(BASE)
            .with_wait(WaitOptions::new().with_timeout(150).with_poll_interval(10))
    }
}
