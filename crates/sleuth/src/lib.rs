//! Sleuth: resilient fact-finding on live retail pages
//!
//! Markup on a production storefront drifts constantly: labels get reworded,
//! links move from the header to the footer, spec tables become definition
//! lists. Sleuth answers the questions an end-to-end suite asks of a page
//! ("where is the dealer locator?", "what is the rpm?", "are the footer
//! links healthy?") by trying every known way of asking before giving up,
//! and says exactly what it saw when it does give up.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      SLEUTH Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Html       │    │ Resolvers  │            │
//! │   │ (CDP or    │───►│ Snapshot   │───►│ Extractor  │            │
//! │   │  static)   │    │            │    │ Link check │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         ▲                                    │                  │
//! │         └──────── click / fill / press ◄─────┘                  │
//! │                   (by element path)                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Page objects in [`pages`] compose these into retail scenarios.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
mod browser;
mod config;
/// Document model over parsed page snapshots
pub mod dom;
mod extractor;
#[allow(clippy::missing_errors_doc)]
mod link_check;
mod locator;
#[allow(clippy::missing_errors_doc)]
mod page;
#[allow(clippy::missing_errors_doc)]
mod page_object;
/// Retail site page objects
#[allow(clippy::missing_errors_doc)]
pub mod pages;
mod pattern;
mod resolver;
mod result;
mod wait;

pub use assertion::{Assertion, AssertionResult};
pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::{CdpBrowser, CdpPage};
pub use config::{SleuthConfig, Synonyms, DEFAULT_BASE_URL};
pub use dom::{Document, DomNode, ElementPath, HtmlSnapshot};
pub use extractor::{AliasTable, Fact, FactExtractor, FactSource};
pub use link_check::{
    collect_links, join_url, DiscoveredLink, HttpProbe, LinkChecker, LinkPolicy, LinkRecord,
    LinkReport, LinkStatus, StatusProbe, DEFAULT_PROBE_TIMEOUT_MS,
};
pub use locator::{accessible_name, Region, Role, SearchScope, Selector};
pub use page::{snapshot, Page, PageAction, StaticPage, BLANK_URL};
pub use page_object::{PageObject, DEFAULT_LOAD_TIMEOUT_MS};
pub use pattern::{contains_ignore_case, normalize_whitespace, SynonymSet, TextPattern};
pub use resolver::{
    Candidate, ControlResolver, InputDescriptor, InputResolver, ResolveOrder, Strategy,
};
pub use result::{SleuthError, SleuthResult};
pub use wait::{
    retry_until, wait_for_state, wait_for_url, ElementState, WaitOptions, WaitResult,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::dom::{Document, DomNode, ElementPath, HtmlSnapshot};
    pub use super::extractor::*;
    pub use super::link_check::*;
    pub use super::locator::*;
    pub use super::page::*;
    pub use super::page_object::*;
    pub use super::pages::*;
    pub use super::pattern::*;
    pub use super::resolver::*;
    pub use super::result::*;
    pub use super::wait::*;
}
