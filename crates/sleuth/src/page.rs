//! Page abstraction.
//!
//! A [`Page`] is the live side of the read-first, act-second split: resolvers
//! inspect an [`HtmlSnapshot`] taken from [`Page::content`], then the caller
//! replays one action on the page through the candidate's [`ElementPath`].
//!
//! # Implementations
//!
//! - [`StaticPage`] - in-memory pages with scripted transitions, for tests and
//!   for the CLI, which fetches HTML over HTTP
//! - `CdpPage` - live Chromium (feature `browser`)

use crate::dom::{Document, DomNode, ElementPath, HtmlSnapshot};
use crate::result::{SleuthError, SleuthResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use url::Url;

/// URL reported before any navigation
pub const BLANK_URL: &str = "about:blank";

/// Browser-like page handle
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate to URL
    async fn goto(&self, url: &str) -> SleuthResult<()>;

    /// Current URL
    async fn url(&self) -> SleuthResult<String>;

    /// Document title
    async fn title(&self) -> SleuthResult<String>;

    /// Serialized DOM
    async fn content(&self) -> SleuthResult<String>;

    /// Click an element
    async fn click(&self, target: &ElementPath) -> SleuthResult<()>;

    /// Replace an input's value
    async fn fill(&self, target: &ElementPath, value: &str) -> SleuthResult<()>;

    /// Press a key while an element has focus (e.g. "Enter")
    async fn press(&self, target: &ElementPath, key: &str) -> SleuthResult<()>;

    /// Check a checkbox
    async fn check(&self, target: &ElementPath) -> SleuthResult<()>;
}

/// Take a fresh snapshot of the page.
///
/// The snapshot borrows nothing from the page and should be dropped before
/// the next `.await`; hold on to [`ElementPath`]s instead.
pub async fn snapshot<P: Page + ?Sized>(page: &P) -> SleuthResult<HtmlSnapshot> {
    let markup = page.content().await?;
    Ok(HtmlSnapshot::parse(&markup))
}

// =============================================================================
// STATIC PAGE
// =============================================================================

/// Action recorded by [`StaticPage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    /// Navigation
    Goto(String),
    /// Click
    Click(ElementPath),
    /// Fill
    Fill {
        /// Target
        target: ElementPath,
        /// Value typed
        value: String,
    },
    /// Key press
    Press {
        /// Target
        target: ElementPath,
        /// Key name
        key: String,
    },
    /// Checkbox check
    Check(ElementPath),
}

#[derive(Debug, Clone)]
struct Transition {
    from: String,
    css: String,
    to: String,
}

#[derive(Debug, Default)]
struct StaticState {
    current: Option<String>,
    actions: Vec<PageAction>,
}

/// In-memory [`Page`] over a fixed set of HTML documents.
///
/// Clicking an anchor navigates when its resolved href is registered.
/// Any action on an element matching a transition's selector navigates to the
/// transition's target, which is how forms and menus are scripted.
#[derive(Debug, Default)]
pub struct StaticPage {
    pages: HashMap<String, String>,
    transitions: Vec<Transition>,
    state: Mutex<StaticState>,
}

impl StaticPage {
    /// Empty page set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single page already loaded at `url`
    #[must_use]
    pub fn loaded(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let page = Self::new().with_page(url.clone(), html);
        if let Ok(mut state) = page.state.lock() {
            state.current = Some(url);
        }
        page
    }

    /// Register a document
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let _ = self.pages.insert(url.into(), html.into());
        self
    }

    /// Acting on an element matching `css` while at `from` navigates to `to`
    #[must_use]
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        css: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.transitions.push(Transition {
            from: from.into(),
            css: css.into(),
            to: to.into(),
        });
        self
    }

    /// Recorded actions, oldest first
    #[must_use]
    pub fn actions(&self) -> Vec<PageAction> {
        self.state
            .lock()
            .map(|s| s.actions.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> SleuthResult<std::sync::MutexGuard<'_, StaticState>> {
        self.state
            .lock()
            .map_err(|_| SleuthError::page("static page state poisoned"))
    }

    fn current_html(&self, state: &StaticState) -> Option<&str> {
        state
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .map(String::as_str)
    }

    /// Record `action` against `target` and follow any navigation it causes
    fn act(&self, target: &ElementPath, action: PageAction, follow_href: bool) -> SleuthResult<()> {
        let mut state = self.lock()?;
        let current = state
            .current
            .clone()
            .ok_or_else(|| SleuthError::page("no page loaded"))?;
        let html = self
            .current_html(&state)
            .ok_or_else(|| SleuthError::page(format!("no document for {current}")))?;

        let doc = HtmlSnapshot::parse(html);
        let node = doc
            .resolve(target)?
            .ok_or_else(|| SleuthError::page(format!("element {target} is detached")))?;

        let mut next = None;
        for transition in self.transitions.iter().filter(|t| t.from == current) {
            if doc.select(&transition.css)?.contains(&node) {
                next = Some(transition.to.clone());
                break;
            }
        }
        if next.is_none() && follow_href && node.tag_name() == "a" {
            next = node
                .attribute("href")
                .and_then(|href| Url::parse(&current).ok()?.join(&href).ok())
                .map(String::from)
                .filter(|url| self.pages.contains_key(url));
        }

        debug!(?action, navigates_to = ?next, "static page action");
        state.actions.push(action);
        if let Some(url) = next {
            state.current = Some(url);
        }
        Ok(())
    }
}

#[async_trait]
impl Page for StaticPage {
    async fn goto(&self, url: &str) -> SleuthResult<()> {
        if !self.pages.contains_key(url) {
            return Err(SleuthError::Navigation {
                url: url.to_string(),
                message: "no such page".to_string(),
            });
        }
        let mut state = self.lock()?;
        state.actions.push(PageAction::Goto(url.to_string()));
        state.current = Some(url.to_string());
        Ok(())
    }

    async fn url(&self) -> SleuthResult<String> {
        let state = self.lock()?;
        Ok(state.current.clone().unwrap_or_else(|| BLANK_URL.to_string()))
    }

    async fn title(&self) -> SleuthResult<String> {
        let markup = self.content().await?;
        Ok(HtmlSnapshot::parse(&markup).title().unwrap_or_default())
    }

    async fn content(&self) -> SleuthResult<String> {
        let state = self.lock()?;
        Ok(self
            .current_html(&state)
            .unwrap_or("<html><head></head><body></body></html>")
            .to_string())
    }

    async fn click(&self, target: &ElementPath) -> SleuthResult<()> {
        self.act(target, PageAction::Click(target.clone()), true)
    }

    async fn fill(&self, target: &ElementPath, value: &str) -> SleuthResult<()> {
        let action = PageAction::Fill {
            target: target.clone(),
            value: value.to_string(),
        };
        let mut state = self.lock()?;
        let html = self
            .current_html(&state)
            .ok_or_else(|| SleuthError::page("no page loaded"))?;
        let doc = HtmlSnapshot::parse(html);
        let node = doc
            .resolve(target)?
            .ok_or_else(|| SleuthError::page(format!("element {target} is detached")))?;
        if node.is_disabled() {
            return Err(SleuthError::page(format!("element {target} is disabled")));
        }
        state.actions.push(action);
        Ok(())
    }

    async fn press(&self, target: &ElementPath, key: &str) -> SleuthResult<()> {
        let action = PageAction::Press {
            target: target.clone(),
            key: key.to_string(),
        };
        self.act(target, action, false)
    }

    async fn check(&self, target: &ElementPath) -> SleuthResult<()> {
        self.act(target, PageAction::Check(target.clone()), false)
    }
}
