//! Wait primitives.
//!
//! Resolvers and extractors answer from a single snapshot and never retry.
//! Polling over time lives here: each poll takes a fresh snapshot, so a
//! condition is always evaluated against the current DOM.

use crate::dom::{Document, DomNode, HtmlSnapshot};
use crate::page::{snapshot, Page};
use crate::pattern::TextPattern;
use crate::result::{SleuthError, SleuthResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// ELEMENT STATE
// =============================================================================

/// Element states a wait can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    /// At least one match in the DOM
    Attached,
    /// No match in the DOM
    Detached,
    /// At least one visible match
    #[default]
    Visible,
    /// No visible match
    Hidden,
}

impl ElementState {
    /// State name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }

    /// Whether `doc` is in this state for `css`
    ///
    /// # Errors
    ///
    /// Invalid selectors.
    pub fn holds<D: Document>(self, doc: &D, css: &str) -> SleuthResult<bool> {
        let found = doc.select(css)?;
        Ok(match self {
            Self::Attached => !found.is_empty(),
            Self::Detached => found.is_empty(),
            Self::Visible => found.iter().any(|el| el.is_visible()),
            Self::Hidden => !found.iter().any(|el| el.is_visible()),
        })
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITS
// =============================================================================

/// Re-run `probe` on fresh snapshots until it succeeds.
///
/// Not-found-like errors are retried until the deadline and then returned
/// as-is, so their diagnostics reach the caller. Any other error is returned
/// immediately.
pub async fn retry_until<P, T, F>(page: &P, options: &WaitOptions, probe: F) -> SleuthResult<T>
where
    P: Page + ?Sized,
    F: Fn(&HtmlSnapshot) -> SleuthResult<T>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        let attempt = {
            let doc = snapshot(page).await?;
            probe(&doc)
        };
        match attempt {
            Ok(value) => return Ok(value),
            Err(e) if e.is_not_found_like() && Instant::now() < deadline => {
                debug!(error = %e, "retrying after poll interval");
                tokio::time::sleep(options.poll_interval()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Wait until elements matching `css` reach `state`.
///
/// # Errors
///
/// [`SleuthError::Timeout`] when the deadline passes first.
pub async fn wait_for_state<P: Page + ?Sized>(
    page: &P,
    css: &str,
    state: ElementState,
    options: &WaitOptions,
) -> SleuthResult<WaitResult> {
    let start = Instant::now();
    let waited_for = format!("`{css}` to be {state}");
    loop {
        let reached = {
            let doc = snapshot(page).await?;
            state.holds(&doc, css)?
        };
        if reached {
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                waited_for,
            });
        }
        if start.elapsed() >= options.timeout() {
            return Err(SleuthError::Timeout {
                what: waited_for,
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Wait until the page URL matches, returning it.
///
/// # Errors
///
/// [`SleuthError::Timeout`] when the deadline passes first.
pub async fn wait_for_url<P: Page + ?Sized>(
    page: &P,
    pattern: &TextPattern,
    options: &WaitOptions,
) -> SleuthResult<String> {
    let start = Instant::now();
    loop {
        let url = page.url().await?;
        if pattern.matches(&url) {
            return Ok(url);
        }
        if start.elapsed() >= options.timeout() {
            return Err(SleuthError::Timeout {
                what: format!("URL matching {pattern} (last: {url})"),
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    const URL: &str = "https://example.com/";

    fn quick() -> WaitOptions {
        WaitOptions::new().with_timeout(120).with_poll_interval(10)
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_states_against_snapshot() {
            let doc = HtmlSnapshot::parse("<div id='map' hidden></div><ul class='dealers'></ul>");
            assert!(ElementState::Attached.holds(&doc, "#map").unwrap());
            assert!(ElementState::Hidden.holds(&doc, "#map").unwrap());
            assert!(ElementState::Visible.holds(&doc, ".dealers").unwrap());
            assert!(ElementState::Detached.holds(&doc, "iframe").unwrap());
        }

        #[test]
        fn test_default_state_is_visible() {
            assert_eq!(ElementState::default(), ElementState::Visible);
            assert_eq!(ElementState::default().to_string(), "visible");
        }

        #[test]
        fn test_options_builder() {
            let options = WaitOptions::new().with_timeout(1500).with_poll_interval(25);
            assert_eq!(options.timeout(), Duration::from_millis(1500));
            assert_eq!(options.poll_interval(), Duration::from_millis(25));
            assert_eq!(WaitOptions::default().timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
        }
    }

    mod async_wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_state_succeeds() {
            let page = StaticPage::loaded(URL, "<footer><a href='/'>Home</a></footer>");
            let result = wait_for_state(&page, "footer", ElementState::Visible, &quick())
                .await
                .unwrap();
            assert!(result.waited_for.contains("visible"));
        }

        #[tokio::test]
        async fn test_wait_for_state_times_out() {
            let page = StaticPage::loaded(URL, "<main></main>");
            let err = wait_for_state(&page, "footer", ElementState::Attached, &quick())
                .await
                .unwrap_err();
            assert!(matches!(err, SleuthError::Timeout { ms: 120, .. }));
        }

        #[tokio::test]
        async fn test_retry_until_returns_last_not_found() {
            let page = StaticPage::loaded(URL, "<main></main>");
            let err = retry_until(&page, &quick(), |doc| {
                let found = doc.select("footer")?;
                if found.is_empty() {
                    Err(SleuthError::not_found("footer", vec!["main".into()]))
                } else {
                    Ok(found.len())
                }
            })
            .await
            .unwrap_err();
            assert_eq!(err.diagnostics(), ["main"]);
        }

        #[tokio::test]
        async fn test_retry_until_does_not_retry_other_errors() {
            let page = StaticPage::loaded(URL, "<main></main>");
            let options = WaitOptions::new().with_timeout(60_000);
            let err = retry_until(&page, &options, |doc| doc.select("a[").map(|v| v.len()))
                .await
                .unwrap_err();
            assert!(matches!(err, SleuthError::InvalidSelector { .. }));
        }

        #[tokio::test]
        async fn test_wait_for_url() {
            let page = StaticPage::loaded("https://example.com/search?q=drill", "<h1>x</h1>");
            let pattern = TextPattern::regex(r"search|\?q=").unwrap();
            let url = wait_for_url(&page, &pattern, &quick()).await.unwrap();
            assert!(url.ends_with("q=drill"));

            let repair = TextPattern::regex("repair").unwrap();
            let err = wait_for_url(&page, &repair, &quick()).await.unwrap_err();
            assert!(err.is_not_found_like());
        }
    }
}
