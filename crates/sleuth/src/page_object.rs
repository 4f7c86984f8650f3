//! Page Object Model support.
//!
//! A page object wraps a borrowed [`Page`] and knows which URLs belong to it.
//! The concrete retail page objects live in [`crate::pages`].

use crate::page::Page;
use crate::pattern::TextPattern;
use crate::result::SleuthResult;
use crate::wait::{wait_for_url, WaitOptions};
use async_trait::async_trait;
use tracing::debug;

/// Default time a page object waits for its URL
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Trait for page objects representing a page or component in the UI.
///
/// # Example
///
/// ```ignore
/// struct RepairPage<'a, P: ?Sized> {
///     page: &'a P,
/// }
///
/// impl<P: Page + ?Sized> PageObject for RepairPage<'_, P> {
///     type Target = P;
///
///     fn page(&self) -> &P {
///         self.page
///     }
///
///     fn url_pattern(&self) -> &str {
///         "repair"
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Page handle type
    type Target: Page + ?Sized;

    /// The page this object drives
    fn page(&self) -> &Self::Target;

    /// Case-insensitive regex matched against the URL
    fn url_pattern(&self) -> &str;

    /// Wait time for page load (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        DEFAULT_LOAD_TIMEOUT_MS
    }

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the page is currently on one of this object's URLs
    async fn is_current(&self) -> SleuthResult<bool> {
        let url = self.page().url().await?;
        Ok(TextPattern::regex(self.url_pattern())?.matches(&url))
    }

    /// Wait until the URL belongs to this object, returning it
    async fn wait_until_loaded(&self) -> SleuthResult<String> {
        let pattern = TextPattern::regex(self.url_pattern())?;
        let options = WaitOptions::new().with_timeout(self.load_timeout_ms());
        let url = wait_for_url(self.page(), &pattern, &options).await?;
        debug!(page = self.page_name(), %url, "page loaded");
        Ok(url)
    }
}
