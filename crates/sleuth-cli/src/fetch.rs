//! Loading pages for one-shot commands.
//!
//! By default a page is fetched once over HTTP and wrapped in a
//! [`StaticPage`]: no scripts run, so anything rendered client-side is
//! missing. `--browser` loads the page in Chromium instead.

use crate::error::{CliError, CliResult};
use sleuth::{Page, SleuthConfig, StaticPage};
use tracing::{debug, info};
use url::Url;

/// A page ready for snapshots, plus whatever keeps it alive
#[derive(Debug)]
pub enum LoadedPage {
    /// Fetched HTML
    Static(StaticPage),
    /// Live Chromium tab
    #[cfg(feature = "browser")]
    Browser {
        /// Owning browser
        browser: sleuth::CdpBrowser,
        /// The tab
        page: sleuth::CdpPage,
    },
}

impl LoadedPage {
    /// The page handle
    #[must_use]
    pub fn page(&self) -> &dyn Page {
        match self {
            Self::Static(page) => page,
            #[cfg(feature = "browser")]
            Self::Browser { page, .. } => page,
        }
    }

    /// Release the browser, if any
    pub async fn close(self) -> CliResult<()> {
        match self {
            Self::Static(_) => Ok(()),
            #[cfg(feature = "browser")]
            Self::Browser { browser, .. } => Ok(browser.close().await?),
        }
    }
}

/// Load `url` statically or in a browser
pub async fn load(url: &Url, config: &SleuthConfig, browser: bool) -> CliResult<LoadedPage> {
    if browser {
        return load_in_browser(url, config).await;
    }
    let page = fetch_static(url, config.link.user_agent.as_deref()).await?;
    Ok(LoadedPage::Static(page))
}

/// GET `url` and wrap the body, keyed by the final URL after redirects
pub async fn fetch_static(url: &Url, user_agent: Option<&str>) -> CliResult<StaticPage> {
    let mut builder = reqwest::Client::builder();
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    let client = builder
        .build()
        .map_err(|e| CliError::http(url.as_str(), e.to_string()))?;

    debug!(%url, "fetching page");
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| CliError::http(url.as_str(), e.to_string()))?;
    let final_url = response.url().to_string();
    let html = response
        .text()
        .await
        .map_err(|e| CliError::http(url.as_str(), e.to_string()))?;

    info!(url = %final_url, bytes = html.len(), "page fetched");
    Ok(StaticPage::loaded(final_url, html))
}

#[cfg(feature = "browser")]
async fn load_in_browser(url: &Url, config: &SleuthConfig) -> CliResult<LoadedPage> {
    let browser = sleuth::CdpBrowser::launch(config.browser.clone()).await?;
    let page = browser.new_page().await?;
    page.goto(url.as_str()).await?;
    Ok(LoadedPage::Browser { browser, page })
}

#[cfg(not(feature = "browser"))]
async fn load_in_browser(_url: &Url, _config: &SleuthConfig) -> CliResult<LoadedPage> {
    Err(CliError::invalid_argument(
        "--browser needs a build with the `browser` feature",
    ))
}
