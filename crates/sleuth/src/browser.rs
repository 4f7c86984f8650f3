//! Live Chromium pages over the Chrome `DevTools` Protocol.
//!
//! [`BrowserConfig`] is always available so it can live in configuration files.
//! The CDP implementation itself needs the `browser` feature.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Phone-sized viewport, which is what exposes mobile navigation toggles
    #[must_use]
    pub fn mobile() -> Self {
        Self::default().with_viewport(390, 844)
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// CDP implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::dom::{ElementPath, HIDDEN_MARKER};
    use crate::page::{Page, BLANK_URL};
    use crate::result::{SleuthError, SleuthResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
    use chromiumoxide::element::Element;
    use futures::StreamExt;
    use tracing::debug;

    /// Stamps the hidden marker on every element that has no box or is
    /// styled invisible, and clears stale markers from earlier snapshots
    fn mark_hidden_script() -> String {
        format!(
            r"(() => {{
                for (const el of document.querySelectorAll('[{HIDDEN_MARKER}]')) {{
                    el.removeAttribute('{HIDDEN_MARKER}');
                }}
                if (!document.body) return 0;
                let marked = 0;
                for (const el of document.body.querySelectorAll('*')) {{
                    const style = getComputedStyle(el);
                    const rect = el.getBoundingClientRect();
                    const noBox = rect.width === 0 && rect.height === 0 && style.display !== 'contents';
                    if (style.display === 'none' || style.visibility === 'hidden'
                        || style.visibility === 'collapse' || noBox) {{
                        el.setAttribute('{HIDDEN_MARKER}', '1');
                        marked += 1;
                    }}
                }}
                return marked;
            }})()"
        )
    }

    fn page_error(e: impl std::fmt::Display) -> SleuthError {
        SleuthError::page(e.to_string())
    }

    /// Running Chromium instance
    #[derive(Debug)]
    pub struct CdpBrowser {
        config: BrowserConfig,
        browser: Browser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl CdpBrowser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> SleuthResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| SleuthError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                Browser::launch(cdp_config)
                    .await
                    .map_err(|e| SleuthError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(Self {
                config,
                browser,
                handle,
            })
        }

        /// Open a blank tab
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self) -> SleuthResult<CdpPage> {
            let inner = self.browser.new_page(BLANK_URL).await.map_err(page_error)?;
            Ok(CdpPage { inner })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        ///
        /// # Errors
        ///
        /// Returns error if the browser refuses to close
        pub async fn close(mut self) -> SleuthResult<()> {
            self.browser.close().await.map_err(page_error)?;
            self.handle.abort();
            Ok(())
        }
    }

    /// [`Page`] backed by a Chromium tab
    #[derive(Debug, Clone)]
    pub struct CdpPage {
        inner: chromiumoxide::Page,
    }

    impl CdpPage {
        async fn element(&self, target: &ElementPath) -> SleuthResult<Element> {
            self.inner
                .find_element(target.as_css())
                .await
                .map_err(|e| SleuthError::page(format!("element {target} is detached: {e}")))
        }

        async fn eval_on(&self, target: &ElementPath, body: &str) -> SleuthResult<serde_json::Value> {
            let selector = serde_json::to_string(target.as_css())?;
            let script = format!("(() => {{ const el = document.querySelector({selector}); {body} }})()");
            self.inner
                .evaluate(script)
                .await
                .map_err(page_error)?
                .into_value()
                .map_err(page_error)
        }
    }

    #[async_trait]
    impl Page for CdpPage {
        async fn goto(&self, url: &str) -> SleuthResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| SleuthError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn url(&self) -> SleuthResult<String> {
            Ok(self
                .inner
                .url()
                .await
                .map_err(page_error)?
                .unwrap_or_else(|| BLANK_URL.to_string()))
        }

        async fn title(&self) -> SleuthResult<String> {
            Ok(self.inner.get_title().await.map_err(page_error)?.unwrap_or_default())
        }

        async fn content(&self) -> SleuthResult<String> {
            let marked: serde_json::Value = self
                .inner
                .evaluate(mark_hidden_script())
                .await
                .map_err(page_error)?
                .into_value()
                .map_err(page_error)?;
            debug!(%marked, "marked hidden elements");
            self.inner.content().await.map_err(page_error)
        }

        async fn click(&self, target: &ElementPath) -> SleuthResult<()> {
            self.element(target).await?.click().await.map_err(page_error)?;
            Ok(())
        }

        async fn fill(&self, target: &ElementPath, value: &str) -> SleuthResult<()> {
            let element = self.element(target).await?;
            let _ = self
                .eval_on(target, "if (el) { el.value = ''; } return true;")
                .await?;
            element.click().await.map_err(page_error)?;
            element.type_str(value).await.map_err(page_error)?;
            Ok(())
        }

        async fn press(&self, target: &ElementPath, key: &str) -> SleuthResult<()> {
            let element = self.element(target).await?;
            element.focus().await.map_err(page_error)?;
            element.press_key(key).await.map_err(page_error)?;
            Ok(())
        }

        async fn check(&self, target: &ElementPath) -> SleuthResult<()> {
            let checked = self
                .eval_on(target, "return !!(el && el.checked);")
                .await?;
            if checked != serde_json::Value::Bool(true) {
                self.click(target).await?;
            }
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{CdpBrowser, CdpPage};
