//! Suite configuration.
//!
//! Everything a scenario needs that is not page markup lives here: the base
//! URL, timeouts, the alias table for fact extraction, the named synonym
//! sets for control resolution and the link-check policy. All of it is plain
//! data, loaded once from YAML and passed down by reference.
//!
//! ```yaml
//! base_url: https://www.boschtools.com/us/en/
//! wait:
//!   timeout_ms: 15000
//! link:
//!   healthy_statuses: [200, 204, 301, 302, 403]
//! aliases:
//!   rpm: [Speed, No-load speed]
//! synonyms:
//!   consent: [accept all, { exact: ok }]
//! ```

use crate::browser::BrowserConfig;
use crate::extractor::AliasTable;
use crate::link_check::LinkPolicy;
use crate::pattern::{SynonymSet, TextPattern};
use crate::result::{SleuthError, SleuthResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Site the bundled page objects were written against
pub const DEFAULT_BASE_URL: &str = "https://www.boschtools.com/us/en/";

// =============================================================================
// SYNONYMS
// =============================================================================

/// Named synonym sets, one per control the page objects look for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Synonyms {
    /// Dealer locator entry points
    pub dealer_locator: SynonymSet,
    /// Where-to-buy controls on product pages
    pub where_to_buy: SynonymSet,
    /// Service or support menu
    pub service: SynonymSet,
    /// Tool repair entry points
    pub repair: SynonymSet,
    /// Specification tab or section toggle
    pub spec_section: SynonymSet,
    /// Cookie consent buttons
    pub consent: SynonymSet,
    /// Form submit buttons
    pub submit: SynonymSet,
}

impl Default for Synonyms {
    fn default() -> Self {
        Self {
            dealer_locator: SynonymSet::phrases(&[
                "dealer locator",
                "where to buy",
                "find a dealer",
                "store locator",
                "find a store",
                "authorized sellers",
            ]),
            where_to_buy: SynonymSet::phrases(&[
                "where to buy",
                "dealer locator",
                "find a dealer",
                "find store",
            ]),
            service: SynonymSet::phrases(&["service", "support"]),
            repair: SynonymSet::phrases(&["tool repair", "online repair service"]),
            spec_section: SynonymSet::phrases(&["specification", "specs", "technical"]),
            consent: SynonymSet::phrases(&["accept all", "accept cookies"])
                .with(TextPattern::exact("ok")),
            submit: SynonymSet::phrases(&["search", "find"])
                .with(TextPattern::exact("go"))
                .with(TextPattern::contains("submit")),
        }
    }
}

// =============================================================================
// SLEUTH CONFIG
// =============================================================================

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleuthConfig {
    /// Homepage URL; relative links are joined against it
    pub base_url: String,
    /// Polling budget for waits
    pub wait: WaitOptions,
    /// Link health policy
    pub link: LinkPolicy,
    /// Spec-key aliases for fact extraction
    pub aliases: AliasTable,
    /// Control synonym sets
    pub synonyms: Synonyms,
    /// Browser launch options
    pub browser: BrowserConfig,
}

impl Default for SleuthConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wait: WaitOptions::default(),
            link: LinkPolicy::default(),
            aliases: AliasTable::default(),
            synonyms: Synonyms::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl SleuthConfig {
    /// Default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> SleuthResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> SleuthResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            SleuthError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> SleuthResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set wait options
    #[must_use]
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the link policy
    #[must_use]
    pub fn with_link_policy(mut self, link: LinkPolicy) -> Self {
        self.link = link;
        self
    }

    /// Set the alias table
    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the synonym sets
    #[must_use]
    pub fn with_synonyms(mut self, synonyms: Synonyms) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Set browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Reject values no scenario can run with
    pub fn validate(&self) -> SleuthResult<()> {
        url::Url::parse(&self.base_url).map_err(|e| SleuthError::InvalidUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        if self.wait.poll_interval_ms == 0 {
            return Err(SleuthError::config("wait.poll_interval_ms must be positive"));
        }
        if self.link.healthy_statuses.is_empty() {
            return Err(SleuthError::config(
                "link.healthy_statuses must list at least one status",
            ));
        }
        Ok(())
    }
}
