//! Product detail page: essentials, specifications, where-to-buy and
//! accessory cross-selling.

use super::{any_visible, capped, first_visible, wait_visible};
use crate::config::SleuthConfig;
use crate::dom::{Document, DomNode, HtmlSnapshot};
use crate::extractor::{Fact, FactExtractor};
use crate::locator::{Role, SearchScope, Selector};
use crate::page::{snapshot, Page};
use crate::page_object::PageObject;
use crate::pattern::TextPattern;
use crate::resolver::{Candidate, ControlResolver, Strategy};
use crate::result::{SleuthError, SleuthResult};
use crate::wait::retry_until;
use regex::RegexBuilder;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

const PRODUCT_URL_PATTERN: &str = "/products?/";

const PRODUCT_TITLE: &str = r#"h1, .product-title, [data-testid="product-title"]"#;
const PRODUCT_IMAGE: &str =
    r#"img[alt][src*="product"], img.product-image, [data-testid="product-image"]"#;
const MODEL_NUMBER_TESTID: &str = r#"[data-testid="model-number"]"#;

/// Labelled model identifiers, tried in order; group 1 is the identifier
const MODEL_NUMBER_PATTERNS: &[&str] = &[
    r"\bModel\b\s*:?\s*([A-Za-z0-9-]+)",
    r"\bSKU\b\s*:?\s*([A-Za-z0-9-]+)",
    r"\bPart No\.?\s*:?\s*([A-Za-z0-9-]+)",
    r"\bProduct Number\b\s*:?\s*([A-Za-z0-9-]+)",
];

const DEALER_URL_PATTERN: &str = "dealer|where-to-buy|store-locator";
const DEALER_DIALOG: &str = r#"[role="dialog"], dialog, .modal"#;
const DEALER_DIALOG_TEXT: &str = "authorized sellers|dealer locator|where to buy";

const ACCESSORY_HEADINGS: &[&str] = &["Related Accessories", "Accessories", "You may also like"];
const ACCESSORY_TILES: &str = r#"[data-testid*="accessory"], .accessory-tile, .product-tile"#;
const PRODUCT_LINK_PATTERN: &str = "/products?/";
const MAX_ACCESSORY_TILES: usize = 10;

const ESSENTIALS_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// OUTCOMES
// =============================================================================

/// Where the where-to-buy control led
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum WhereToBuyDestination {
    /// A dealer page, by URL
    Page(String),
    /// A dialog on the product page, by its text
    Modal(String),
}

/// Accessory cross-selling check.
///
/// A page without an accessory section, or with a section but no tiles, is
/// skipped rather than failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum AccessoryCheck {
    /// No accessory heading on the page
    NoSection,
    /// Heading present, no tiles near it
    NoTiles {
        /// Heading text
        heading: String,
    },
    /// A visible tile links to a product page
    Linked {
        /// Heading text
        heading: String,
        /// The tile's product link
        href: String,
    },
    /// Tiles present, none linking to a product page
    Unlinked {
        /// Heading text
        heading: String,
        /// Tiles inspected
        checked: usize,
    },
}

impl AccessoryCheck {
    /// True when there was nothing to check
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::NoSection | Self::NoTiles { .. })
    }

    /// Fail if tiles exist but none links to a product page
    pub fn ensure(&self) -> SleuthResult<()> {
        match self {
            Self::Unlinked { heading, checked } => Err(SleuthError::assertion(format!(
                "none of {checked} tiles under '{heading}' links to a product page"
            ))),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// PRODUCT PAGE
// =============================================================================

/// Product detail page object
#[derive(Debug)]
pub struct ProductPage<'a, P: ?Sized> {
    page: &'a P,
    config: &'a SleuthConfig,
    extractor: FactExtractor,
}

impl<'a, P: Page + ?Sized> ProductPage<'a, P> {
    /// Bind to a page
    #[must_use]
    pub fn new(page: &'a P, config: &'a SleuthConfig) -> Self {
        Self {
            page,
            config,
            extractor: FactExtractor::new(config.aliases.clone()),
        }
    }

    /// Open a product URL
    pub async fn goto(&self, url: &str) -> SleuthResult<()> {
        self.page.goto(url).await
    }

    /// Click the specification tab, button or text if the page has one.
    ///
    /// Returns `None` when nothing matched; the specifications are then
    /// assumed to be on screen already.
    pub async fn open_specification_section(&self) -> SleuthResult<Option<Candidate>> {
        let resolver = ControlResolver::new().with_strategies(vec![
            Strategy::Role(Role::Tab),
            Strategy::Role(Role::Button),
            Strategy::Text,
        ]);
        let found = {
            let doc = snapshot(self.page).await?;
            resolver.resolve(
                &doc,
                "specification section",
                &self.config.synonyms.spec_section,
                &SearchScope::anywhere(),
            )
        };
        match found {
            Ok(toggle) => {
                self.page.click(&toggle.path).await?;
                Ok(Some(toggle))
            }
            Err(e) if e.is_not_found_like() => {
                debug!("no specification toggle, assuming section is open");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Extract a specification value, e.g. `rpm` or `Weight`
    pub async fn specification_value(&self, key: &str) -> SleuthResult<Fact> {
        let doc = snapshot(self.page).await?;
        self.extractor.extract(&doc, key)
    }

    /// Click the where-to-buy control: button, then link, then any text
    pub async fn click_where_to_buy(&self) -> SleuthResult<Candidate> {
        let resolver = ControlResolver::new().with_strategies(vec![
            Strategy::Role(Role::Button),
            Strategy::Role(Role::Link),
            Strategy::Text,
        ]);
        let scope = SearchScope::anywhere();
        let synonyms = &self.config.synonyms.where_to_buy;
        let control = retry_until(self.page, &self.config.wait, |doc| {
            resolver.resolve(doc, "where to buy", synonyms, &scope)
        })
        .await?;
        self.page.click(&control.path).await?;
        Ok(control)
    }

    /// Wait for a dealer page URL or a dealer dialog after
    /// [`ProductPage::click_where_to_buy`]
    pub async fn assert_where_to_buy_destination(&self) -> SleuthResult<WhereToBuyDestination> {
        let url_pattern = TextPattern::regex(DEALER_URL_PATTERN)?;
        let dialog = Selector::has_text(DEALER_DIALOG, TextPattern::regex(DEALER_DIALOG_TEXT)?);
        let options = &self.config.wait;
        let start = Instant::now();
        loop {
            let url = self.page.url().await?;
            if url_pattern.matches(&url) {
                info!(%url, "where-to-buy opened a dealer page");
                return Ok(WhereToBuyDestination::Page(url));
            }
            let modal = {
                let doc = snapshot(self.page).await?;
                any_visible(&doc, &dialog)?
            };
            if let Some(modal) = modal {
                info!(text = %modal.text, "where-to-buy opened a dialog");
                return Ok(WhereToBuyDestination::Modal(modal.text));
            }
            if start.elapsed() >= options.timeout() {
                return Err(SleuthError::assertion(format!(
                    "dealer locator dialog or page did not appear (still at {url})"
                )));
            }
            tokio::time::sleep(options.poll_interval()).await;
        }
    }

    /// Wait for a visible product title
    pub async fn assert_title_visible(&self) -> SleuthResult<Candidate> {
        let options = capped(&self.config.wait, ESSENTIALS_TIMEOUT_MS);
        wait_visible(self.page, &Selector::css(PRODUCT_TITLE), &options).await
    }

    /// Wait for a product image with a source to be attached
    pub async fn assert_image_present(&self) -> SleuthResult<Candidate> {
        let options = capped(&self.config.wait, ESSENTIALS_TIMEOUT_MS);
        retry_until(self.page, &options, |doc| {
            let image = doc
                .select(PRODUCT_IMAGE)?
                .into_iter()
                .next()
                .ok_or_else(|| SleuthError::not_found("product image", Vec::new()))?;
            let has_source = image.tag_name() != "img"
                || image.attribute("src").is_some_and(|src| !src.trim().is_empty());
            if has_source {
                Ok(Candidate::from_node(&image, "anywhere", format!("css={PRODUCT_IMAGE}")))
            } else {
                Err(SleuthError::not_found(
                    "product image",
                    vec!["image has no source".to_string()],
                ))
            }
        })
        .await
    }

    /// Read the model number: a dedicated element first, then the first
    /// visible "Model", "SKU", "Part No." or "Product Number" label
    pub async fn model_number(&self) -> SleuthResult<String> {
        let doc = snapshot(self.page).await?;
        model_number_in(&doc)
    }

    /// Check the accessory section links to at least one product page
    pub async fn accessories(&self) -> SleuthResult<AccessoryCheck> {
        let doc = snapshot(self.page).await?;
        let check = accessories_in(&doc)?;
        info!(?check, "accessory section checked");
        Ok(check)
    }
}

impl<P: Page + ?Sized> PageObject for ProductPage<'_, P> {
    type Target = P;

    fn page(&self) -> &P {
        self.page
    }

    fn url_pattern(&self) -> &str {
        PRODUCT_URL_PATTERN
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config.wait.timeout_ms
    }
}

// =============================================================================
// SNAPSHOT QUERIES
// =============================================================================

fn model_number_in(doc: &HtmlSnapshot) -> SleuthResult<String> {
    if let Ok(element) = first_visible(doc, &Selector::css(MODEL_NUMBER_TESTID)) {
        if !element.text.is_empty() {
            return Ok(element.text);
        }
    }

    for source in MODEL_NUMBER_PATTERNS {
        let re = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| SleuthError::InvalidPattern {
                pattern: (*source).to_string(),
                message: e.to_string(),
            })?;
        let label = Selector::text(TextPattern::Regex(re.clone()));
        let Some(element) = any_visible(doc, &label)? else {
            continue;
        };
        if let Some(model) = re
            .captures(&element.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        {
            return Ok(model);
        }
    }

    Err(SleuthError::not_found(
        "model number",
        MODEL_NUMBER_PATTERNS.iter().map(|p| format!("tried /{p}/i")).collect(),
    ))
}

fn accessories_in(doc: &HtmlSnapshot) -> SleuthResult<AccessoryCheck> {
    let product_link = TextPattern::regex(PRODUCT_LINK_PATTERN)?;

    for phrase in ACCESSORY_HEADINGS {
        let Some(label) = Selector::text(TextPattern::contains(*phrase))
            .query(doc)?
            .into_iter()
            .find(|n| n.is_visible())
        else {
            continue;
        };
        let heading = label.normalized_text();

        let mut ancestor = label.parent();
        while let Some(section) = ancestor {
            if matches!(section.tag_name().as_str(), "section" | "div") {
                let tiles = doc.select_within(&section, ACCESSORY_TILES)?;
                if !tiles.is_empty() {
                    let checked = tiles.len().min(MAX_ACCESSORY_TILES);
                    for tile in tiles.iter().take(MAX_ACCESSORY_TILES) {
                        if !tile.is_visible() || tile.is_disabled() {
                            continue;
                        }
                        let href = match tile.attribute("href") {
                            Some(href) => Some(href),
                            None => doc
                                .select_within(tile, "a[href]")?
                                .first()
                                .and_then(|a| a.attribute("href")),
                        };
                        if let Some(href) = href.filter(|h| product_link.matches(h)) {
                            return Ok(AccessoryCheck::Linked { heading, href });
                        }
                    }
                    return Ok(AccessoryCheck::Unlinked { heading, checked });
                }
            }
            ancestor = section.parent();
        }
        return Ok(AccessoryCheck::NoTiles { heading });
    }

    Ok(AccessoryCheck::NoSection)
}
