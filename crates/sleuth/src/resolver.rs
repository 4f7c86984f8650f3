//! Candidate control and input resolution.
//!
//! [`ControlResolver`] walks a [`SynonymSet`] against a [`SearchScope`] and a
//! chain of query [`Strategy`]s, returning the first visible hit. Nothing is
//! clicked here: the caller replays the action through the returned
//! [`Candidate::path`].
//!
//! [`InputResolver`] is the form-field specialization. It differs in one
//! important way: within a descriptor it scans *every* match, so a disabled
//! or hidden decoy earlier in the DOM does not shadow the real field.

use crate::dom::{visible_anchor_texts, Document, DomNode, ElementPath};
use crate::locator::{Region, Role, SearchScope, Selector};
use crate::pattern::{SynonymSet, TextPattern};
use crate::result::{SleuthError, SleuthResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

// =============================================================================
// STRATEGIES
// =============================================================================

/// One query tried for every (synonym, region) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Elements with this role whose accessible name matches
    Role(Role),
    /// Innermost element whose text matches
    Text,
}

impl Strategy {
    fn selector(self, pattern: &TextPattern) -> Selector {
        match self {
            Self::Role(role) => Selector::role(role, pattern.clone()),
            Self::Text => Selector::text(pattern.clone()),
        }
    }

    /// Link, then button, then text
    #[must_use]
    pub fn default_chain() -> Vec<Self> {
        vec![Self::Role(Role::Link), Self::Role(Role::Button), Self::Text]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role={role}"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Nesting order of the synonym and region loops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveOrder {
    /// Synonyms outer, regions inner: a better synonym anywhere beats a
    /// weaker synonym in a narrow region
    #[default]
    SynonymMajor,
    /// Regions outer, synonyms inner: any synonym in the header beats the
    /// best synonym in the footer
    ScopeMajor,
}

// =============================================================================
// CANDIDATE
// =============================================================================

/// A resolved element, detached from the snapshot it was found in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Structural path for replaying an action
    pub path: ElementPath,
    /// Lower-case tag name
    pub tag: String,
    /// Normalized text content
    pub text: String,
    /// Region the match came from
    pub region: String,
    /// Query that produced it
    pub matched_by: String,
}

impl Candidate {
    pub(crate) fn from_node<N: DomNode>(node: &N, region: &str, matched_by: String) -> Self {
        Self {
            path: node.path(),
            tag: node.tag_name(),
            text: node.normalized_text(),
            region: region.to_string(),
            matched_by,
        }
    }
}

// =============================================================================
// CONTROL RESOLVER
// =============================================================================

/// Synonym × region × strategy search for a clickable control
#[derive(Debug, Clone)]
pub struct ControlResolver {
    strategies: Vec<Strategy>,
    order: ResolveOrder,
}

impl Default for ControlResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlResolver {
    /// Resolver with the link → button → text chain, synonym-major
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Strategy::default_chain(),
            order: ResolveOrder::default(),
        }
    }

    /// Replace the strategy chain
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Set the loop nesting order
    #[must_use]
    pub const fn with_order(mut self, order: ResolveOrder) -> Self {
        self.order = order;
        self
    }

    /// Strategy chain in use
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Resolve the first visible control.
    ///
    /// For each (synonym, region) pair every strategy is queried and only the
    /// first match of each query is considered; it is accepted if visible.
    ///
    /// # Errors
    ///
    /// [`SleuthError::NotFound`] listing every visible anchor text when all
    /// pairs are exhausted. Invalid region selectors propagate as
    /// [`SleuthError::InvalidSelector`].
    pub fn resolve<D: Document>(
        &self,
        doc: &D,
        what: &str,
        synonyms: &SynonymSet,
        scope: &SearchScope,
    ) -> SleuthResult<Candidate> {
        for (pattern, region) in self.pairs(synonyms, scope) {
            if let Some(found) = self.try_pair(doc, pattern, region)? {
                info!(what, path = %found.path, via = %found.matched_by, region = %found.region, "resolved control");
                return Ok(found);
            }
        }

        let diagnostics = visible_anchor_texts(doc);
        warn!(what, anchors = ?diagnostics, "control not found");
        Err(SleuthError::not_found(what, diagnostics))
    }

    fn pairs<'s>(
        &self,
        synonyms: &'s SynonymSet,
        scope: &'s SearchScope,
    ) -> Vec<(&'s TextPattern, &'s Region)> {
        match self.order {
            ResolveOrder::SynonymMajor => synonyms
                .patterns()
                .iter()
                .flat_map(|p| scope.regions().iter().map(move |r| (p, r)))
                .collect(),
            ResolveOrder::ScopeMajor => scope
                .regions()
                .iter()
                .flat_map(|r| synonyms.patterns().iter().map(move |p| (p, r)))
                .collect(),
        }
    }

    fn try_pair<D: Document>(
        &self,
        doc: &D,
        pattern: &TextPattern,
        region: &Region,
    ) -> SleuthResult<Option<Candidate>> {
        for strategy in &self.strategies {
            let selector = strategy.selector(pattern);
            let first = region.query(doc, &selector)?.into_iter().next();
            match first {
                Some(node) if node.is_visible() => {
                    return Ok(Some(Candidate::from_node(
                        &node,
                        &region.name,
                        selector.to_string(),
                    )));
                }
                Some(_) => debug!(%selector, region = %region.name, "first match hidden"),
                None => debug!(%selector, region = %region.name, "no match"),
            }
        }
        Ok(None)
    }
}

// =============================================================================
// INPUT RESOLVER
// =============================================================================

/// One way of recognizing an input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    /// Name used in logs
    pub label: String,
    /// CSS selector for the field
    pub css: String,
}

impl InputDescriptor {
    /// Create a descriptor
    #[must_use]
    pub fn new(label: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            css: css.into(),
        }
    }

    /// ZIP / postal-code field descriptors in priority order
    #[must_use]
    pub fn zip_code() -> Vec<Self> {
        vec![
            Self::new("placeholder ZIP", r#"input[placeholder*="ZIP" i]"#),
            Self::new("aria-label ZIP", r#"input[aria-label*="ZIP" i]"#),
            Self::new("name zip", r#"input[name*="zip" i]"#),
            Self::new("search input", r#"input[type="search"]"#),
            Self::new("text input", r#"input[type="text"]"#),
        ]
    }
}

/// First visible, enabled input across prioritized descriptors
#[derive(Debug, Clone)]
pub struct InputResolver {
    descriptors: Vec<InputDescriptor>,
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new(InputDescriptor::zip_code())
    }
}

impl InputResolver {
    /// Create from descriptors in priority order
    #[must_use]
    pub fn new(descriptors: Vec<InputDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Descriptors in priority order
    #[must_use]
    pub fn descriptors(&self) -> &[InputDescriptor] {
        &self.descriptors
    }

    /// Resolve the first usable input field.
    ///
    /// # Errors
    ///
    /// [`SleuthError::NotFound`] with one line per visible input describing
    /// its placeholder, name and aria-label.
    pub fn resolve<D: Document>(&self, doc: &D, what: &str) -> SleuthResult<Candidate> {
        for descriptor in &self.descriptors {
            let usable = doc
                .select(&descriptor.css)?
                .into_iter()
                .find(|el| el.is_visible() && el.is_enabled());
            if let Some(node) = usable {
                let found = Candidate::from_node(&node, "anywhere", descriptor.css.clone());
                info!(what, path = %found.path, descriptor = %descriptor.label, "resolved input");
                return Ok(found);
            }
            debug!(descriptor = %descriptor.label, "no usable input");
        }

        let diagnostics = input_diagnostics(doc);
        warn!(what, inputs = ?diagnostics, "input not found");
        Err(SleuthError::not_found(what, diagnostics))
    }
}

fn input_diagnostics<D: Document>(doc: &D) -> Vec<String> {
    doc.select("input")
        .unwrap_or_default()
        .into_iter()
        .filter(|el| el.is_visible())
        .map(|el| {
            format!(
                "placeholder='{}', name='{}', aria-label='{}'",
                el.attribute("placeholder").unwrap_or_default(),
                el.attribute("name").unwrap_or_default(),
                el.attribute("aria-label").unwrap_or_default(),
            )
        })
        .collect()
}
