//! Key-value fact extraction from loosely structured spec sheets.
//!
//! Product pages publish specifications as tables, definition lists, label/value
//! sibling pairs, or plain prose. [`FactExtractor::extract`] tries those four
//! shapes in fixed precedence for every alias of the requested key and returns
//! the first value that is non-empty and does not simply repeat the label.

use crate::dom::{Document, DomNode};
use crate::locator::Selector;
use crate::pattern::{contains_ignore_case, normalize_whitespace, TextPattern};
use crate::result::{SleuthError, SleuthResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

// =============================================================================
// ALIAS TABLE
// =============================================================================

/// Extra labels a canonical key may appear under, keyed case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::empty().with_alias(
            "rpm",
            &[
                "Speed",
                "No-load speed",
                "Speed (RPM)",
                "Rotational Speed",
                "No Load Speed",
                "Speed Range",
            ],
        )
    }
}

impl AliasTable {
    /// Table with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add aliases for a key (appended to any existing ones)
    #[must_use]
    pub fn with_alias(mut self, key: &str, aliases: &[&str]) -> Self {
        self.entries
            .entry(key.to_lowercase())
            .or_default()
            .extend(aliases.iter().map(|a| (*a).to_string()));
        self
    }

    /// Configured aliases for `key`
    #[must_use]
    pub fn aliases(&self, key: &str) -> &[String] {
        let wanted = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| k.to_lowercase() == wanted)
            .map_or(&[], |(_, v)| v.as_slice())
    }

    /// Every label to try for `key`: the key as given, upper and lower case,
    /// then the configured aliases. Case-insensitive duplicates are dropped.
    #[must_use]
    pub fn variants(&self, key: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let candidates = [key.to_string(), key.to_uppercase(), key.to_lowercase()]
            .into_iter()
            .chain(self.aliases(key).iter().cloned());
        for candidate in candidates {
            let candidate = candidate.trim().to_string();
            if !candidate.is_empty() && !out.iter().any(|v| v.eq_ignore_ascii_case(&candidate)) {
                out.push(candidate);
            }
        }
        out
    }

    /// Number of canonical keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// FACT
// =============================================================================

/// Page structure a fact was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactSource {
    /// `<tr>` with a header/label cell and value cell
    Tabular,
    /// `<dt>` / `<dd>` pair
    DefinitionList,
    /// Label element followed by a value element, or `Label: value` text
    LabelSibling,
    /// Regex over the serialized markup
    RawText,
}

impl fmt::Display for FactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tabular => "tabular",
            Self::DefinitionList => "definition-list",
            Self::LabelSibling => "label-sibling",
            Self::RawText => "raw-text",
        })
    }
}

/// An extracted key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    /// Key as requested
    pub key: String,
    /// Extracted value
    pub value: String,
    /// Where it came from
    pub source: FactSource,
    /// Label that actually matched
    pub alias: String,
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Four-pattern fact extractor
#[derive(Debug, Clone, Default)]
pub struct FactExtractor {
    aliases: AliasTable,
}

impl FactExtractor {
    /// Create with an alias table
    #[must_use]
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Alias table in use
    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Extract the value for `key`.
    ///
    /// # Errors
    ///
    /// [`SleuthError::NotFound`] carrying every table row and definition-list
    /// pair seen on the page.
    pub fn extract<D: Document>(&self, doc: &D, key: &str) -> SleuthResult<Fact> {
        let variants = self.aliases.variants(key);
        let fact = |value: String, source: FactSource, alias: &str| Fact {
            key: key.to_string(),
            value,
            source,
            alias: alias.to_string(),
        };

        let found = if let Some((value, alias)) = tabular(doc, &variants)? {
            Some(fact(value, FactSource::Tabular, &alias))
        } else if let Some((value, alias)) = definition_list(doc, &variants)? {
            Some(fact(value, FactSource::DefinitionList, &alias))
        } else if let Some((value, alias)) = label_sibling(doc, &variants)? {
            Some(fact(value, FactSource::LabelSibling, &alias))
        } else {
            raw_text(doc, &variants)?.map(|(value, alias)| fact(value, FactSource::RawText, &alias))
        };

        match found {
            Some(fact) => {
                info!(key, value = %fact.value, source = %fact.source, alias = %fact.alias, "extracted fact");
                Ok(fact)
            }
            None => {
                let diagnostics = Self::diagnostics(doc);
                warn!(key, specs = ?diagnostics, "fact not found");
                Err(SleuthError::not_found(format!("spec '{key}'"), diagnostics))
            }
        }
    }

    /// Every table row and definition-list pair on the page
    pub fn diagnostics<D: Document>(doc: &D) -> Vec<String> {
        let mut out = Vec::new();
        for row in doc.select("tr").unwrap_or_default() {
            let th = first_text(doc, &row, "th");
            let td = first_text(doc, &row, "td");
            out.push(format!("TR: th='{th}' td='{td}'"));
        }
        for dt in doc.select("dt").unwrap_or_default() {
            let dd = following(&dt, "dd")
                .map(|dd| dd.normalized_text())
                .unwrap_or_default();
            out.push(format!("DL: dt='{}' dd='{dd}'", dt.normalized_text()));
        }
        out
    }
}

/// Non-empty and does not repeat the label
fn accept(value: &str, alias: &str) -> bool {
    !value.is_empty() && !contains_ignore_case(value, alias)
}

fn first_text<'a, D: Document>(doc: &'a D, scope: &D::Node<'a>, css: &str) -> String {
    doc.select_within(scope, css)
        .ok()
        .and_then(|found| found.into_iter().next())
        .map(|n| n.normalized_text())
        .unwrap_or_default()
}

/// Nearest following element sibling with the given tag
fn following<N: DomNode>(node: &N, tag: &str) -> Option<N> {
    std::iter::successors(node.next_sibling(), |n| n.next_sibling()).find(|n| n.tag_name() == tag)
}

fn tabular<D: Document>(doc: &D, variants: &[String]) -> SleuthResult<Option<(String, String)>> {
    for row in doc.select("tr")? {
        let th = doc.select_within(&row, "th")?.into_iter().next();
        let tds = doc.select_within(&row, "td")?;
        let th_text = th.as_ref().map(DomNode::normalized_text).unwrap_or_default();
        let td_text = tds.first().map(DomNode::normalized_text).unwrap_or_default();

        for alias in variants {
            if !contains_ignore_case(&th_text, alias) && !contains_ignore_case(&td_text, alias) {
                continue;
            }
            if let Some(last) = tds.last() {
                let value = last.normalized_text();
                if accept(&value, alias) {
                    return Ok(Some((value, alias.clone())));
                }
            }
            if let Some(next) = th.as_ref().and_then(|th| following(th, "td")) {
                let value = next.normalized_text();
                if accept(&value, alias) {
                    return Ok(Some((value, alias.clone())));
                }
            }
            debug!(alias = %alias, row = %th_text, "tabular value rejected");
        }
    }
    Ok(None)
}

fn definition_list<D: Document>(
    doc: &D,
    variants: &[String],
) -> SleuthResult<Option<(String, String)>> {
    for dt in doc.select("dt")? {
        let term = dt.normalized_text();
        for alias in variants {
            if !contains_ignore_case(&term, alias) {
                continue;
            }
            if let Some(dd) = following(&dt, "dd") {
                let value = dd.normalized_text();
                if accept(&value, alias) {
                    return Ok(Some((value, alias.clone())));
                }
            }
            debug!(alias = %alias, term = %term, "definition value rejected");
        }
    }
    Ok(None)
}

fn label_sibling<D: Document>(
    doc: &D,
    variants: &[String],
) -> SleuthResult<Option<(String, String)>> {
    for alias in variants {
        let escaped = regex::escape(alias);
        let label = Selector::text(TextPattern::regex(&escaped)?)
            .query(doc)?
            .into_iter()
            .next();
        let Some(label) = label else {
            continue;
        };

        if let Some(next) = label.next_sibling() {
            let value = next.normalized_text();
            if accept(&value, alias) {
                return Ok(Some((value, alias.clone())));
            }
        }

        if let Some(parent) = label.parent() {
            let after_label = compile(&format!(r"(?i){escaped}[:\s]*([^\n]+)"))?;
            let text = parent.text_content();
            let value = after_label
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| normalize_whitespace(m.as_str()))
                .unwrap_or_default();
            if accept(&value, alias) {
                return Ok(Some((value, alias.clone())));
            }
        }
        debug!(alias = %alias, "label-sibling value rejected");
    }
    Ok(None)
}

fn raw_text<D: Document>(doc: &D, variants: &[String]) -> SleuthResult<Option<(String, String)>> {
    let markup = doc.markup();
    for alias in variants {
        let pattern = compile(&format!(r"(?i){}\s*:?\s*([^<\n]+)", regex::escape(alias)))?;
        let value = pattern
            .captures_iter(&markup)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .find(|v| accept(v, alias));
        if let Some(value) = value {
            return Ok(Some((value, alias.clone())));
        }
    }
    Ok(None)
}

fn compile(source: &str) -> SleuthResult<Regex> {
    Regex::new(source).map_err(|e| SleuthError::InvalidPattern {
        pattern: source.to_string(),
        message: e.to_string(),
    })
}
