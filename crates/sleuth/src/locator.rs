//! Locator vocabulary: roles, selectors and search regions.
//!
//! A [`Selector`] describes *what* to look for (an ARIA role with an
//! accessible-name pattern, innermost text, or raw CSS). A [`SearchScope`]
//! describes *where*, as an ordered list of [`Region`]s from narrow to broad.
//! Queries are evaluated against a [`Document`] snapshot and always return
//! matches in document order.

use crate::dom::{Document, DomNode, NON_RENDERED_TAGS};
use crate::pattern::{normalize_whitespace, TextPattern};
use crate::result::SleuthResult;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ROLES
// =============================================================================

/// ARIA roles the resolver knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// `a[href]`, `[role=link]`
    Link,
    /// `button`, button-like inputs, `[role=button]`
    Button,
    /// `[role=tab]`
    Tab,
    /// Checkboxes
    Checkbox,
    /// `[role=combobox]`, `select`, inputs bound to a datalist
    Combobox,
    /// Free-text inputs and textareas
    Textbox,
    /// `h1`..`h6`, `[role=heading]`
    Heading,
}

impl Role {
    /// CSS selector matching the elements that carry this role
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Link => "a[href], [role=\"link\"]",
            Self::Button => {
                "button, [role=\"button\"], input[type=\"button\"], input[type=\"submit\"], input[type=\"reset\"], input[type=\"image\"]"
            }
            Self::Tab => "[role=\"tab\"]",
            Self::Checkbox => "input[type=\"checkbox\"], [role=\"checkbox\"]",
            Self::Combobox => "[role=\"combobox\"], select, input[list]",
            Self::Textbox => {
                "input:not([type]), input[type=\"text\"], input[type=\"search\"], input[type=\"email\"], input[type=\"tel\"], textarea, [role=\"textbox\"]"
            }
            Self::Heading => "h1, h2, h3, h4, h5, h6, [role=\"heading\"]",
        }
    }

    /// Role name as written in ARIA
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Button => "button",
            Self::Tab => "tab",
            Self::Checkbox => "checkbox",
            Self::Combobox => "combobox",
            Self::Textbox => "textbox",
            Self::Heading => "heading",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accessible name of an element, approximating the ARIA name computation:
/// `aria-label`, `aria-labelledby`, associated `<label>`, then content
/// (text, or `alt` of contained images), `value` for input buttons,
/// `placeholder`, and finally `title`.
pub fn accessible_name<'a, D: Document>(doc: &'a D, node: &D::Node<'a>) -> String {
    if let Some(label) = node.attribute("aria-label") {
        let label = normalize_whitespace(&label);
        if !label.is_empty() {
            return label;
        }
    }

    if let Some(ids) = node.attribute("aria-labelledby") {
        let text: Vec<String> = ids
            .split_whitespace()
            .filter_map(|id| {
                doc.select(&format!("[id=\"{id}\"]"))
                    .ok()
                    .and_then(|found| found.into_iter().next())
                    .map(|el| el.normalized_text())
            })
            .collect();
        let text = text.join(" ");
        if !text.is_empty() {
            return text;
        }
    }

    let tag = node.tag_name();
    let is_field = matches!(tag.as_str(), "input" | "select" | "textarea");

    if is_field {
        if let Some(text) = label_for(doc, node) {
            return text;
        }
        let input_type = node
            .attribute("type")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if matches!(input_type.as_str(), "button" | "submit" | "reset") {
            if let Some(value) = node.attribute("value") {
                return normalize_whitespace(&value);
            }
        }
        if input_type == "image" {
            if let Some(alt) = node.attribute("alt") {
                return normalize_whitespace(&alt);
            }
        }
        if let Some(placeholder) = node.attribute("placeholder") {
            return normalize_whitespace(&placeholder);
        }
    } else {
        let text = node.normalized_text();
        if !text.is_empty() {
            return text;
        }
        let alts: Vec<String> = doc
            .select_within(node, "img[alt]")
            .unwrap_or_default()
            .iter()
            .filter_map(|img| img.attribute("alt"))
            .map(|alt| normalize_whitespace(&alt))
            .filter(|alt| !alt.is_empty())
            .collect();
        if !alts.is_empty() {
            return alts.join(" ");
        }
    }

    node.attribute("title")
        .map(|t| normalize_whitespace(&t))
        .unwrap_or_default()
}

fn label_for<'a, D: Document>(doc: &'a D, node: &D::Node<'a>) -> Option<String> {
    if let Some(id) = node.attribute("id") {
        let explicit = doc
            .select(&format!("label[for=\"{id}\"]"))
            .ok()
            .and_then(|labels| labels.into_iter().next())
            .map(|label| label.normalized_text())
            .filter(|text| !text.is_empty());
        if explicit.is_some() {
            return explicit;
        }
    }
    std::iter::successors(node.parent(), |n| n.parent())
        .find(|ancestor| ancestor.tag_name() == "label")
        .map(|label| label.normalized_text())
        .filter(|text| !text.is_empty())
}

// =============================================================================
// SELECTORS
// =============================================================================

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// Elements with an ARIA role, optionally filtered by accessible name
    Role {
        /// Role to match
        role: Role,
        /// Accessible-name filter
        name: Option<TextPattern>,
    },
    /// Innermost elements whose text matches
    Text(TextPattern),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: TextPattern,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a role selector filtered by accessible name
    #[must_use]
    pub const fn role(role: Role, name: TextPattern) -> Self {
        Self::Role {
            role,
            name: Some(name),
        }
    }

    /// Create a text selector
    #[must_use]
    pub const fn text(pattern: TextPattern) -> Self {
        Self::Text(pattern)
    }

    /// CSS selector restricted to elements whose text matches
    #[must_use]
    pub fn has_text(css: impl Into<String>, text: TextPattern) -> Self {
        Self::CssWithText {
            css: css.into(),
            text,
        }
    }

    /// Evaluate under `scope`, returning matches in document order
    pub fn query_within<'a, D: Document>(
        &self,
        doc: &'a D,
        scope: &D::Node<'a>,
    ) -> SleuthResult<Vec<D::Node<'a>>> {
        match self {
            Self::Css(css) => doc.select_within(scope, css),
            Self::Role { role, name } => {
                let elements = doc.select_within(scope, role.css())?;
                Ok(match name {
                    Some(pattern) => elements
                        .into_iter()
                        .filter(|el| pattern.matches(&accessible_name(doc, el)))
                        .collect(),
                    None => elements,
                })
            }
            Self::Text(pattern) => innermost_text_matches(doc, scope, pattern),
            Self::CssWithText { css, text } => Ok(doc
                .select_within(scope, css)?
                .into_iter()
                .filter(|el| text.matches(&el.normalized_text()))
                .collect()),
        }
    }

    /// Evaluate against the whole document
    pub fn query<'a, D: Document>(&self, doc: &'a D) -> SleuthResult<Vec<D::Node<'a>>> {
        let root = doc.root();
        self.query_within(doc, &root)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={role}[name {name}]"),
            Self::Text(pattern) => write!(f, "text {pattern}"),
            Self::CssWithText { css, text } => write!(f, "css={css} has text {text}"),
        }
    }
}

/// Elements whose text matches and none of whose child elements also match.
/// Mirrors how a user reads "the element that says X".
fn innermost_text_matches<'a, D: Document>(
    doc: &'a D,
    scope: &D::Node<'a>,
    pattern: &TextPattern,
) -> SleuthResult<Vec<D::Node<'a>>> {
    let matches_text = |el: &D::Node<'a>| {
        !NON_RENDERED_TAGS.contains(&el.tag_name().as_str()) && pattern.matches(&el.normalized_text())
    };
    Ok(doc
        .select_within(scope, "*")?
        .into_iter()
        .filter(|el| matches_text(el) && !el.children().iter().any(|c| matches_text(c)))
        .collect())
}

// =============================================================================
// SEARCH SCOPES
// =============================================================================

/// One named region of the page. `selector: None` means the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Name used in logs and diagnostics
    pub name: String,
    /// CSS selector for the region roots
    #[serde(default)]
    pub selector: Option<String>,
}

impl Region {
    /// Region rooted at every element matching `selector`
    #[must_use]
    pub fn css(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: Some(selector.into()),
        }
    }

    /// Header and primary navigation
    #[must_use]
    pub fn header() -> Self {
        Self::css("header", "header, nav")
    }

    /// Page footer
    #[must_use]
    pub fn footer() -> Self {
        Self::css("footer", "footer")
    }

    /// Whole document
    #[must_use]
    pub fn anywhere() -> Self {
        Self {
            name: "anywhere".to_string(),
            selector: None,
        }
    }

    /// Parse a region shorthand: `header`, `footer`, `anywhere`, or a CSS selector
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.trim().to_ascii_lowercase().as_str() {
            "header" | "nav" => Self::header(),
            "footer" => Self::footer(),
            "anywhere" | "page" | "*" => Self::anywhere(),
            _ => Self::css(spec.trim(), spec.trim()),
        }
    }

    /// Root nodes of this region
    pub fn roots<'a, D: Document>(&self, doc: &'a D) -> SleuthResult<Vec<D::Node<'a>>> {
        match &self.selector {
            Some(css) => doc.select(css),
            None => Ok(vec![doc.root()]),
        }
    }

    /// Evaluate a selector across every root of this region, dropping duplicates
    /// (a `nav` nested inside a `header` would otherwise report twice)
    pub fn query<'a, D: Document>(
        &self,
        doc: &'a D,
        selector: &Selector,
    ) -> SleuthResult<Vec<D::Node<'a>>> {
        let mut found: Vec<D::Node<'a>> = Vec::new();
        for root in self.roots(doc)? {
            for el in selector.query_within(doc, &root)? {
                if !found.contains(&el) {
                    found.push(el);
                }
            }
        }
        Ok(found)
    }
}

/// Ordered regions, narrow before broad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchScope {
    regions: Vec<Region>,
}

impl SearchScope {
    /// Scope from explicit regions
    #[must_use]
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Header/nav, then footer, then anywhere
    #[must_use]
    pub fn header_footer_anywhere() -> Self {
        Self::new(vec![Region::header(), Region::footer(), Region::anywhere()])
    }

    /// Just the whole document
    #[must_use]
    pub fn anywhere() -> Self {
        Self::new(vec![Region::anywhere()])
    }

    /// Regions in preference order
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl Default for SearchScope {
    fn default() -> Self {
        Self::anywhere()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dom::HtmlSnapshot;

    mod accessible_name_tests {
        use super::*;

        fn name_of(html: &str, css: &str) -> String {
            let doc = HtmlSnapshot::parse(html);
            let node = doc.select(css).unwrap().into_iter().next().unwrap();
            accessible_name(&doc, &node)
        }

        #[test]
        fn test_aria_label_wins() {
            assert_eq!(
                name_of("<button aria-label='Onsite Search'><svg></svg></button>", "button"),
                "Onsite Search"
            );
        }

        #[test]
        fn test_labelledby() {
            assert_eq!(
                name_of(
                    "<span id='l1'>Find</span><span id='l2'>dealer</span><a href='/d' aria-labelledby='l1 l2'>x</a>",
                    "a"
                ),
                "Find dealer"
            );
        }

        #[test]
        fn test_explicit_and_wrapping_label() {
            assert_eq!(
                name_of("<label for='z'>ZIP code</label><input id='z'>", "input"),
                "ZIP code"
            );
            assert_eq!(
                name_of("<label>18V System <input type='checkbox'></label>", "input"),
                "18V System"
            );
        }

        #[test]
        fn test_image_link_uses_alt() {
            assert_eq!(
                name_of("<a href='/'><img alt='Bosch home'></a>", "a"),
                "Bosch home"
            );
        }

        #[test]
        fn test_submit_value_and_placeholder() {
            assert_eq!(name_of("<input type='submit' value='Go'>", "input"), "Go");
            assert_eq!(
                name_of("<input type='text' placeholder='Enter ZIP'>", "input"),
                "Enter ZIP"
            );
        }
    }

    mod selector_tests {
        use super::*;

        const PAGE: &str = r#"
            <header><nav><a href="/pt">Power Tools</a><button>Menu</button></nav></header>
            <main><p>Looking for a <b>dealer</b>? <a href="/dl">Find a Dealer</a></p>
              <div role="tab">Specifications</div></main>
            <footer><a href="/jobs">Careers</a><a href="/dl2">Dealer Locator</a></footer>
        "#;

        #[test]
        fn test_role_query_filters_by_name() {
            let doc = HtmlSnapshot::parse(PAGE);
            let sel = Selector::role(Role::Link, TextPattern::contains("dealer"));
            let texts: Vec<String> = sel
                .query(&doc)
                .unwrap()
                .iter()
                .map(|n| n.normalized_text())
                .collect();
            assert_eq!(texts, vec!["Find a Dealer", "Dealer Locator"]);
        }

        #[test]
        fn test_role_without_name() {
            let doc = HtmlSnapshot::parse(PAGE);
            let sel = Selector::Role {
                role: Role::Tab,
                name: None,
            };
            assert_eq!(sel.query(&doc).unwrap().len(), 1);
        }

        #[test]
        fn test_text_query_returns_innermost() {
            let doc = HtmlSnapshot::parse(PAGE);
            let sel = Selector::text(TextPattern::contains("find a dealer"));
            let found = sel.query(&doc).unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].tag_name(), "a");
        }

        #[test]
        fn test_css_with_text() {
            let doc = HtmlSnapshot::parse(PAGE);
            let sel = Selector::CssWithText {
                css: "footer a".into(),
                text: TextPattern::exact("careers"),
            };
            assert_eq!(sel.query(&doc).unwrap().len(), 1);
        }

        #[test]
        fn test_display() {
            let sel = Selector::role(Role::Button, TextPattern::contains("go"));
            assert_eq!(sel.to_string(), "role=button[name ~\"go\"]");
        }
    }

    mod region_tests {
        use super::*;

        #[test]
        fn test_region_query_dedupes_nested_roots() {
            let doc = HtmlSnapshot::parse("<header><nav><a href='/a'>A</a></nav></header>");
            let sel = Selector::Role {
                role: Role::Link,
                name: None,
            };
            assert_eq!(Region::header().query(&doc, &sel).unwrap().len(), 1);
        }

        #[test]
        fn test_missing_region_is_empty() {
            let doc = HtmlSnapshot::parse("<main><a href='/a'>A</a></main>");
            let sel = Selector::css("a");
            assert!(Region::footer().query(&doc, &sel).unwrap().is_empty());
            assert_eq!(Region::anywhere().query(&doc, &sel).unwrap().len(), 1);
        }

        #[test]
        fn test_parse_shorthand() {
            assert_eq!(Region::parse("Footer"), Region::footer());
            assert_eq!(Region::parse("nav"), Region::header());
            assert_eq!(Region::parse("*"), Region::anywhere());
            assert_eq!(
                Region::parse("#site-footer").selector.as_deref(),
                Some("#site-footer")
            );
        }

        #[test]
        fn test_scope_yaml() {
            let yaml = "- name: header\n  selector: 'header, nav'\n- name: anywhere\n";
            let scope: SearchScope = serde_yaml_ng::from_str(yaml).unwrap();
            assert_eq!(scope.regions()[0], Region::header());
            assert_eq!(scope.regions()[1], Region::anywhere());
        }
    }
}
