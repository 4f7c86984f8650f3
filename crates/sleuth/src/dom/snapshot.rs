//! [`Document`] implementation over a parsed HTML string.
//!
//! Visibility is decided structurally: non-rendered tags, the `hidden`
//! attribute, inline `display: none` / `visibility: hidden`, hidden inputs,
//! and the [`HIDDEN_MARKER`] attribute that a live page stamps on elements
//! whose computed style or box says they are not rendered.

use super::{Document, DomNode, ElementPath, NON_RENDERED_TAGS};
use crate::pattern::normalize_whitespace;
use crate::result::{SleuthError, SleuthResult};
use scraper::{ElementRef, Html, Selector};

/// Attribute stamped by a live page on elements it found not rendered
pub const HIDDEN_MARKER: &str = "data-sleuth-hidden";

const FORM_CONTROLS: &[&str] = &[
    "button", "input", "select", "textarea", "option", "optgroup", "fieldset",
];

/// A parsed, immutable DOM snapshot
#[derive(Debug)]
pub struct HtmlSnapshot {
    html: Html,
}

impl HtmlSnapshot {
    /// Parse a full HTML document
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Document `<title>` text
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.select("title")
            .ok()
            .and_then(|titles| titles.into_iter().next())
            .map(|t| normalize_whitespace(&t.text_content()))
    }

    /// Look an element up again by its structural path
    pub fn resolve(&self, path: &ElementPath) -> SleuthResult<Option<SnapshotNode<'_>>> {
        Ok(self.select(path.as_css())?.into_iter().next())
    }
}

/// Element handle into an [`HtmlSnapshot`]
#[derive(Debug, Clone, Copy)]
pub struct SnapshotNode<'a> {
    element: ElementRef<'a>,
}

impl<'a> SnapshotNode<'a> {
    const fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    fn ancestors_and_self(&self) -> impl Iterator<Item = ElementRef<'a>> {
        std::iter::successors(Some(self.element), |el| {
            el.parent().and_then(ElementRef::wrap)
        })
    }
}

impl PartialEq for SnapshotNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.element.id() == other.element.id()
    }
}

fn collect_rendered(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(el) = ElementRef::wrap(child) {
            if !NON_RENDERED_TAGS.contains(&el.value().name()) {
                collect_rendered(el, out);
            }
        }
    }
}

fn style_hides(style: Option<&str>) -> bool {
    style.is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

impl DomNode for SnapshotNode<'_> {
    fn tag_name(&self) -> String {
        self.element.value().name().to_ascii_lowercase()
    }

    fn text_content(&self) -> String {
        self.element.text().collect()
    }

    fn rendered_text(&self) -> String {
        let mut out = String::new();
        collect_rendered(self.element, &mut out);
        out
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.value().attr(name).map(str::to_string)
    }

    fn is_visible(&self) -> bool {
        let own = self.element.value();
        if own.attr(HIDDEN_MARKER).is_some() {
            return false;
        }
        if own.name() == "input"
            && own
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            return false;
        }
        self.ancestors_and_self().all(|el| {
            let v = el.value();
            !NON_RENDERED_TAGS.contains(&v.name())
                && v.attr("hidden").is_none()
                && !style_hides(v.attr("style"))
        })
    }

    fn is_disabled(&self) -> bool {
        let own = self.element.value();
        if own
            .attr("aria-disabled")
            .is_some_and(|a| a.eq_ignore_ascii_case("true"))
        {
            return true;
        }
        if !FORM_CONTROLS.contains(&own.name()) {
            return false;
        }
        self.ancestors_and_self().any(|el| {
            let v = el.value();
            v.attr("disabled").is_some() && (el.id() == self.element.id() || v.name() == "fieldset")
        })
    }

    fn next_sibling(&self) -> Option<Self> {
        self.element
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(Self::new)
    }

    fn parent(&self) -> Option<Self> {
        self.element.parent().and_then(ElementRef::wrap).map(Self::new)
    }

    fn children(&self) -> Vec<Self> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(Self::new)
            .collect()
    }

    fn path(&self) -> ElementPath {
        let mut segments: Vec<String> = self
            .ancestors_and_self()
            .map(|el| {
                let name = el.value().name();
                if el.parent().and_then(ElementRef::wrap).is_some() {
                    let index = el
                        .prev_siblings()
                        .filter(|n| n.value().is_element())
                        .count()
                        + 1;
                    format!("{name}:nth-child({index})")
                } else {
                    name.to_string()
                }
            })
            .collect();
        segments.reverse();
        ElementPath::new(segments.join(" > "))
    }
}

fn parse_selector(css: &str) -> SleuthResult<Selector> {
    Selector::parse(css).map_err(|e| SleuthError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{e:?}"),
    })
}

impl Document for HtmlSnapshot {
    type Node<'a>
        = SnapshotNode<'a>
    where
        Self: 'a;

    fn root(&self) -> SnapshotNode<'_> {
        SnapshotNode::new(self.html.root_element())
    }

    fn select_within<'a>(
        &'a self,
        scope: &SnapshotNode<'a>,
        css: &str,
    ) -> SleuthResult<Vec<SnapshotNode<'a>>> {
        let selector = parse_selector(css)?;
        Ok(scope.element.select(&selector).map(SnapshotNode::new).collect())
    }

    fn markup(&self) -> String {
        self.html.html()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn first<'a>(doc: &'a HtmlSnapshot, css: &str) -> SnapshotNode<'a> {
        doc.select(css).unwrap().into_iter().next().expect("element")
    }

    mod visibility_tests {
        use super::*;

        #[test]
        fn test_plain_element_is_visible() {
            let doc = HtmlSnapshot::parse("<body><a href='/x'>X</a></body>");
            assert!(first(&doc, "a").is_visible());
        }

        #[test]
        fn test_hidden_attribute_inherits() {
            let doc = HtmlSnapshot::parse("<div hidden><span><a href='/x'>X</a></span></div>");
            assert!(!first(&doc, "a").is_visible());
        }

        #[test]
        fn test_inline_style_hides() {
            let doc = HtmlSnapshot::parse(
                "<nav style='DISPLAY : none'><a>A</a></nav><p style='visibility:hidden'>B</p>",
            );
            assert!(!first(&doc, "a").is_visible());
            assert!(!first(&doc, "p").is_visible());
        }

        #[test]
        fn test_marker_applies_to_self_only() {
            let doc = HtmlSnapshot::parse(
                "<span data-sleuth-hidden='1'><a>inside zero-size wrapper</a></span>",
            );
            assert!(!first(&doc, "span").is_visible());
            assert!(first(&doc, "a").is_visible());
        }

        #[test]
        fn test_hidden_input_and_script() {
            let doc = HtmlSnapshot::parse(
                "<body><input type='HIDDEN' name='csrf'><script>var x = 1;</script></body>",
            );
            assert!(!first(&doc, "input").is_visible());
            assert!(!first(&doc, "script").is_visible());
        }
    }

    mod enablement_tests {
        use super::*;

        #[test]
        fn test_disabled_attribute() {
            let doc = HtmlSnapshot::parse("<input id='a' disabled><input id='b'>");
            assert!(first(&doc, "#a").is_disabled());
            assert!(first(&doc, "#b").is_enabled());
        }

        #[test]
        fn test_disabled_fieldset_disables_descendants() {
            let doc = HtmlSnapshot::parse("<fieldset disabled><div><input></div></fieldset>");
            assert!(first(&doc, "input").is_disabled());
        }

        #[test]
        fn test_disabled_attribute_ignored_on_non_controls() {
            let doc = HtmlSnapshot::parse("<div disabled><a href='#'>x</a></div>");
            assert!(first(&doc, "a").is_enabled());
            assert!(first(&doc, "div").is_enabled());
        }

        #[test]
        fn test_aria_disabled() {
            let doc = HtmlSnapshot::parse("<a href='/x' aria-disabled='true'>x</a>");
            assert!(first(&doc, "a").is_disabled());
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_next_sibling_skips_text_nodes() {
            let doc = HtmlSnapshot::parse("<dl><dt>Weight</dt>\n  text\n<dd>3.5 lbs</dd></dl>");
            let dt = first(&doc, "dt");
            let dd = dt.next_sibling().unwrap();
            assert_eq!(dd.tag_name(), "dd");
            assert_eq!(dd.normalized_text(), "3.5 lbs");
            assert!(dd.next_sibling().is_none());
        }

        #[test]
        fn test_parent_and_children() {
            let doc = HtmlSnapshot::parse("<ul><li>a</li><li>b</li></ul>");
            let li = first(&doc, "li");
            let ul = li.parent().unwrap();
            assert_eq!(ul.tag_name(), "ul");
            assert_eq!(ul.children().len(), 2);
            assert!(doc.root().parent().is_none());
        }

        #[test]
        fn test_path_round_trips() {
            let doc = HtmlSnapshot::parse(
                "<header><a>Home</a></header><footer><p>x</p><a>Help</a><a>Jobs</a></footer>",
            );
            let jobs = doc.select("footer a").unwrap()[1];
            let path = jobs.path();
            assert!(path.as_css().starts_with("html > body:nth-child(2)"));
            let again = doc.resolve(&path).unwrap().unwrap();
            assert_eq!(again, jobs);
            assert_eq!(again.normalized_text(), "Jobs");
        }

        #[test]
        fn test_rendered_text_skips_scripts() {
            let doc = HtmlSnapshot::parse(
                "<body><p>Find <script>var dealer = 1;</script>a dealer</p></body>",
            );
            let p = first(&doc, "p");
            assert_eq!(p.normalized_text(), "Find a dealer");
            assert!(p.text_content().contains("var dealer"));
        }

        #[test]
        fn test_title() {
            let doc = HtmlSnapshot::parse("<head><title> Bosch  Tools </title></head><body></body>");
            assert_eq!(doc.title().as_deref(), Some("Bosch Tools"));
        }

        #[test]
        fn test_invalid_selector() {
            let doc = HtmlSnapshot::parse("<p>x</p>");
            let err = doc.select("p[").unwrap_err();
            assert!(matches!(err, SleuthError::InvalidSelector { .. }));
        }
    }
}
