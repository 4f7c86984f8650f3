//! Read-only DOM abstraction.
//!
//! Resolution code never talks to a browser library directly. It walks a
//! [`Document`] whose nodes expose tree navigation ([`DomNode::next_sibling`],
//! [`DomNode::parent`], [`DomNode::children`]) and the two predicates every
//! strategy needs, visibility and enablement. [`HtmlSnapshot`] is the
//! implementation backed by a parsed HTML string; any mock tree can stand in
//! for it in tests.

mod snapshot;

pub use snapshot::{HtmlSnapshot, SnapshotNode, HIDDEN_MARKER};

use crate::pattern::normalize_whitespace;
use crate::result::SleuthResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique structural CSS path to an element, e.g.
/// `html > body:nth-child(2) > footer:nth-child(3) > a:nth-child(1)`.
///
/// The path is how a resolved candidate is replayed on the live page: the
/// snapshot answers the question, the page performs the action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath(String);

impl ElementPath {
    /// Wrap a CSS path
    #[must_use]
    pub fn new(css: impl Into<String>) -> Self {
        Self(css.into())
    }

    /// CSS selector form
    #[must_use]
    pub fn as_css(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node in a DOM snapshot
pub trait DomNode: Clone + PartialEq {
    /// Lower-case tag name
    fn tag_name(&self) -> String;

    /// Concatenated descendant text, unnormalized (keeps newlines)
    fn text_content(&self) -> String;

    /// Like [`DomNode::text_content`] but skipping script, style and other
    /// non-rendered descendants
    fn rendered_text(&self) -> String;

    /// Attribute value
    fn attribute(&self, name: &str) -> Option<String>;

    /// Whether the element would be rendered
    fn is_visible(&self) -> bool;

    /// Whether a form control is disabled
    fn is_disabled(&self) -> bool;

    /// Inverse of [`DomNode::is_disabled`]
    fn is_enabled(&self) -> bool {
        !self.is_disabled()
    }

    /// Next element sibling
    fn next_sibling(&self) -> Option<Self>;

    /// Parent element (None at the root)
    fn parent(&self) -> Option<Self>;

    /// Child elements in document order
    fn children(&self) -> Vec<Self>;

    /// Structural path for replaying actions
    fn path(&self) -> ElementPath;

    /// Whitespace-collapsed rendered text
    fn normalized_text(&self) -> String {
        normalize_whitespace(&self.rendered_text())
    }

    /// True if the attribute is present at all
    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

/// A queryable document
pub trait Document {
    /// Node handle type, borrowing from the document
    type Node<'a>: DomNode
    where
        Self: 'a;

    /// The document element (`<html>`)
    fn root(&self) -> Self::Node<'_>;

    /// All descendants of `scope` matching a CSS selector, in document order
    fn select_within<'a>(
        &'a self,
        scope: &Self::Node<'a>,
        css: &str,
    ) -> SleuthResult<Vec<Self::Node<'a>>>;

    /// All elements matching a CSS selector, in document order
    fn select(&self, css: &str) -> SleuthResult<Vec<Self::Node<'_>>> {
        let root = self.root();
        self.select_within(&root, css)
    }

    /// Serialized markup of the whole document
    fn markup(&self) -> String;
}

/// Tags whose text never renders
pub(crate) const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link",
];

/// Visible anchor texts, used as diagnostics when a control can't be found
pub fn visible_anchor_texts<D: Document>(doc: &D) -> Vec<String> {
    doc.select("a")
        .unwrap_or_default()
        .into_iter()
        .filter(|a| a.is_visible())
        .map(|a| a.normalized_text())
        .collect()
}
