//! Link health checking.
//!
//! Links are discovered synchronously from a snapshot ([`collect_links`]),
//! then probed concurrently ([`LinkChecker::probe_links`]). Every probe gets
//! its own timeout and the batch waits for all of them, so the report always
//! has one record per discovered link, in document order.

use crate::dom::{Document, DomNode};
use crate::locator::accessible_name;
use crate::pattern::contains_ignore_case;
use crate::result::{SleuthError, SleuthResult};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default per-probe timeout (10 seconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// POLICY
// =============================================================================

/// What to skip and what counts as healthy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkPolicy {
    /// Status codes treated as healthy
    pub healthy_statuses: Vec<u16>,
    /// Links whose text contains any of these are not probed
    pub skip_text: Vec<String>,
    /// Hrefs starting with any of these are not probed
    pub skip_prefixes: Vec<String>,
    /// Per-probe timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// User-Agent header for probes
    pub user_agent: Option<String>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            healthy_statuses: vec![200, 204, 301, 302, 403],
            skip_text: vec!["subscribe".to_string()],
            skip_prefixes: vec![
                "mailto:".to_string(),
                "tel:".to_string(),
                "javascript:".to_string(),
            ],
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            user_agent: None,
        }
    }
}

impl LinkPolicy {
    /// Set the per-probe timeout
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout_ms: u64) -> Self {
        self.probe_timeout_ms = timeout_ms;
        self
    }

    /// Add a status code to the healthy set
    #[must_use]
    pub fn with_healthy_status(mut self, status: u16) -> Self {
        if !self.healthy_statuses.contains(&status) {
            self.healthy_statuses.push(status);
        }
        self
    }

    /// Add a skip-text entry
    #[must_use]
    pub fn with_skip_text(mut self, text: impl Into<String>) -> Self {
        self.skip_text.push(text.into());
        self
    }

    /// Per-probe timeout
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Whether a status code is healthy
    #[must_use]
    pub fn is_healthy(&self, status: u16) -> bool {
        self.healthy_statuses.contains(&status)
    }

    /// Reason to skip a link, if any
    #[must_use]
    pub fn skip_reason(&self, href: &str, text: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return Some("empty href".to_string());
        }
        if href == "#" {
            return Some("fragment-only href".to_string());
        }
        let lower = href.to_ascii_lowercase();
        if let Some(prefix) = self
            .skip_prefixes
            .iter()
            .find(|p| lower.starts_with(&p.to_ascii_lowercase()))
        {
            return Some(format!("{prefix} link"));
        }
        self.skip_text
            .iter()
            .find(|t| contains_ignore_case(text, t))
            .map(|t| format!("non-navigational text ({t})"))
    }
}

// =============================================================================
// URL JOINING
// =============================================================================

/// Resolve an href against a base URL.
///
/// Absolute `http(s)` hrefs are used as is and protocol-relative hrefs take
/// the base's scheme. Anything else is appended to the base path with exactly
/// one `/` at the seam, so `https://example.com/us/en/` joined with `about`
/// or `/about` both give `https://example.com/us/en/about`.
pub fn join_url(base: &str, href: &str) -> SleuthResult<Url> {
    let href = href.trim();
    let invalid = |url: &str, e: url::ParseError| SleuthError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    };

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Url::parse(href).map_err(|e| invalid(href, e));
    }

    let base_url = Url::parse(base.trim()).map_err(|e| invalid(base, e))?;
    if href.starts_with("//") {
        let absolute = format!("{}:{href}", base_url.scheme());
        return Url::parse(&absolute).map_err(|e| invalid(&absolute, e));
    }

    let mut prefix = base_url;
    prefix.set_query(None);
    prefix.set_fragment(None);
    let mut prefix = prefix.to_string();
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    let joined = format!("{prefix}{}", href.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| invalid(&joined, e))
}

// =============================================================================
// RECORDS
// =============================================================================

/// Outcome of checking one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum LinkStatus {
    /// Probe returned this HTTP status
    Http(u16),
    /// Not probed
    Skipped(String),
    /// Probe failed at network level, or the URL was unusable
    Error(String),
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Error(message) => write!(f, "error ({message})"),
        }
    }
}

/// One checked link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Absolute URL, or the raw href for skipped links
    pub url: String,
    /// Accessible name of the anchor
    pub text: String,
    /// Probe outcome
    pub status: LinkStatus,
    /// True if this link fails the check
    pub failed: bool,
}

impl LinkRecord {
    fn skipped(url: &str, text: &str, reason: String) -> Self {
        Self {
            url: url.to_string(),
            text: text.to_string(),
            status: LinkStatus::Skipped(reason),
            failed: false,
        }
    }

    fn error(url: &str, text: &str, message: String) -> Self {
        Self {
            url: url.to_string(),
            text: text.to_string(),
            status: LinkStatus::Error(message),
            failed: true,
        }
    }

    /// Promote a failing record to an error
    ///
    /// # Errors
    ///
    /// [`SleuthError::ProbeError`] for network failures,
    /// [`SleuthError::AssertionFailed`] for unhealthy status codes.
    pub fn check(&self) -> SleuthResult<()> {
        match (&self.status, self.failed) {
            (LinkStatus::Error(message), _) => Err(SleuthError::ProbeError {
                url: self.url.clone(),
                text: self.text.clone(),
                message: message.clone(),
            }),
            (LinkStatus::Http(code), true) => Err(SleuthError::assertion(format!(
                "Link \"{}\" at {} failed with status: {code}",
                self.text, self.url
            ))),
            _ => Ok(()),
        }
    }
}

/// All records for one scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Records in document order
    pub records: Vec<LinkRecord>,
}

impl LinkReport {
    /// Records that fail the check
    pub fn failures(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records.iter().filter(|r| r.failed)
    }

    /// Number of probed links with a healthy status
    #[must_use]
    pub fn healthy_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, LinkStatus::Http(_)) && !r.failed)
            .count()
    }

    /// Number of skipped links
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, LinkStatus::Skipped(_)))
            .count()
    }

    /// True if nothing failed
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Aggregate every failing record into one error
    ///
    /// # Errors
    ///
    /// [`SleuthError::LinkCheckFailed`] with one line per failing link.
    pub fn ensure_healthy(&self) -> SleuthResult<()> {
        let failures: Vec<String> = self
            .failures()
            .filter_map(|r| r.check().err())
            .map(|e| e.to_string())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SleuthError::LinkCheckFailed { failures })
        }
    }
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// An anchor found in scope, not yet probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// Raw `href` attribute
    pub href: String,
    /// Accessible name
    pub text: String,
}

/// Every `a[href]` under the elements matching `scope_css`, in document order.
///
/// # Errors
///
/// [`SleuthError::NotFound`] if the scope matches nothing.
pub fn collect_links<D: Document>(doc: &D, scope_css: &str) -> SleuthResult<Vec<DiscoveredLink>> {
    let roots = doc.select(scope_css)?;
    if roots.is_empty() {
        return Err(SleuthError::not_found(
            format!("link scope `{scope_css}`"),
            Vec::new(),
        ));
    }

    let mut anchors: Vec<D::Node<'_>> = Vec::new();
    for root in &roots {
        for a in doc.select_within(root, "a[href]")? {
            if !anchors.contains(&a) {
                anchors.push(a);
            }
        }
    }

    Ok(anchors
        .iter()
        .map(|a| DiscoveredLink {
            href: a.attribute("href").unwrap_or_default(),
            text: accessible_name(doc, a),
        })
        .collect())
}

// =============================================================================
// PROBING
// =============================================================================

/// Lightweight status probe
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Issue a HEAD request and return the status code, or a network error
    async fn head(&self, url: &Url, timeout: Duration) -> Result<u16, String>;
}

/// [`StatusProbe`] over a reqwest client. Redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpProbe {
    /// Create a probe, optionally overriding the User-Agent
    #[must_use]
    pub fn new(user_agent: Option<&str>) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }
        Self {
            client: builder.build().unwrap_or_default(),
        }
    }

    /// Wrap an existing client
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProbe for HttpProbe {
    async fn head(&self, url: &Url, timeout: Duration) -> Result<u16, String> {
        self.client
            .head(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| e.to_string())
    }
}

/// Concurrent link prober
#[derive(Debug, Clone)]
pub struct LinkChecker<P> {
    probe: P,
    policy: LinkPolicy,
}

impl LinkChecker<HttpProbe> {
    /// HTTP checker for a policy
    #[must_use]
    pub fn http(policy: LinkPolicy) -> Self {
        let probe = HttpProbe::new(policy.user_agent.as_deref());
        Self::new(probe, policy)
    }
}

impl<P: StatusProbe> LinkChecker<P> {
    /// Create a checker
    #[must_use]
    pub const fn new(probe: P, policy: LinkPolicy) -> Self {
        Self { probe, policy }
    }

    /// Policy in use
    #[must_use]
    pub const fn policy(&self) -> &LinkPolicy {
        &self.policy
    }

    /// Discover and probe links in one call
    ///
    /// # Errors
    ///
    /// Propagates [`collect_links`] errors. Unhealthy links are reported in
    /// the returned [`LinkReport`], not as an error.
    pub async fn check_links<D: Document>(
        &self,
        doc: &D,
        scope_css: &str,
        base_url: &str,
    ) -> SleuthResult<LinkReport> {
        let links = collect_links(doc, scope_css)?;
        Ok(self.probe_links(base_url, links).await)
    }

    /// Probe every link concurrently; output preserves input order
    pub async fn probe_links(&self, base_url: &str, links: Vec<DiscoveredLink>) -> LinkReport {
        let total = links.len();
        let records = join_all(links.into_iter().map(|link| self.probe_one(base_url, link))).await;
        let report = LinkReport { records };
        info!(
            total,
            healthy = report.healthy_count(),
            skipped = report.skipped_count(),
            failed = report.failures().count(),
            "link check complete"
        );
        report
    }

    async fn probe_one(&self, base_url: &str, link: DiscoveredLink) -> LinkRecord {
        let DiscoveredLink { href, text } = link;
        if let Some(reason) = self.policy.skip_reason(&href, &text) {
            debug!(%href, %text, %reason, "skipping link");
            return LinkRecord::skipped(&href, &text, reason);
        }

        let url = match join_url(base_url, &href) {
            Ok(url) => url,
            Err(e) => {
                warn!(%href, %text, error = %e, "unusable link");
                return LinkRecord::error(&href, &text, e.to_string());
            }
        };

        let timeout = self.policy.probe_timeout();
        let outcome = tokio::time::timeout(timeout, self.probe.head(&url, timeout)).await;
        match outcome {
            Ok(Ok(code)) => {
                let failed = !self.policy.is_healthy(code);
                if failed {
                    warn!(%url, %text, status = code, "unhealthy link");
                } else {
                    debug!(%url, %text, status = code, "healthy link");
                }
                LinkRecord {
                    url: url.to_string(),
                    text,
                    status: LinkStatus::Http(code),
                    failed,
                }
            }
            Ok(Err(message)) => {
                warn!(%url, %text, error = %message, "link probe failed");
                LinkRecord::error(url.as_str(), &text, message)
            }
            Err(_) => {
                let message = format!("timed out after {}ms", self.policy.probe_timeout_ms);
                warn!(%url, %text, "link probe timed out");
                LinkRecord::error(url.as_str(), &text, message)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dom::HtmlSnapshot;
    use std::collections::HashMap;

    /// Canned responses keyed by URL; unknown URLs fail like a refused connection
    struct MockProbe {
        responses: HashMap<String, u16>,
        delay: Duration,
    }

    impl MockProbe {
        fn new(responses: &[(&str, u16)]) -> Self {
            Self {
                responses: responses.iter().map(|(u, s)| ((*u).to_string(), *s)).collect(),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl StatusProbe for MockProbe {
        async fn head(&self, url: &Url, _timeout: Duration) -> Result<u16, String> {
            tokio::time::sleep(self.delay).await;
            self.responses
                .get(url.as_str())
                .copied()
                .ok_or_else(|| "connection refused".to_string())
        }
    }

    const BASE: &str = "https://example.com/us/en/";

    mod join_tests {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn test_relative_with_and_without_slash() {
            assert_eq!(join_url(BASE, "about").unwrap().as_str(), "https://example.com/us/en/about");
            assert_eq!(join_url(BASE, "/about").unwrap().as_str(), "https://example.com/us/en/about");
        }

        #[test]
        fn test_base_without_trailing_slash() {
            assert_eq!(
                join_url("https://example.com/us/en", "about").unwrap().as_str(),
                "https://example.com/us/en/about"
            );
        }

        #[test]
        fn test_absolute_and_protocol_relative() {
            assert_eq!(
                join_url(BASE, "https://other.org/x").unwrap().as_str(),
                "https://other.org/x"
            );
            assert_eq!(
                join_url("http://example.com/", "//cdn.example.com/a.pdf").unwrap().as_str(),
                "http://cdn.example.com/a.pdf"
            );
        }

        #[test]
        fn test_base_query_is_dropped() {
            assert_eq!(
                join_url("https://example.com/us/en/?ref=nav#top", "careers").unwrap().as_str(),
                "https://example.com/us/en/careers"
            );
        }

        #[test]
        fn test_invalid_base() {
            let err = join_url("not a url", "about").unwrap_err();
            assert!(matches!(err, SleuthError::InvalidUrl { .. }));
        }

        proptest! {
            #[test]
            fn prop_single_slash_at_seam(segment in "[a-z0-9][a-z0-9-]{0,15}", slashes in 0usize..2) {
                let href = format!("{}{segment}", "/".repeat(slashes));
                let joined = join_url(BASE, &href).unwrap();
                prop_assert_eq!(joined.as_str(), format!("https://example.com/us/en/{segment}"));
            }
        }
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_skip_reasons() {
            let policy = LinkPolicy::default();
            assert!(policy.skip_reason("", "Blank").is_some());
            assert!(policy.skip_reason("#", "Top").is_some());
            assert!(policy.skip_reason("MAILTO:a@b.c", "Mail").is_some());
            assert!(policy.skip_reason("tel:+1800", "Call").is_some());
            assert!(policy.skip_reason("/news", "Subscribe to newsletter").is_some());
            assert!(policy.skip_reason("/news", "News").is_none());
            assert!(policy.skip_reason("#section", "Jump").is_none());
        }

        #[test]
        fn test_healthy_statuses() {
            let policy = LinkPolicy::default();
            for code in [200, 204, 301, 302, 403] {
                assert!(policy.is_healthy(code));
            }
            assert!(!policy.is_healthy(404));
            assert!(!policy.is_healthy(500));
            assert!(policy.with_healthy_status(308).is_healthy(308));
        }

        #[test]
        fn test_policy_yaml_defaults() {
            let policy: LinkPolicy = serde_yaml_ng::from_str("probe_timeout_ms: 2500\n").unwrap();
            assert_eq!(policy.probe_timeout(), Duration::from_millis(2500));
            assert_eq!(policy.healthy_statuses, LinkPolicy::default().healthy_statuses);
        }
    }

    mod check_tests {
        use super::*;

        const FOOTER: &str = r#"
            <main><a href="/main-only">Main</a></main>
            <footer>
              <a href="/about">About</a>
              <a href="https://example.com/missing">Missing</a>
              <a href="mailto:help@example.com">Email us</a>
              <a href="/legal">Legal</a>
              <a href="/newsletter">Subscribe</a>
              <a href="/down"><img alt="Status"></a>
            </footer>"#;

        fn checker(delay: Duration) -> LinkChecker<MockProbe> {
            let mut probe = MockProbe::new(&[
                ("https://example.com/us/en/about", 200),
                ("https://example.com/missing", 404),
                ("https://example.com/us/en/legal", 403),
            ]);
            probe.delay = delay;
            LinkChecker::new(probe, LinkPolicy::default().with_probe_timeout(200))
        }

        #[tokio::test]
        async fn test_classification_and_order() {
            let doc = HtmlSnapshot::parse(FOOTER);
            let report = checker(Duration::ZERO).check_links(&doc, "footer", BASE).await.unwrap();

            let texts: Vec<&str> = report.records.iter().map(|r| r.text.as_str()).collect();
            assert_eq!(texts, ["About", "Missing", "Email us", "Legal", "Subscribe", "Status"]);

            assert_eq!(report.records[0].status, LinkStatus::Http(200));
            assert!(report.records[1].failed);
            assert!(matches!(report.records[2].status, LinkStatus::Skipped(_)));
            assert_eq!(report.records[3].status, LinkStatus::Http(403));
            assert!(!report.records[3].failed);
            assert!(matches!(report.records[4].status, LinkStatus::Skipped(_)));
            assert_eq!(
                report.records[5].status,
                LinkStatus::Error("connection refused".into())
            );
            assert!(report.records[5].failed);

            assert_eq!(report.healthy_count(), 2);
            assert_eq!(report.skipped_count(), 2);
            assert_eq!(report.failures().count(), 2);
        }

        #[tokio::test]
        async fn test_ensure_healthy_aggregates() {
            let doc = HtmlSnapshot::parse(FOOTER);
            let report = checker(Duration::ZERO).check_links(&doc, "footer", BASE).await.unwrap();
            let err = report.ensure_healthy().unwrap_err();
            let failures = err.diagnostics();
            assert_eq!(failures.len(), 2);
            assert!(failures[0].contains("failed with status: 404"));
            assert!(failures[1].contains("failed to resolve: connection refused"));
        }

        #[tokio::test]
        async fn test_slow_probe_records_timeout_error() {
            let doc = HtmlSnapshot::parse(r#"<footer><a href="/about">About</a></footer>"#);
            let report = checker(Duration::from_secs(5))
                .check_links(&doc, "footer", BASE)
                .await
                .unwrap();
            assert!(matches!(
                &report.records[0].status,
                LinkStatus::Error(m) if m.contains("timed out")
            ));
        }

        #[tokio::test]
        async fn test_missing_scope_is_not_found() {
            let doc = HtmlSnapshot::parse("<main><a href='/'>Home</a></main>");
            let err = checker(Duration::ZERO)
                .check_links(&doc, "footer", BASE)
                .await
                .unwrap_err();
            assert!(err.is_not_found_like());
        }

        #[test]
        fn test_record_check_promotes_errors() {
            let record = LinkRecord::error("https://x.test/", "X", "dns error".into());
            assert!(matches!(record.check(), Err(SleuthError::ProbeError { .. })));
            let skipped = LinkRecord::skipped("#", "Top", "fragment".into());
            assert!(skipped.check().is_ok());
        }
    }

    mod http_probe_tests {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_http_probe_against_server() {
            let server = MockServer::start().await;
            for (route, status) in [("/ok", 200), ("/gone", 404), ("/private", 403)] {
                Mock::given(method("HEAD"))
                    .and(path(route))
                    .respond_with(ResponseTemplate::new(status))
                    .mount(&server)
                    .await;
            }

            let base = format!("{}/", server.uri());
            let links = ["/ok", "gone", "/private"]
                .iter()
                .map(|href| DiscoveredLink {
                    href: (*href).to_string(),
                    text: (*href).to_string(),
                })
                .collect();
            let report = LinkChecker::http(LinkPolicy::default())
                .probe_links(&base, links)
                .await;

            let statuses: Vec<&LinkStatus> = report.records.iter().map(|r| &r.status).collect();
            assert_eq!(
                statuses,
                [&LinkStatus::Http(200), &LinkStatus::Http(404), &LinkStatus::Http(403)]
            );
            assert_eq!(report.failures().count(), 1);
        }

        #[tokio::test]
        async fn test_connection_refused_is_error() {
            let probe = HttpProbe::default();
            let url = Url::parse("http://127.0.0.1:1/").unwrap();
            let outcome = probe.head(&url, Duration::from_secs(2)).await;
            assert!(outcome.is_err());
        }
    }
}
