//! Links command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::fetch;
use crate::{FormatArg, LinksArgs};
use sleuth::{collect_links, snapshot, LinkChecker, LinkReport, Page, SleuthConfig, StatusProbe};

/// Execute the links command. Fails when any link is unhealthy.
pub async fn execute_links(
    config: &CliConfig,
    sleuth: &SleuthConfig,
    args: &LinksArgs,
) -> CliResult<()> {
    let loaded = fetch::load(&args.url, sleuth, config.browser).await?;
    let checker = LinkChecker::http(sleuth.link.clone());
    let report = check_page_links(loaded.page(), &sleuth.base_url, &args.scope, &checker).await;
    loaded.close().await?;
    let report = report?;

    let reporter = config.reporter();
    match args.format {
        FormatArg::Text => reporter.link_report(&report),
        FormatArg::Json => reporter.json(&report)?,
    }
    Ok(report.ensure_healthy()?)
}

/// Collect the links under `scope_css` on the current page and probe them.
///
/// Relative hrefs are joined against `base_url`, not the page URL. A page
/// without `scope_css` is a not-found error.
pub async fn check_page_links<P: StatusProbe>(
    page: &dyn Page,
    base_url: &str,
    scope_css: &str,
    checker: &LinkChecker<P>,
) -> CliResult<LinkReport> {
    let links = {
        let doc = snapshot(page).await?;
        collect_links(&doc, scope_css)?
    };
    Ok(checker.probe_links(base_url, links).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use sleuth::{LinkPolicy, LinkStatus, StaticPage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_footer_links_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/us/en/about"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/us/en/careers"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let home = format!("{}/us/en/", server.uri());
        let page = StaticPage::loaded(
            home.clone(),
            r#"<footer>
                 <a href="/about">About</a>
                 <a href="/careers">Careers</a>
                 <a href="mailto:help@example.com">Email</a>
               </footer>
               <main><a href="/not-checked">Elsewhere</a></main>"#,
        );

        let checker = LinkChecker::http(LinkPolicy::default());
        let report = check_page_links(&page, &home, "footer", &checker).await.unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].status, LinkStatus::Http(200));
        assert_eq!(report.records[1].status, LinkStatus::Http(404));
        assert!(matches!(report.records[2].status, LinkStatus::Skipped(_)));
        assert_eq!(report.failures().count(), 1);
        assert!(report.ensure_healthy().is_err());
    }

    #[tokio::test]
    async fn test_links_on_deep_page_join_against_base() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/us/en/about"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let base = format!("{}/us/en/", server.uri());
        let page = StaticPage::loaded(
            format!("{base}products/drill"),
            r#"<footer><a href="/about">About</a><a href="about">About us</a></footer>"#,
        );

        let checker = LinkChecker::http(LinkPolicy::default());
        let report = check_page_links(&page, &base, "footer", &checker).await.unwrap();

        assert_eq!(report.records.len(), 2);
        for record in &report.records {
            assert_eq!(record.url, format!("{base}about"));
            assert_eq!(record.status, LinkStatus::Http(200));
        }
        assert!(report.ensure_healthy().is_ok());
    }

    #[tokio::test]
    async fn test_missing_scope_is_not_found() {
        let page = StaticPage::loaded("https://example.com/", "<main>No footer</main>");
        let checker = LinkChecker::http(LinkPolicy::default());
        let err = check_page_links(&page, "https://example.com/", "footer", &checker)
            .await
            .unwrap_err();
        assert!(matches!(&err, CliError::Sleuth(e) if e.is_not_found_like()));
    }
}
