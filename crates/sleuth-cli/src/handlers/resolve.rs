//! Resolve command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::fetch;
use crate::{FormatArg, ResolveArgs};
use sleuth::{
    snapshot, Candidate, ControlResolver, Document, Region, SearchScope, SleuthConfig,
    SleuthError, Strategy, SynonymSet, TextPattern,
};

/// Execute the resolve command
pub async fn execute_resolve(
    config: &CliConfig,
    sleuth: &SleuthConfig,
    args: &ResolveArgs,
) -> CliResult<()> {
    let synonyms = build_synonyms(&args.synonyms)?;
    let scope = build_scope(&args.scopes);
    let mut resolver = ControlResolver::new().with_order(args.order.into());
    if !args.strategies.is_empty() {
        resolver = resolver.with_strategies(args.strategies.iter().copied().map(Strategy::from).collect());
    }

    let loaded = fetch::load(&args.url, sleuth, config.browser).await?;
    let doc = snapshot(loaded.page()).await;
    loaded.close().await?;
    let doc = doc?;

    let reporter = config.reporter();
    match resolve_control(&doc, &resolver, &synonyms, &scope) {
        Ok(found) => match args.format {
            FormatArg::Text => {
                reporter.candidate(&found);
                Ok(())
            }
            FormatArg::Json => reporter.json(&found),
        },
        Err(SleuthError::NotFound { what, diagnostics }) => {
            reporter.diagnostics(&what, &diagnostics);
            Err(CliError::Missing {
                missing: 1,
                total: 1,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve one control on a snapshot
pub fn resolve_control<D: Document>(
    doc: &D,
    resolver: &ControlResolver,
    synonyms: &SynonymSet,
    scope: &SearchScope,
) -> Result<Candidate, SleuthError> {
    resolver.resolve(doc, "control", synonyms, scope)
}

/// Synonyms from the command line: `/.../` is a regex, anything else a
/// case-insensitive phrase
pub fn build_synonyms(raw: &[String]) -> CliResult<SynonymSet> {
    raw.iter()
        .map(|s| {
            let s = s.trim();
            match s.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
                Some(source) if !source.is_empty() => TextPattern::regex(source)
                    .map_err(|e| CliError::invalid_argument(e.to_string())),
                _ if s.is_empty() => Err(CliError::invalid_argument("empty synonym")),
                _ => Ok(TextPattern::contains(s)),
            }
        })
        .collect()
}

/// Regions from the command line; header, footer, then anywhere when none given
pub fn build_scope(raw: &[String]) -> SearchScope {
    if raw.is_empty() {
        SearchScope::header_footer_anywhere()
    } else {
        SearchScope::new(raw.iter().map(|r| Region::parse(r)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sleuth::{HtmlSnapshot, ResolveOrder, Role};

    const PAGE: &str = r#"<header><nav><a href="/where-to-buy">Where to Buy</a></nav></header>
        <footer><a href="/dealers">Dealer Locator</a></footer>"#;

    mod build_tests {
        use super::*;

        #[test]
        fn test_synonym_forms() {
            let set = build_synonyms(&["Dealer Locator".into(), "/find (a )?dealer/".into()]).unwrap();
            assert_eq!(set.len(), 2);
            assert!(set.patterns()[0].matches("dealer locator"));
            assert!(set.patterns()[1].matches("Find Dealer"));
        }

        #[test]
        fn test_bad_synonyms() {
            assert!(build_synonyms(&["/([/".into()]).is_err());
            assert!(build_synonyms(&["  ".into()]).is_err());
        }

        #[test]
        fn test_default_scope() {
            assert_eq!(build_scope(&[]), SearchScope::header_footer_anywhere());
            let scope = build_scope(&["footer".into(), "#main".into()]);
            assert_eq!(scope.regions()[0], Region::footer());
            assert_eq!(scope.regions()[1].selector.as_deref(), Some("#main"));
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_synonym_major_prefers_better_synonym() {
            let doc = HtmlSnapshot::parse(PAGE);
            let synonyms = build_synonyms(&["dealer locator".into(), "where to buy".into()]).unwrap();
            let found = resolve_control(&doc, &ControlResolver::new(), &synonyms, &build_scope(&[]))
                .unwrap();
            assert_eq!(found.text, "Dealer Locator");
            assert_eq!(found.region, "footer");
        }

        #[test]
        fn test_scope_major_prefers_header() {
            let doc = HtmlSnapshot::parse(PAGE);
            let synonyms = build_synonyms(&["dealer locator".into(), "where to buy".into()]).unwrap();
            let resolver = ControlResolver::new().with_order(ResolveOrder::ScopeMajor);
            let found = resolve_control(&doc, &resolver, &synonyms, &build_scope(&[])).unwrap();
            assert_eq!(found.text, "Where to Buy");
        }

        #[test]
        fn test_not_found_lists_anchors() {
            let doc = HtmlSnapshot::parse(PAGE);
            let synonyms = build_synonyms(&["service".into()]).unwrap();
            let resolver =
                ControlResolver::new().with_strategies(vec![Strategy::Role(Role::Button)]);
            let err = resolve_control(&doc, &resolver, &synonyms, &build_scope(&[])).unwrap_err();
            assert_eq!(err.diagnostics(), ["Where to Buy", "Dealer Locator"]);
        }
    }
}
