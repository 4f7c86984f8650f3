//! Extract command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::fetch;
use crate::{ExtractArgs, FormatArg};
use serde::Serialize;
use sleuth::{snapshot, Document, Fact, FactExtractor, SleuthConfig, SleuthError};

/// Outcome of one key lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Lookup {
    /// Value found
    Found(Fact),
    /// Nothing matched; diagnostics list the labels that were on the page
    Missing {
        /// Key as requested
        key: String,
        /// Label-like text seen on the page
        diagnostics: Vec<String>,
    },
}

/// Execute the extract command. Fails when any key is missing.
pub async fn execute_extract(
    config: &CliConfig,
    sleuth: &SleuthConfig,
    args: &ExtractArgs,
) -> CliResult<()> {
    let loaded = fetch::load(&args.url, sleuth, config.browser).await?;
    let doc = snapshot(loaded.page()).await;
    loaded.close().await?;
    let doc = doc?;

    let extractor = FactExtractor::new(sleuth.aliases.clone());
    let lookups = extract_facts(&doc, &extractor, &args.keys)?;

    let reporter = config.reporter();
    match args.format {
        FormatArg::Text => {
            for lookup in &lookups {
                match lookup {
                    Lookup::Found(fact) => reporter.fact(fact),
                    Lookup::Missing { key, diagnostics } => reporter.diagnostics(key, diagnostics),
                }
            }
        }
        FormatArg::Json => reporter.json(&lookups)?,
    }

    let missing = lookups
        .iter()
        .filter(|l| matches!(l, Lookup::Missing { .. }))
        .count();
    if missing == 0 {
        Ok(())
    } else {
        Err(CliError::Missing {
            missing,
            total: lookups.len(),
        })
    }
}

/// Look every key up on one snapshot. Only NotFound becomes a
/// [`Lookup::Missing`]; other errors abort.
pub fn extract_facts<D: Document>(
    doc: &D,
    extractor: &FactExtractor,
    keys: &[String],
) -> CliResult<Vec<Lookup>> {
    keys.iter()
        .map(|key| match extractor.extract(doc, key) {
            Ok(fact) => Ok(Lookup::Found(fact)),
            Err(SleuthError::NotFound { diagnostics, .. }) => Ok(Lookup::Missing {
                key: key.clone(),
                diagnostics,
            }),
            Err(e) => Err(e.into()),
        })
        .collect()
}
