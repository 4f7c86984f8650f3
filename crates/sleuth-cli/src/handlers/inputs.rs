//! Inputs command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::fetch;
use crate::{FormatArg, InputsArgs};
use sleuth::{snapshot, Candidate, Document, InputResolver, SleuthConfig, SleuthError};

/// Execute the inputs command
pub async fn execute_inputs(
    config: &CliConfig,
    sleuth: &SleuthConfig,
    args: &InputsArgs,
) -> CliResult<()> {
    let loaded = fetch::load(&args.url, sleuth, config.browser).await?;
    let doc = snapshot(loaded.page()).await;
    loaded.close().await?;
    let doc = doc?;

    let reporter = config.reporter();
    match find_zip_input(&doc) {
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

/// First visible, enabled ZIP code field
pub fn find_zip_input<D: Document>(doc: &D) -> Result<Candidate, SleuthError> {
    InputResolver::default().resolve(doc, "ZIP code")
}
