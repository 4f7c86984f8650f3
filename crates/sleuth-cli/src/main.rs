//! Sleuth CLI: one-shot checks against a single page
//!
//! ## Usage
//!
//! ```bash
//! sleuth links https://www.boschtools.com/us/en/           # footer link health
//! sleuth extract <product-url> rpm Weight                   # spec facts
//! sleuth resolve <url> -n "dealer locator" -n "find a dealer"
//! sleuth inputs <dealer-locator-url>                        # ZIP field
//! sleuth config --defaults                                  # YAML defaults
//! ```

use clap::Parser;
use sleuth::SleuthConfig;
use sleuth_cli::{handlers, logging, Cli, CliConfig, CliError, CliResult, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = CliConfig::from_cli(&cli);
    logging::init(config.verbosity, config.log_json);
    let sleuth = load_sleuth_config(&cli)?;

    if let Commands::Config(args) = &cli.command {
        return handlers::execute_config(&config, &sleuth, args);
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;

    rt.block_on(async {
        match &cli.command {
            Commands::Links(args) => handlers::execute_links(&config, &sleuth, args).await,
            Commands::Extract(args) => handlers::execute_extract(&config, &sleuth, args).await,
            Commands::Resolve(args) => handlers::execute_resolve(&config, &sleuth, args).await,
            Commands::Inputs(args) => handlers::execute_inputs(&config, &sleuth, args).await,
            Commands::Config(args) => handlers::execute_config(&config, &sleuth, args),
        }
    })
}

/// Config file (or defaults), then `--base-url`
fn load_sleuth_config(cli: &Cli) -> CliResult<SleuthConfig> {
    let mut sleuth = match &cli.config {
        Some(path) => SleuthConfig::from_path(path)?,
        None => SleuthConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        sleuth = sleuth.with_base_url(url.as_str());
    }
    sleuth.validate()?;
    Ok(sleuth)
}
