//! Config command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;
use crate::ConfigArgs;
use sleuth::SleuthConfig;

/// Execute the config command
pub fn execute_config(
    config: &CliConfig,
    sleuth: &SleuthConfig,
    args: &ConfigArgs,
) -> CliResult<()> {
    // Printed even under -q
    let reporter = Reporter::new(config.color.should_color(), false);
    reporter.info(&render_config(sleuth, args.defaults)?);
    Ok(())
}

/// Effective (or default) configuration as YAML
pub fn render_config(sleuth: &SleuthConfig, defaults: bool) -> CliResult<String> {
    let yaml = if defaults {
        SleuthConfig::default().to_yaml()?
    } else {
        sleuth.to_yaml()?
    };
    Ok(yaml)
}
