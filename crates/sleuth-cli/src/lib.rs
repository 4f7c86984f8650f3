//! Sleuth CLI Library
//!
//! Command-line interface over the Sleuth library: one-shot link checks,
//! fact extraction and control resolution against a single page.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod fetch;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ExtractArgs, FormatArg, InputsArgs, LinksArgs, OrderArg,
    ResolveArgs, StrategyArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use fetch::{fetch_static, load, LoadedPage};
pub use output::{render_candidate, render_fact, render_link, Reporter};
