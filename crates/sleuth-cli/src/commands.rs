//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use url::Url;

/// Sleuth: resilient fact-finding on live retail pages
#[derive(Parser, Debug)]
#[command(name = "sleuth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "SLEUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured base URL
    #[arg(long, global = true, env = "SLEUTH_BASE_URL")]
    pub base_url: Option<Url>,

    /// Load pages in Chromium instead of fetching static HTML
    #[arg(long, global = true)]
    pub browser: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that every link in a page region answers with a healthy status
    Links(LinksArgs),

    /// Extract specification facts by key (e.g. rpm, Weight)
    Extract(ExtractArgs),

    /// Find a control by any of its names
    Resolve(ResolveArgs),

    /// Find the ZIP code input
    Inputs(InputsArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the links command
#[derive(Parser, Debug)]
pub struct LinksArgs {
    /// Page to check
    pub url: Url,

    /// CSS selector for the region whose links are checked
    #[arg(short, long, default_value = "footer")]
    pub scope: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Page to read
    pub url: Url,

    /// Keys to extract
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Page to search
    pub url: Url,

    /// Phrase the control may be labelled with, in preference order
    #[arg(short = 'n', long = "synonym", required = true)]
    pub synonyms: Vec<String>,

    /// Region to search (header, footer, anywhere or a CSS selector), narrow first
    #[arg(short, long = "scope")]
    pub scopes: Vec<String>,

    /// Strategy chain, in order
    #[arg(long = "strategy", value_enum)]
    pub strategies: Vec<StrategyArg>,

    /// Exhaust every region for one synonym before the next (synonym),
    /// or every synonym in one region before the next (scope)
    #[arg(long, default_value = "synonym")]
    pub order: OrderArg,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the inputs command
#[derive(Parser, Debug)]
pub struct InputsArgs {
    /// Page to search
    pub url: Url,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show built-in defaults instead of the effective configuration
    #[arg(long)]
    pub defaults: bool,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Resolution strategy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    /// Links by accessible name
    Link,
    /// Buttons by accessible name
    Button,
    /// Tabs by accessible name
    Tab,
    /// Innermost element with matching text
    Text,
}

impl From<StrategyArg> for sleuth::Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Link => Self::Role(sleuth::Role::Link),
            StrategyArg::Button => Self::Role(sleuth::Role::Button),
            StrategyArg::Tab => Self::Role(sleuth::Role::Tab),
            StrategyArg::Text => Self::Text,
        }
    }
}

/// Resolution order argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderArg {
    /// Synonym-major
    #[default]
    Synonym,
    /// Scope-major
    Scope,
}

impl From<OrderArg> for sleuth::ResolveOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Synonym => Self::SynonymMajor,
            OrderArg::Scope => Self::ScopeMajor,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
