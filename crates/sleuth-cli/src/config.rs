//! Settings derived from global flags: how loud to be, whether to style
//! output, and how to load pages.

use crate::commands::Cli;
use crate::output::Reporter;

/// How much the CLI says on stdout and in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Failures and errors only
    Quiet,
    /// Results and warnings
    #[default]
    Normal,
    /// `-v`
    Verbose,
    /// `-vv` and above
    Debug,
}

impl Verbosity {
    /// `-q` wins over any number of `-v`
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Whether passing results are suppressed
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Log filter used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// When to style stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Always style
    Always,
    /// Style only when stdout is a terminal
    #[default]
    Auto,
    /// Plain `PASS`/`FAIL` prefixes
    Never,
}

impl ColorChoice {
    /// Resolve `Auto` against the real stdout
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().is_term(),
        }
    }
}

/// Global settings shared by every subcommand
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    /// Output and log level
    pub verbosity: Verbosity,
    /// Styling of stdout
    pub color: ColorChoice,
    /// Emit log lines as JSON
    pub log_json: bool,
    /// Load pages in Chromium instead of fetching HTML
    pub browser: bool,
}

impl CliConfig {
    /// Collect the global flags
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbosity: Verbosity::from_flags(cli.quiet, cli.verbose),
            color: cli.color.clone().into(),
            log_json: cli.log_json,
            browser: cli.browser,
        }
    }

    /// Reporter honoring color and quiet settings
    #[must_use]
    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.color.should_color(), self.verbosity.is_quiet())
    }
}
