//! Output formatting

use crate::error::CliResult;
use console::{style, Term};
use serde::Serialize;
use sleuth::{Candidate, Fact, LinkRecord, LinkReport, LinkStatus};

/// Writes results to stdout, styled when color is on
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&format!("{} {message}", self.prefix("✓", "PASS", Tone::Good)));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line(&format!("{} {message}", self.prefix("✗", "FAIL", Tone::Bad)));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&format!("{} {message}", self.prefix("⚠", "WARN", Tone::Warn)));
    }

    /// Print a plain line
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(message);
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: Serialize>(&self, value: &T) -> CliResult<()> {
        let rendered = serde_json::to_string_pretty(value)?;
        self.line(&rendered);
        Ok(())
    }

    /// Print every record, then a summary
    pub fn link_report(&self, report: &LinkReport) {
        for record in &report.records {
            if record.failed {
                self.failure(&render_link(record));
            } else if matches!(record.status, LinkStatus::Skipped(_)) {
                self.warning(&render_link(record));
            } else {
                self.success(&render_link(record));
            }
        }
        let failed = report.failures().count();
        let summary = format!(
            "{} links: {} healthy, {} skipped, {failed} failed",
            report.records.len(),
            report.healthy_count(),
            report.skipped_count(),
        );
        if failed == 0 {
            self.info(&summary);
        } else {
            self.failure(&summary);
        }
    }

    /// Print one extracted fact
    pub fn fact(&self, fact: &Fact) {
        self.success(&render_fact(fact));
    }

    /// Print one resolved element
    pub fn candidate(&self, candidate: &Candidate) {
        self.success(&render_candidate(candidate));
    }

    /// Print the diagnostics attached to a lookup that came back empty
    pub fn diagnostics(&self, what: &str, diagnostics: &[String]) {
        self.failure(&format!("{what}: nothing found"));
        for entry in diagnostics {
            self.line(&format!("    {entry}"));
        }
    }

    fn prefix(&self, symbol: &str, word: &str, tone: Tone) -> String {
        if !self.use_color {
            return word.to_string();
        }
        let styled = style(symbol).bold();
        match tone {
            Tone::Good => styled.green(),
            Tone::Bad => styled.red(),
            Tone::Warn => styled.yellow(),
        }
        .to_string()
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Warn,
}

/// `"text" url -> status`
#[must_use]
pub fn render_link(record: &LinkRecord) -> String {
    format!("\"{}\" {} -> {}", record.text, record.url, record.status)
}

/// `key = value [source via alias]`
#[must_use]
pub fn render_fact(fact: &Fact) -> String {
    format!(
        "{} = {} [{} via \"{}\"]",
        fact.key, fact.value, fact.source, fact.alias
    )
}

/// `<tag> "text" in region (query) at path`
#[must_use]
pub fn render_candidate(candidate: &Candidate) -> String {
    format!(
        "<{}> \"{}\" in {} ({}) at {}",
        candidate.tag, candidate.text, candidate.region, candidate.matched_by, candidate.path
    )
}
