//! Human-readable run output.
//!
//! Each directory outcome becomes one or more lines. Successes go to
//! stdout; anything needing attention goes to stderr. Missing markers come
//! with the exact text to paste into the README, and stale blocks can be
//! shown as a line diff.

use crate::config::Config;
use crate::readme::{BEGIN_MARKER, END_MARKER};
use crate::types::{DirectoryOutcome, RunSummary, TargetStatus};

use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;

/// Output stream of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// One block of report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Where the text goes.
    pub stream: Stream,
    /// The text, without trailing newline.
    pub text: String,
}

impl ReportLine {
    fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stdout,
            text: text.into(),
        }
    }

    fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stderr,
            text: text.into(),
        }
    }
}

/// Formats directory outcomes.
#[derive(Debug, Clone)]
pub struct Reporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show diffs for stale blocks
    show_diff: bool,
    /// Whether to drop stdout lines
    quiet: bool,
}

impl Reporter {
    /// Create a new reporter.
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
            show_diff: config.output.diff,
            quiet: false,
        }
    }

    /// Suppress success messages.
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Report lines for one directory.
    #[must_use]
    pub fn format_outcome(&self, outcome: &DirectoryOutcome) -> Vec<ReportLine> {
        let directory = outcome.directory.display();
        let readme = outcome.readme.display();

        let mut lines = match &outcome.status {
            TargetStatus::NoVariableFile => vec![ReportLine::stderr(format!(
                "No variables.tf found in {directory}"
            ))],
            TargetStatus::NoVariables => vec![ReportLine::stderr(format!(
                "No variables found in {directory}"
            ))],
            TargetStatus::DirectoryNotFound => vec![ReportLine::stderr(format!(
                "{} Directory not found: {directory}",
                self.error_label()
            ))],
            TargetStatus::UpToDate => vec![ReportLine::stdout(format!(
                "Usage block in {readme} is {}",
                self.paint_ok("up to date")
            ))],
            TargetStatus::Updated => vec![ReportLine::stdout(format!(
                "{} {readme}",
                self.paint_ok("Updated")
            ))],
            TargetStatus::Unchanged => {
                vec![ReportLine::stdout(format!("No changes needed for {readme}"))]
            }
            TargetStatus::OutOfDate { current, expected } => {
                let mut lines = vec![ReportLine::stderr(format!(
                    "Usage block in {readme} is {}",
                    self.paint_error("out of date")
                ))];
                if self.show_diff {
                    lines.push(ReportLine::stderr(self.format_diff(current, expected)));
                }
                lines
            }
            TargetStatus::ReadmeNotFound => vec![ReportLine::stderr(format!(
                "{} README not found at {readme}",
                self.warning_label()
            ))],
            TargetStatus::ReadmeUnreadable { reason } => vec![ReportLine::stderr(format!(
                "{} Could not read {readme}: {reason}",
                self.warning_label()
            ))],
            TargetStatus::MarkersNotFound => vec![
                ReportLine::stderr(format!(
                    "{} Markers not found in {readme}",
                    self.warning_label()
                )),
                ReportLine::stderr("Please add the following markers to your README.md:"),
                ReportLine::stderr(BEGIN_MARKER),
                ReportLine::stderr(END_MARKER),
            ],
        };

        if self.quiet {
            lines.retain(|line| line.stream == Stream::Stderr);
        }
        lines
    }

    /// Closing line for a run, if there is anything to summarise.
    #[must_use]
    pub fn format_summary(&self, summary: &RunSummary) -> Option<ReportLine> {
        if self.quiet || summary.outcomes.len() < 2 {
            return None;
        }

        let failures = summary
            .outcomes
            .iter()
            .filter(|o| o.status.is_failure())
            .count();
        let text = format!(
            "Processed {} directories: {} updated, {} need attention",
            summary.outcomes.len(),
            summary.updated_count(),
            failures
        );

        Some(if failures == 0 {
            ReportLine::stdout(text)
        } else {
            ReportLine::stderr(text)
        })
    }

    /// Print one directory's report.
    pub fn print_outcome(&self, outcome: &DirectoryOutcome) {
        for line in self.format_outcome(outcome) {
            emit(&line);
        }
    }

    /// Print the closing summary line of a run.
    ///
    /// Outcomes are printed one by one with [`Self::print_outcome`].
    pub fn print_summary(&self, summary: &RunSummary) {
        if let Some(line) = self.format_summary(summary) {
            emit(&line);
        }
    }

    /// Line diff from the current block to the expected one.
    #[must_use]
    pub fn format_diff(&self, current: &str, expected: &str) -> String {
        let diff = TextDiff::from_lines(current, expected);
        let mut out = String::new();

        for change in diff.iter_all_changes() {
            let line = change.value().trim_end_matches('\n');
            let rendered = match change.tag() {
                ChangeTag::Delete => self.paint_error(&format!("-{line}")),
                ChangeTag::Insert => self.paint_ok(&format!("+{line}")),
                ChangeTag::Equal => format!(" {line}"),
            };
            let _ = writeln!(out, "  {rendered}");
        }

        out.trim_end_matches('\n').to_string()
    }

    fn paint_ok(&self, text: &str) -> String {
        if self.use_colors {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_error(&self, text: &str) -> String {
        if self.use_colors {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn warning_label(&self) -> String {
        if self.use_colors {
            "Warning:".yellow().bold().to_string()
        } else {
            "Warning:".to_string()
        }
    }

    fn error_label(&self) -> String {
        if self.use_colors {
            "Error:".red().bold().to_string()
        } else {
            "Error:".to_string()
        }
    }
}

fn emit(line: &ReportLine) {
    match line.stream {
        Stream::Stdout => println!("{}", line.text),
        Stream::Stderr => eprintln!("{}", line.text),
    }
}
