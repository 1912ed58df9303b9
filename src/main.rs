//! terraform-usage-gen entry point.
//!
//! This binary provides the command-line interface for tfusage.

use clap::Parser;
use std::process::ExitCode;
use tfusage::cli::Cli;
use tfusage::git::GitCli;
use tfusage::reporter::Reporter;
use tfusage::template::template_listing;
use tfusage::{Config, Processor, TfUsageError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            // Print error chain (cause chain)
            let mut causes = e.chain().skip(1).peekable();
            if causes.peek().is_some() {
                eprintln!("\nCaused by:");
                for (i, cause) in causes.enumerate() {
                    eprintln!("  {i}: {cause}");
                }
            }

            // Print backtrace if RUST_BACKTRACE is set
            let backtrace = e.backtrace();
            if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
                eprintln!("\nStack backtrace:");
                let rendered = format!("{backtrace}");
                let mut in_tfusage = false;
                for line in rendered.lines() {
                    let trimmed = line.trim();
                    if trimmed.contains("tfusage::") {
                        in_tfusage = true;
                        eprintln!("{line}");
                    } else if in_tfusage && trimmed.starts_with("at ") {
                        eprintln!("{line}");
                        in_tfusage = false;
                    } else {
                        in_tfusage = false;
                    }
                }
            }

            let code = e
                .downcast_ref::<TfUsageError>()
                .map_or(1, TfUsageError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            // tfusage at the requested level, everything else at warn
            EnvFilter::new(format!("warn,tfusage={level}"))
        })
    };

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    if cli.list_templates {
        print!("{}", template_listing());
        return Ok(ExitCode::SUCCESS);
    }

    let current_dir = std::env::current_dir()?;
    let base_dir = cli.base_directory(&current_dir);

    tracing::debug!(base_dir = %base_dir.display(), "Loading configuration");
    let mut config = Config::load(cli.config.as_deref(), &base_dir)?;
    config.merge_cli_args(cli);
    tracing::debug!("Configuration loaded successfully");

    let reporter = Reporter::new(&config).with_quiet(cli.quiet);
    let inspector = GitCli::new(config.detection_timeout())?;
    let processor = Processor::new(config, Box::new(inspector))?;

    let directories = cli.target_directories(&base_dir);
    tracing::debug!(count = directories.len(), "Processing directories");
    let summary =
        processor.process_directories_with(&directories, |outcome| reporter.print_outcome(outcome))?;

    reporter.print_summary(&summary);

    if summary.has_failures() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
