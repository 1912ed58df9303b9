//! # tfusage
//!
//! Generates the usage example of a Terraform module and keeps it current in
//! the module's README.
//!
//! tfusage reads `variables.tf`, renders a `module "<name>" { ... }` block
//! listing required inputs and (commented out) optional inputs with their
//! defaults, and splices it between two HTML comment markers in `README.md`.
//!
//! ## Features
//!
//! - **Variable scanning**: brace-depth extraction of `type`, `description`
//!   and `default`, including multi-line defaults
//! - **Metadata resolution**: module name, source and version from flags,
//!   the Git repository, or values persisted in the README
//! - **Version detection**: next version from conventional commits since
//!   the latest tag
//! - **Templates**: four built-in layouts or a custom template file
//! - **Check mode**: verify without writing, for CI and pre-commit
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tfusage::{git::GitCli, Config, Processor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let inspector = GitCli::new(config.detection_timeout())?;
//!     let processor = Processor::new(config, Box::new(inspector))?;
//!
//!     let outcome = processor.process_directory(Path::new("./modules/vpc"))?;
//!     println!("{}: {}", outcome.readme.display(), outcome.status);
//!     Ok(())
//! }
//! ```

// Note: README is not included as doc to avoid doctest failures
// See README.md for full documentation
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod git;
pub mod parser;
pub mod readme;
pub mod reporter;
pub mod resolver;
pub mod template;
pub mod types;
pub mod version;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, TfUsageError};
pub use generator::UsageGenerator;
pub use template::UsageTemplate;
pub use types::{DirectoryOutcome, Mode, ResolvedMetadata, RunSummary, TargetStatus, Variable};

use crate::git::RepositoryInspector;
use crate::parser::VariableParser;
use crate::readme::{CheckOutcome, ReadmeDocument, UpdateOutcome, README_FILE_NAME};
use crate::resolver::MetadataResolver;

use std::path::{Path, PathBuf};

/// Runs the parse, resolve, generate, check/update pipeline per directory.
///
/// Directories are processed one at a time with no state carried between
/// them. Problems confined to one directory (no README, no markers) become
/// a [`TargetStatus`]; anything else aborts the run.
///
/// # Example
///
/// ```rust,no_run
/// use tfusage::{git::GitCli, Config, Mode, Processor};
///
/// fn main() -> anyhow::Result<()> {
///     let mut config = Config::default();
///     config.mode = Mode::Check;
///     let inspector = GitCli::new(config.detection_timeout())?;
///     let processor = Processor::new(config, Box::new(inspector))?;
///
///     let summary = processor.process_directories(&["./modules/vpc", "./modules/iam"])?;
///     if summary.has_failures() {
///         std::process::exit(1);
///     }
///     Ok(())
/// }
/// ```
pub struct Processor {
    config: Config,
    parser: VariableParser,
    generator: UsageGenerator,
    inspector: Box<dyn RepositoryInspector>,
}

impl Processor {
    /// Create a processor.
    ///
    /// The template is resolved and compiled up front, so a broken template
    /// fails before any README is touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the template file cannot be read or doesn't
    /// compile.
    pub fn new(config: Config, inspector: Box<dyn RepositoryInspector>) -> Result<Self> {
        let template = UsageTemplate::resolve(config.template.as_deref())?;
        template.validate()?;
        tracing::debug!(template = %template.name(), mode = ?config.mode, "Processor ready");

        Ok(Self {
            config,
            parser: VariableParser::new(),
            generator: UsageGenerator::new(template),
            inspector,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// README path for a directory.
    #[must_use]
    pub fn readme_path(&self, directory: &Path) -> PathBuf {
        self.config
            .readme
            .clone()
            .unwrap_or_else(|| directory.join(README_FILE_NAME))
    }

    /// Process one directory.
    ///
    /// # Errors
    ///
    /// Returns an error for failures that are not specific to this
    /// directory: unreadable `variables.tf`, template rendering errors, or
    /// a README that cannot be written.
    pub fn process_directory(&self, directory: &Path) -> Result<DirectoryOutcome> {
        let readme = self.readme_path(directory);
        let outcome = |status| DirectoryOutcome {
            directory: directory.to_path_buf(),
            readme: readme.clone(),
            status,
        };

        tracing::info!(directory = %directory.display(), "Processing directory");

        let parsed = match self.parser.parse_directory(directory) {
            Ok(parsed) => parsed,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(directory = %directory.display(), error = %e, "Skipping directory");
                return Ok(outcome(target_status(&e)));
            }
            Err(e) => return Err(e),
        };

        if parsed.files.is_empty() {
            return Ok(outcome(TargetStatus::NoVariableFile));
        }
        if parsed.variables.is_empty() {
            return Ok(outcome(TargetStatus::NoVariables));
        }

        let document = match ReadmeDocument::load(&readme) {
            Ok(document) => Ok(document),
            Err(e) if e.is_recoverable() => Err(e),
            Err(e) => return Err(e),
        };

        let persisted = document.as_ref().ok().map(ReadmeDocument::persisted_metadata);
        let metadata = MetadataResolver::new(self.inspector.as_ref(), &self.config)
            .resolve(directory, persisted.as_ref());
        tracing::debug!(
            module_name = %metadata.module_name,
            source = %metadata.source,
            version = %metadata.version,
            "Resolved metadata"
        );

        let usage_block = self.generator.generate(&parsed.variables, &metadata)?;

        let status = match document {
            Ok(document) => self.apply(document, &metadata, &usage_block)?,
            Err(e) => {
                tracing::warn!(readme = %readme.display(), error = %e, "README unavailable");
                target_status(&e)
            }
        };

        Ok(outcome(status))
    }

    /// Process directories in order.
    ///
    /// # Errors
    ///
    /// Stops at the first directory that fails with a non-recoverable
    /// error.
    pub fn process_directories<P: AsRef<Path>>(&self, directories: &[P]) -> Result<RunSummary> {
        self.process_directories_with(directories, |_| {})
    }

    /// Process directories in order, handing each outcome to `on_outcome`
    /// as soon as it is known.
    ///
    /// Outcomes passed to `on_outcome` before a fatal error stay valid: their
    /// READMEs have already been written.
    ///
    /// # Errors
    ///
    /// Stops at the first directory that fails with a non-recoverable
    /// error.
    pub fn process_directories_with<P, F>(
        &self,
        directories: &[P],
        mut on_outcome: F,
    ) -> Result<RunSummary>
    where
        P: AsRef<Path>,
        F: FnMut(&DirectoryOutcome),
    {
        let mut summary = RunSummary::default();
        for directory in directories {
            let outcome = self.process_directory(directory.as_ref())?;
            on_outcome(&outcome);
            summary.outcomes.push(outcome);
        }
        Ok(summary)
    }

    fn apply(
        &self,
        mut document: ReadmeDocument,
        metadata: &ResolvedMetadata,
        usage_block: &str,
    ) -> Result<TargetStatus> {
        let result = match self.config.mode {
            Mode::Check => document
                .check(metadata, usage_block)
                .map(|outcome| match outcome {
                    CheckOutcome::UpToDate => TargetStatus::UpToDate,
                    CheckOutcome::OutOfDate { current, expected } => {
                        TargetStatus::OutOfDate { current, expected }
                    }
                }),
            Mode::Update => document
                .update(metadata, usage_block)
                .map(|outcome| match outcome {
                    UpdateOutcome::Updated => TargetStatus::Updated,
                    UpdateOutcome::Unchanged => TargetStatus::Unchanged,
                }),
        };

        match result {
            Ok(status) => Ok(status),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(readme = %document.path().display(), error = %e, "Skipping README");
                Ok(target_status(&e))
            }
            Err(e) => Err(e),
        }
    }
}

/// Status recorded for a recoverable error.
fn target_status(error: &TfUsageError) -> TargetStatus {
    match error {
        TfUsageError::ReadmeNotFound { .. } => TargetStatus::ReadmeNotFound,
        TfUsageError::MarkersNotFound { .. } => TargetStatus::MarkersNotFound,
        TfUsageError::DirectoryNotFound { .. } => TargetStatus::DirectoryNotFound,
        TfUsageError::ReadmeUnreadable { source, .. } => TargetStatus::ReadmeUnreadable {
            reason: source.to_string(),
        },
        other => TargetStatus::ReadmeUnreadable {
            reason: other.to_string(),
        },
    }
}
