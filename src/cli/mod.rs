//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap. The tool is a flat
//! command meant to run as a pre-commit hook: file arguments select the
//! module directories to process.
//!
//! # Example Usage
//!
//! ```bash
//! # Update README.md in the current directory
//! terraform-usage-gen
//!
//! # Pre-commit style: process the directories of the given files
//! terraform-usage-gen modules/vpc/variables.tf modules/iam/main.tf
//!
//! # Verify without writing, showing a diff of stale blocks
//! terraform-usage-gen --check --diff --dir modules/vpc
//!
//! # Pin metadata and skip repository detection
//! terraform-usage-gen --module-name vpc --source github.com/acme/vpc --no-auto-detect
//!
//! # Use a built-in or custom template
//! terraform-usage-gen --template compact
//! terraform-usage-gen --template docs/usage.tpl
//! ```

use crate::types::Mode;
use clap::{ArgAction, Parser};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Generate and maintain Terraform module usage examples in README files.
#[derive(Parser, Debug)]
#[command(
    name = "terraform-usage-gen",
    author,
    version,
    disable_version_flag = true,
    about = "Generate Terraform module usage blocks in README files",
    long_about = "Parses variables.tf, renders a ready-to-paste module block with required \
                  and optional inputs, and keeps it up to date between \
                  BEGIN_AUTOMATED_TF_USAGE_BLOCK / END_AUTOMATED_TF_USAGE_BLOCK markers \
                  in README.md. Module name, source and version are taken from flags, \
                  the Git repository, or values saved in the README."
)]
pub struct Cli {
    /// Files to process; the directory of each .tf file is a target
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Directory to process when no .tf files are given
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// README path (default: README.md in each target directory)
    #[arg(long, value_name = "PATH")]
    pub readme: Option<PathBuf>,

    /// Only check whether README files are up to date
    #[arg(long)]
    pub check: bool,

    /// Show a diff for out-of-date usage blocks
    #[arg(long)]
    pub diff: bool,

    /// Module name for the usage example
    #[arg(long, value_name = "NAME")]
    pub module_name: Option<String>,

    /// Module source
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Module version
    #[arg(long = "version", value_name = "VERSION")]
    pub module_version: Option<String>,

    /// Disable repository auto-detection
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Ignore module name, source and version saved in the README
    #[arg(long)]
    pub force_autodetect: bool,

    /// Ignore the module name saved in the README
    #[arg(long)]
    pub force_autodetect_module: bool,

    /// Ignore the source saved in the README
    #[arg(long)]
    pub force_autodetect_source: bool,

    /// Ignore the version saved in the README
    #[arg(long)]
    pub force_autodetect_version: bool,

    /// Built-in template name or path to a template file
    #[arg(short, long, value_name = "NAME|PATH")]
    pub template: Option<String>,

    /// List built-in templates and exit
    #[arg(long)]
    pub list_templates: bool,

    /// Path to configuration file
    #[arg(short, long, env = "TFUSAGE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Print version
    #[arg(short = 'V', long = "tool-version", action = ArgAction::Version)]
    pub tool_version: Option<bool>,
}

impl Cli {
    /// Operating mode selected by `--check`.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else {
            Mode::Update
        }
    }

    /// Directory used for configuration lookup and as the default target.
    #[must_use]
    pub fn base_directory(&self, current_dir: &Path) -> PathBuf {
        match &self.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => current_dir.join(dir),
            None => current_dir.to_path_buf(),
        }
    }

    /// Directories to process, sorted and deduplicated.
    ///
    /// Each `.tf` file argument contributes its parent directory. Without
    /// any `.tf` file the base directory is processed.
    #[must_use]
    pub fn target_directories(&self, base_dir: &Path) -> Vec<PathBuf> {
        let directories: BTreeSet<PathBuf> = self
            .files
            .iter()
            .filter(|file| file.extension().is_some_and(|ext| ext == "tf"))
            .map(|file| match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            })
            .collect();

        if directories.is_empty() {
            vec![base_dir.to_path_buf()]
        } else {
            directories.into_iter().collect()
        }
    }
}
