//! Terraform variable declaration parsing.
//!
//! This module finds `variables.tf` in a module directory and extracts
//! `variable` blocks from it with a brace-depth scanner. It is deliberately
//! not a full HCL parser: only `type`, `description` and `default` are read.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tfusage::parser::VariableParser;
//!
//! fn main() -> tfusage::Result<()> {
//!     let parser = VariableParser::new();
//!     let parsed = parser.parse_directory(Path::new("./modules/vpc"))?;
//!     println!("Found {} variables", parsed.variables.len());
//!     Ok(())
//! }
//! ```

mod variables;

pub use variables::VariableParser;

use crate::types::Variable;
use std::path::{Path, PathBuf};

/// The declaration file read in each target directory.
pub const VARIABLE_FILE_NAME: &str = "variables.tf";

/// Sibling files a module may also carry. Only [`VARIABLE_FILE_NAME`] is read.
pub const CANDIDATE_PATTERNS: &[&str] = &["variables.tf", "*.tfvars", "terraform.tfvars"];

/// Result of parsing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedVariables {
    /// Declaration files that were read.
    pub files: Vec<PathBuf>,
    /// Variables in file order.
    pub variables: Vec<Variable>,
}

/// Trait for extracting variables from declaration text.
///
/// This allows for different parsing implementations
/// (e.g., for testing with canned declarations).
pub trait Parser {
    /// Parse a single file's contents into variables, in declaration order.
    fn parse_content(&self, content: &str, file_path: &Path) -> Vec<Variable>;
}

/// Return the declaration files of a directory that tfusage reads.
#[must_use]
pub fn find_variable_files(directory: &Path) -> Vec<PathBuf> {
    let candidate = directory.join(VARIABLE_FILE_NAME);
    if candidate.is_file() {
        vec![candidate]
    } else {
        Vec::new()
    }
}
