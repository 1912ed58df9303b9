//! Core data types shared across tfusage.
//!
//! - [`Variable`]: one parsed `variable` declaration
//! - [`ResolvedMetadata`]: the module name / source / version triple
//! - [`Mode`]: check or update
//! - [`TargetStatus`] and [`DirectoryOutcome`]: per-directory results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Fallback module name when nothing else is known.
pub const DEFAULT_MODULE_NAME: &str = "example";

/// A parsed Terraform `variable` block.
///
/// A variable is optional exactly when its block contains a `default`
/// attribute, whatever the value (`null`, `0` and `false` included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name from the block label.
    pub name: String,

    /// Raw type expression, `any` when the block has no `type`.
    #[serde(rename = "type")]
    pub var_type: String,

    /// Description text, empty when absent.
    pub description: String,

    /// Raw default expression. `None` means the variable is required.
    pub default: Option<String>,
}

impl Variable {
    /// Create a new variable record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        var_type: impl Into<String>,
        description: impl Into<String>,
        default: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            var_type: var_type.into(),
            description: description.into(),
            default,
        }
    }

    /// Whether the variable has a default value.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Module metadata rendered into the usage block and persisted in the README.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    /// Module label used in `module "<name>" { ... }`.
    pub module_name: String,
    /// Module source, empty when unknown.
    pub source: String,
    /// Module version, empty when unknown.
    pub version: String,
}

impl ResolvedMetadata {
    /// Value of one field.
    #[must_use]
    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::ModuleName => &self.module_name,
            MetadataField::Source => &self.source,
            MetadataField::Version => &self.version,
        }
    }

    /// Create a metadata triple.
    #[must_use]
    pub fn new(
        module_name: impl Into<String>,
        source: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            source: source.into(),
            version: version.into(),
        }
    }
}

/// One of the three metadata fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    /// The module label.
    ModuleName,
    /// The module source.
    Source,
    /// The module version.
    Version,
}

impl MetadataField {
    /// All fields, in resolution order.
    pub const ALL: [Self; 3] = [Self::ModuleName, Self::Source, Self::Version];

    /// Label of the README comment persisting this field.
    #[must_use]
    pub const fn comment_label(self) -> &'static str {
        match self {
            Self::ModuleName => "MODULE",
            Self::Source => "SOURCE",
            Self::Version => "VERSION",
        }
    }

    /// Value used when every other layer came up empty.
    #[must_use]
    pub const fn fallback(self) -> Option<&'static str> {
        match self {
            Self::ModuleName => Some(DEFAULT_MODULE_NAME),
            Self::Source | Self::Version => None,
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleName => write!(f, "module_name"),
            Self::Source => write!(f, "source"),
            Self::Version => write!(f, "version"),
        }
    }
}

/// Operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Rewrite the usage block in place.
    #[default]
    Update,
    /// Only compare, never write.
    Check,
}

/// Result of processing one target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// The directory has no `variables.tf`.
    NoVariableFile,
    /// `variables.tf` exists but declares nothing.
    NoVariables,
    /// Check mode: the README block matches.
    UpToDate,
    /// Check mode: the README block differs.
    OutOfDate {
        /// Trimmed content currently between the markers.
        current: String,
        /// Trimmed content that would be written.
        expected: String,
    },
    /// Update mode: the README was rewritten.
    Updated,
    /// Update mode: the README already had this content.
    Unchanged,
    /// The README does not exist.
    ReadmeNotFound,
    /// The README lacks the usage block markers.
    MarkersNotFound,
    /// The README exists but could not be read.
    ReadmeUnreadable {
        /// Reason reported by the filesystem.
        reason: String,
    },
    /// The target directory does not exist.
    DirectoryNotFound,
}

impl TargetStatus {
    /// Whether this status should make the process exit non-zero.
    ///
    /// Pre-commit treats a modified file as a failure, so `Updated` counts.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::OutOfDate { .. }
                | Self::Updated
                | Self::ReadmeNotFound
                | Self::MarkersNotFound
                | Self::ReadmeUnreadable { .. }
                | Self::DirectoryNotFound
        )
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVariableFile => write!(f, "no variables file"),
            Self::NoVariables => write!(f, "no variables"),
            Self::UpToDate => write!(f, "up to date"),
            Self::OutOfDate { .. } => write!(f, "out of date"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::ReadmeNotFound => write!(f, "readme not found"),
            Self::MarkersNotFound => write!(f, "markers not found"),
            Self::ReadmeUnreadable { reason } => write!(f, "readme unreadable: {reason}"),
            Self::DirectoryNotFound => write!(f, "directory not found"),
        }
    }
}

/// Outcome for a single directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryOutcome {
    /// The processed directory.
    pub directory: PathBuf,
    /// The README that was (or would have been) checked or updated.
    pub readme: PathBuf,
    /// What happened.
    pub status: TargetStatus,
}

/// Outcomes for a whole run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One entry per processed directory.
    pub outcomes: Vec<DirectoryOutcome>,
}

impl RunSummary {
    /// Whether any directory needs attention.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_failure())
    }

    /// Number of README files rewritten.
    #[must_use]
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TargetStatus::Updated)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_variable() {
        let var = Variable::new("test_var", "string", "Test variable", None);
        assert!(!var.is_optional());
        assert_eq!(var.name, "test_var");
        assert_eq!(var.var_type, "string");
    }

    #[test]
    fn test_optional_variable_with_falsy_default() {
        for default in ["0", "false", "null", "\"\""] {
            let var = Variable::new("flag", "any", "", Some(default.to_string()));
            assert!(var.is_optional(), "default {default} should be optional");
        }
    }

    #[test]
    fn test_status_failures() {
        assert!(TargetStatus::Updated.is_failure());
        assert!(TargetStatus::MarkersNotFound.is_failure());
        assert!(TargetStatus::OutOfDate {
            current: String::new(),
            expected: "x".to_string(),
        }
        .is_failure());
        assert!(!TargetStatus::UpToDate.is_failure());
        assert!(!TargetStatus::Unchanged.is_failure());
        assert!(!TargetStatus::NoVariableFile.is_failure());
        assert!(!TargetStatus::NoVariables.is_failure());
        assert!(TargetStatus::DirectoryNotFound.is_failure());
        assert!(TargetStatus::ReadmeUnreadable {
            reason: "denied".to_string()
        }
        .is_failure());
    }

    #[test]
    fn test_only_module_name_has_fallback() {
        assert_eq!(MetadataField::ModuleName.fallback(), Some("example"));
        assert_eq!(MetadataField::Source.fallback(), None);
        assert_eq!(MetadataField::Version.fallback(), None);
    }

    #[test]
    fn test_run_summary_counts() {
        let summary = RunSummary {
            outcomes: vec![
                DirectoryOutcome {
                    directory: PathBuf::from("a"),
                    readme: PathBuf::from("a/README.md"),
                    status: TargetStatus::Updated,
                },
                DirectoryOutcome {
                    directory: PathBuf::from("b"),
                    readme: PathBuf::from("b/README.md"),
                    status: TargetStatus::Unchanged,
                },
            ],
        };
        assert!(summary.has_failures());
        assert_eq!(summary.updated_count(), 1);
    }
}
