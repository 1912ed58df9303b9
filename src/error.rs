//! Error types for tfusage.
//!
//! This module defines the error hierarchy using `thiserror`. Errors carry
//! the source location where they were raised so diagnostics can point back
//! into the code.
//!
//! # Error Categories
//!
//! - **IO errors**: reading `variables.tf`, reading and writing the README
//! - **Target errors**: missing README, missing usage block markers
//! - **Template errors**: unknown template, invalid syntax, unknown slots
//! - **Config errors**: invalid configuration files or values
//!
//! Repository detection never produces an error: the inspector reports
//! "no value" instead (see [`crate::git::RepositoryInspector`]).
//!
//! # Example
//!
//! ```rust
//! use tfusage::error::{TfUsageError, Result};
//!
//! fn read_variables(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| TfUsageError::io(path, e, file!(), line!()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(MarkersNotFound { path: readme.to_path_buf() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::TfUsageError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfusage operations.
pub type Result<T> = std::result::Result<T, TfUsageError>;

/// The main error type for tfusage.
#[derive(Error, Debug)]
pub enum TfUsageError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // README Errors
    // =========================================================================
    /// The target README does not exist.
    #[error("README not found at {path} ({src_path}:{src_line})")]
    ReadmeNotFound {
        /// The expected README path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The usage block markers are missing or out of order.
    #[error("Markers not found in {path} ({src_path}:{src_line})")]
    MarkersNotFound {
        /// The README that lacks the markers
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The target README exists but could not be read.
    #[error("Failed to read README at {path} ({src_path}:{src_line}): {source}")]
    ReadmeUnreadable {
        /// The README path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Template Errors
    // =========================================================================
    /// Unknown built-in template name.
    #[error("Template not found: '{name}' ({src_path}:{src_line})")]
    TemplateNotFound {
        /// The requested template name
        name: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The template could not be compiled.
    #[error("Invalid template '{template}' ({src_path}:{src_line}): {message}")]
    TemplateSyntax {
        /// Template name or path
        template: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Slot substitution failed, usually an unknown slot name.
    #[error("Template rendering error in '{template}' ({src_path}:{src_line}): {message}")]
    TemplateRender {
        /// Template name or path
        template: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl TfUsageError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
        src_path: &'static str,
        src_line: u32,
    ) -> Self {
        Self::Io {
            path: path.into(),
            source,
            src_path,
            src_line,
        }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        src_path: &'static str,
        src_line: u32,
    ) -> Self {
        Self::ConfigParse {
            message,
            source,
            src_path,
            src_line,
        }
    }

    /// Determines if the error only affects the current target directory,
    /// so processing should continue with the next one.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ReadmeNotFound { .. }
                | Self::MarkersNotFound { .. }
                | Self::ReadmeUnreadable { .. }
                | Self::DirectoryNotFound { .. }
        )
    }

    /// Returns the appropriate exit code for a fatal error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::DirectoryNotFound { .. } => 15,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            Self::TemplateNotFound { .. } | Self::TemplateSyntax { .. } | Self::TemplateRender { .. } => 23,
            _ => 2,
        }
    }
}

/// Extension trait for `Result` to add context to errors.
pub trait ResultExt<T> {
    /// Adds a file path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| TfUsageError::Io {
            path: path.into(),
            source,
            src_path: file!(),
            src_line: line!(),
        })
    }
}

impl From<std::io::Error> for TfUsageError {
    fn from(source: std::io::Error) -> Self {
        // Prefer `with_path` wherever the path is known.
        Self::Io {
            path: PathBuf::new(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}
