//! Usage block generation.
//!
//! Required variables are listed first, as plain attributes with an empty
//! value column. Optional variables follow, commented out and showing their
//! default. Names and values are padded to common widths so the trailing
//! `# Required:` / `# Optional:` comments line up.

use crate::error::Result;
use crate::template::UsageTemplate;
use crate::types::{ResolvedMetadata, Variable};

use serde::Serialize;

/// Stand-in for defaults that span several lines.
pub const MULTILINE_PLACEHOLDER: &str = "...";

/// Values substituted into the usage template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageContext {
    /// Module label.
    pub module_name: String,
    /// Raw source, possibly empty.
    pub source: String,
    /// Raw version, possibly empty.
    pub version: String,
    /// `  source  = "..."` line, or empty.
    pub source_line: String,
    /// `  version = "..."` line, or empty.
    pub version_line: String,
    /// Required section, or empty.
    pub required_variables: String,
    /// Optional section, or empty.
    pub optional_variables: String,
}

impl UsageContext {
    /// Build the template context for a set of variables.
    #[must_use]
    pub fn new(variables: &[Variable], metadata: &ResolvedMetadata) -> Self {
        let (required, optional): (Vec<&Variable>, Vec<&Variable>) =
            variables.iter().partition(|v| !v.is_optional());

        let name_width = variables
            .iter()
            .map(|v| v.name.chars().count())
            .max()
            .unwrap_or(0);
        let value_width = optional
            .iter()
            .filter_map(|v| v.default.as_deref())
            .map(|d| display_default(d).chars().count())
            .max()
            .unwrap_or(0);

        let mut source_line = if metadata.source.is_empty() {
            String::new()
        } else {
            format!("  source  = \"{}\"\n", metadata.source)
        };
        let mut version_line = if metadata.version.is_empty() {
            String::new()
        } else {
            format!("  version = \"{}\"\n", metadata.version)
        };

        // Blank line between the metadata attributes and the variables.
        if !variables.is_empty() {
            if !version_line.is_empty() {
                version_line.push('\n');
            } else if !source_line.is_empty() {
                source_line.push('\n');
            }
        }

        let mut required_lines = Vec::new();
        if !required.is_empty() {
            required_lines.extend(banner("Required"));
            required_lines.extend(
                required
                    .iter()
                    .map(|v| format_variable(v, name_width, value_width)),
            );
        }

        let mut optional_lines = Vec::new();
        if !optional.is_empty() {
            if !required.is_empty() {
                optional_lines.push(String::new());
            }
            optional_lines.extend(banner("Optional"));
            optional_lines.extend(
                optional
                    .iter()
                    .map(|v| format_variable(v, name_width, value_width)),
            );
        }

        Self {
            module_name: metadata.module_name.clone(),
            source: metadata.source.clone(),
            version: metadata.version.clone(),
            source_line,
            version_line,
            required_variables: required_lines.join("\n"),
            optional_variables: optional_lines.join("\n"),
        }
    }
}

/// Default as shown in the usage block.
#[must_use]
pub fn display_default(default: &str) -> &str {
    let trimmed = default.trim();
    if trimmed.contains('\n') {
        MULTILINE_PLACEHOLDER
    } else {
        trimmed
    }
}

/// Format one variable line.
///
/// ```text
///   name     =                # Required: description
///   # region = "eu-west-1"    # Optional: description
/// ```
#[must_use]
pub fn format_variable(variable: &Variable, name_width: usize, value_width: usize) -> String {
    match variable.default.as_deref() {
        Some(default) => format!(
            "  # {:<name_width$} = {:<value_width$} # Optional: {}",
            variable.name,
            display_default(default),
            variable.description
        ),
        None => format!(
            "  {:<name_width$} = {:<value_width$} # Required: {}",
            variable.name, "", variable.description
        ),
    }
}

fn banner(label: &str) -> [String; 3] {
    let rule = format!("  {}", "#".repeat(label.len() + 4));
    [rule.clone(), format!("  # {label} #"), rule]
}

/// Renders usage blocks with a fixed template.
#[derive(Debug, Clone, Default)]
pub struct UsageGenerator {
    template: UsageTemplate,
}

impl UsageGenerator {
    /// Create a generator for a template.
    #[must_use]
    pub const fn new(template: UsageTemplate) -> Self {
        Self { template }
    }

    /// The template in use.
    #[must_use]
    pub const fn template(&self) -> &UsageTemplate {
        &self.template
    }

    /// Generate the usage block.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn generate(&self, variables: &[Variable], metadata: &ResolvedMetadata) -> Result<String> {
        let context = UsageContext::new(variables, metadata);
        self.template.render(&context)
    }
}
