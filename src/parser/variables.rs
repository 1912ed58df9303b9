//! Brace-depth scanner for `variable` blocks.
//!
//! Braces are counted textually per line, so braces inside string literals
//! are not special-cased. An unterminated block runs to the end of input.

use crate::error::{ResultExt, Result};
use crate::parser::{find_variable_files, ParsedVariables, Parser};
use crate::types::Variable;

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// `variable "<name>" {`
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*variable\s+"([^"]+)"\s*\{"#).expect("Invalid regex")
});

static TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*type\s*=\s*(.+)$").expect("Invalid regex"));

static DESCRIPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bdescription\s*=\s*"([^"]*)""#).expect("Invalid regex")
});

static DEFAULT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdefault\s*=\s*").expect("Invalid regex"));

/// A line that opens a new attribute (`name = ...`) or nested block (`name {`).
static MEMBER_START_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_-]*\s*(?:=(?:[^=>]|$)|\{)").expect("Invalid regex")
});

/// Scanner for Terraform `variable` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableParser;

impl VariableParser {
    /// Create a new variable parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse every declaration file of a directory.
    ///
    /// A directory without `variables.tf` yields an empty result rather
    /// than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist or a declaration
    /// file cannot be read.
    pub fn parse_directory(&self, directory: &Path) -> Result<ParsedVariables> {
        if !directory.is_dir() {
            return Err(crate::err!(DirectoryNotFound {
                path: directory.to_path_buf(),
            }));
        }

        let mut result = ParsedVariables::default();
        for file in find_variable_files(directory) {
            tracing::debug!(file = %file.display(), "Parsing file");
            result.variables.extend(self.parse_file(&file)?);
            result.files.push(file);
        }

        tracing::debug!(
            directory = %directory.display(),
            files = result.files.len(),
            variables = result.variables.len(),
            "Parsing complete"
        );

        Ok(result)
    }

    /// Parse a single declaration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Variable>> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        Ok(self.parse_content(&content, path))
    }
}

impl Parser for VariableParser {
    fn parse_content(&self, content: &str, file_path: &Path) -> Vec<Variable> {
        let lines: Vec<&str> = content.lines().collect();
        let mut variables = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(caps) = HEADER_PATTERN.captures(lines[i]) else {
                i += 1;
                continue;
            };

            let name = caps[1].to_string();
            let rest = &lines[i][caps[0].len()..];
            let mut depth = 1 + brace_delta(rest);
            let mut body: Vec<&str> = Vec::new();
            i += 1;

            if depth <= 0 {
                // The block closes on its header line.
                let inner = rest.rfind('}').map_or(rest, |pos| &rest[..pos]);
                body.push(inner);
            } else {
                if !rest.trim().is_empty() {
                    body.push(rest);
                }
                while i < lines.len() && depth > 0 {
                    body.push(lines[i]);
                    depth += brace_delta(lines[i]);
                    i += 1;
                }
                if depth > 0 {
                    tracing::debug!(
                        file = %file_path.display(),
                        variable = %name,
                        "Unterminated variable block, closing at end of input"
                    );
                }
            }

            variables.push(parse_block_body(name, &body));
        }

        variables
    }
}

/// Net brace depth change of one line.
fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Extract the recognised attributes from the lines of a block body.
fn parse_block_body(name: String, lines: &[&str]) -> Variable {
    let text = lines.join("\n");

    let var_type = TYPE_PATTERN
        .captures(&text)
        .map_or_else(|| "any".to_string(), |c| c[1].trim().to_string());

    let description = DESCRIPTION_PATTERN
        .captures(&text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let default = extract_default(lines);

    Variable {
        name,
        var_type,
        description,
        default,
    }
}

/// Capture the raw `default` expression.
///
/// The value runs from `default =` up to the next line at the same depth
/// that opens another attribute or block, or up to the closing brace.
fn extract_default(lines: &[&str]) -> Option<String> {
    let mut depth = 0;
    let mut start = None;

    for (idx, line) in lines.iter().enumerate() {
        if let Some(m) = DEFAULT_PATTERN.find(line) {
            start = Some((idx, m.end(), depth));
            break;
        }
        depth += brace_delta(line);
    }

    let (idx, offset, base) = start?;
    let first = lines[idx];
    let mut parts = vec![&first[offset..]];
    let mut depth = base + brace_delta(first);

    for line in &lines[idx + 1..] {
        let at_base = depth <= base;
        if at_base && (MEMBER_START_PATTERN.is_match(line) || line.trim_start().starts_with('}')) {
            break;
        }
        parts.push(line);
        depth += brace_delta(line);
    }

    Some(parts.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(content: &str) -> Vec<Variable> {
        VariableParser::new().parse_content(content, Path::new("variables.tf"))
    }

    #[test]
    fn test_parse_simple_variable() {
        let vars = parse(
            r#"
variable "test_var" {
  description = "A test variable"
  type        = string
}
"#,
        );

        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name, "test_var");
        assert_eq!(vars[0].description, "A test variable");
        assert_eq!(vars[0].var_type, "string");
        assert_eq!(vars[0].default, None);
        assert!(!vars[0].is_optional());
    }

    #[test]
    fn test_parse_variable_with_default() {
        let vars = parse(
            r#"
variable "test_var" {
  description = "A test variable"
  type        = string
  default     = "default_value"
}
"#,
        );

        assert_eq!(vars[0].default.as_deref(), Some("\"default_value\""));
        assert!(vars[0].is_optional());
    }

    #[test]
    fn test_falsy_defaults_are_optional() {
        let vars = parse(
            r#"
variable "count" {
  default = 0
}

variable "enabled" {
  type    = bool
  default = false
}

variable "nothing" {
  default = null
}
"#,
        );

        let defaults: Vec<_> = vars.iter().map(|v| v.default.as_deref()).collect();
        assert_eq!(defaults, vec![Some("0"), Some("false"), Some("null")]);
        assert!(vars.iter().all(Variable::is_optional));
    }

    #[test]
    fn test_missing_fields_use_fallbacks() {
        let vars = parse("variable \"bare\" {\n}\n");
        assert_eq!(vars[0].var_type, "any");
        assert_eq!(vars[0].description, "");
        assert_eq!(vars[0].default, None);
    }

    #[test]
    fn test_preserves_file_order() {
        let vars = parse(
            r#"
variable "zeta" {
  type = string
}

variable "alpha" {
  default = 1
}

variable "mid" {
  type = number
}
"#,
        );

        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_multiline_map_default_captured_whole() {
        let vars = parse(
            r#"
variable "tags" {
  description = "Tags to apply"
  default = {
    Environment = "dev"
    Team        = "platform"
  }
  type = map(string)
}
"#,
        );

        assert_eq!(
            vars[0].default.as_deref(),
            Some("{\n    Environment = \"dev\"\n    Team        = \"platform\"\n  }")
        );
        assert_eq!(vars[0].var_type, "map(string)");
    }

    #[test]
    fn test_default_stops_at_next_attribute() {
        let vars = parse(
            r#"
variable "zones" {
  default = [
    "a",
    "b",
  ]
  description = "Availability zones"
}
"#,
        );

        assert_eq!(vars[0].default.as_deref(), Some("[\n    \"a\",\n    \"b\",\n  ]"));
        assert_eq!(vars[0].description, "Availability zones");
    }

    #[test]
    fn test_default_stops_before_nested_block() {
        let vars = parse(
            r#"
variable "size" {
  type    = number
  default = 3

  validation {
    condition     = var.size > 0
    error_message = "Size must be positive."
  }
}
"#,
        );

        assert_eq!(vars[0].default.as_deref(), Some("3"));
    }

    #[test]
    fn test_list_of_objects_default() {
        let vars = parse(
            r#"
variable "rules" {
  default = [
    {
      name = "ssh"
      port = 22
    }
  ]
}
"#,
        );

        let default = vars[0].default.as_deref().unwrap();
        assert!(default.starts_with('['));
        assert!(default.ends_with(']'));
        assert!(default.contains("port = 22"));
    }

    #[test]
    fn test_single_line_blocks() {
        let vars = parse(
            r#"
variable "region" {}
variable "replicas" { default = 2 }
variable "name" {
  type = string
}
"#,
        );

        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["region", "replicas", "name"]);
        assert_eq!(vars[0].default, None);
        assert_eq!(vars[1].default.as_deref(), Some("2"));
        assert_eq!(vars[2].var_type, "string");
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        let vars = parse("variable \"open\" {\n  type = string\n  default = \"x\"\n");
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].var_type, "string");
        assert_eq!(vars[0].default.as_deref(), Some("\"x\""));
    }

    #[test]
    fn test_duplicates_pass_through() {
        let vars = parse("variable \"a\" {\n}\nvariable \"a\" {\n  default = 1\n}\n");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name, vars[1].name);
    }

    #[test]
    fn test_ignores_other_blocks() {
        let vars = parse(
            r#"
locals {
  variable = "not a declaration"
}

output "id" {
  value = "x"
}
"#,
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_parse_directory_reads_variables_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("variables.tf"),
            "variable \"name\" {\n  type = string\n}\n",
        )
        .unwrap();

        let parsed = VariableParser::new().parse_directory(dir.path()).unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.variables.len(), 1);
    }

    #[test]
    fn test_parse_directory_missing_directory() {
        let result = VariableParser::new().parse_directory(Path::new("/definitely/not/here"));
        assert!(matches!(
            result,
            Err(crate::error::TfUsageError::DirectoryNotFound { .. })
        ));
    }
}
