//! Usage block templates.
//!
//! Templates are rendered with `minijinja`. The available slots are:
//!
//! | Slot                 | Content                                         |
//! |----------------------|-------------------------------------------------|
//! | `module_name`        | module label                                    |
//! | `source`, `version`  | raw metadata values, possibly empty             |
//! | `source_line`        | `  source  = "..."` line, or empty              |
//! | `version_line`       | `  version = "..."` line, or empty              |
//! | `required_variables` | banner and lines for required variables         |
//! | `optional_variables` | banner and commented lines for optional ones    |
//!
//! Template files name slots in single braces and double the braces they
//! want printed literally:
//!
//! ```text
//! # comment lines like this one are dropped
//! module "{module_name}" {{
//! {source_line}{version_line}
//! {required_variables}
//! {optional_variables}
//! }}
//! ```
//!
//! Files are translated to `minijinja` syntax when loaded. Referencing any
//! other slot is an error.

use crate::error::{Result, ResultExt, TfUsageError};

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

static SLOT_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

/// A literal `{` in translated output.
const LITERAL_OPEN_BRACE: &str = r#"{{ "{" }}"#;

/// Name of the template used when none is requested.
pub const DEFAULT_TEMPLATE_NAME: &str = "default";

/// A template shipped with tfusage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinTemplate {
    /// Name accepted by `--template`.
    pub name: &'static str,
    /// One-line summary for `--list-templates`.
    pub description: &'static str,
    /// Template source.
    pub source: &'static str,
}

/// All built-in templates, default first.
pub const BUILTIN_TEMPLATES: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        name: DEFAULT_TEMPLATE_NAME,
        description: "Standard format with code fences and sections",
        source: "```hcl\n\
                 module \"{{ module_name }}\" {\n\
                 {{ source_line }}{{ version_line }}\n\
                 {{ required_variables }}\n\
                 {{ optional_variables }}{% if optional_variables %}\n{% endif %}}\n\
                 ```",
    },
    BuiltinTemplate {
        name: "compact",
        description: "Compact format without extra spacing",
        source: "```hcl\n\
                 module \"{{ module_name }}\" {\n\
                 {{ source_line }}{{ version_line }}{{ required_variables }}\n\
                 {{ optional_variables }}{% if optional_variables %}\n{% endif %}}\n\
                 ```",
    },
    BuiltinTemplate {
        name: "minimal",
        description: "Just the module block, no code fences",
        source: "module \"{{ module_name }}\" {\n\
                 {{ source_line }}{{ version_line }}\n\
                 {{ required_variables }}\n\
                 {{ optional_variables }}{% if optional_variables %}\n{% endif %}}",
    },
    BuiltinTemplate {
        name: "detailed",
        description: "Extended format with usage instructions",
        source: "Add the following module block to your Terraform configuration:\n\
                 \n\
                 ```hcl\n\
                 module \"{{ module_name }}\" {\n\
                 {{ source_line }}{{ version_line }}\n\
                 {{ required_variables }}\n\
                 {{ optional_variables }}{% if optional_variables %}\n{% endif %}}\n\
                 ```\n\
                 \n\
                 Every variable in the Required section must be set. \
                 Optional variables show their defaults; uncomment one to override it.",
    },
];

/// Look up a built-in template by name.
#[must_use]
pub fn builtin(name: &str) -> Option<&'static BuiltinTemplate> {
    BUILTIN_TEMPLATES.iter().find(|t| t.name == name)
}

/// Remove lines whose first non-blank character is `#`.
#[must_use]
pub fn strip_comment_lines(content: &str) -> String {
    content
        .split('\n')
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Translate single-brace slot syntax into a `minijinja` template.
///
/// `{name}` becomes a slot reference, `{{` and `}}` become literal braces.
///
/// # Errors
///
/// Returns a description of the first malformed brace: an unclosed `{`, a
/// lone `}`, or a slot that isn't a plain name.
pub fn translate_slots(source: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' if chars.next_if(|&(_, next)| next == '{').is_some() => {
                out.push_str(LITERAL_OPEN_BRACE);
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, ch)) => name.push(ch),
                        None => return Err(format!("unclosed '{{' at offset {offset}")),
                    }
                }
                if !SLOT_NAME_PATTERN.is_match(&name) {
                    return Err(format!("invalid slot '{{{name}}}' at offset {offset}"));
                }
                out.push_str("{{ ");
                out.push_str(&name);
                out.push_str(" }}");
            }
            '}' if chars.next_if(|&(_, next)| next == '}').is_some() => out.push('}'),
            '}' => return Err(format!("single '}}' at offset {offset}")),
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// A template ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTemplate {
    name: String,
    source: String,
}

impl Default for UsageTemplate {
    fn default() -> Self {
        let default = &BUILTIN_TEMPLATES[0];
        Self::from_source(default.name, default.source)
    }
}

impl UsageTemplate {
    /// Wrap template text as is.
    #[must_use]
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Wrap template text written with single-brace slots.
    ///
    /// # Errors
    ///
    /// Returns `TemplateSyntax` when the braces are malformed.
    pub fn from_slot_source(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        match translate_slots(source) {
            Ok(translated) => Ok(Self::from_source(name, translated)),
            Err(message) => Err(crate::err!(TemplateSyntax {
                template: name,
                message: message,
            })),
        }
    }

    /// Load a template file, dropping its comment lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its braces are
    /// malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        Self::from_slot_source(path.display().to_string(), &strip_comment_lines(&content))
    }

    /// Look up a `--template` value.
    ///
    /// A built-in name wins over a file of the same name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateNotFound` when the value is neither a built-in name
    /// nor an existing file, or the error raised while loading the file.
    pub fn lookup(requested: &str) -> Result<Self> {
        if let Some(t) = builtin(requested) {
            tracing::debug!(template = %t.name, "Using built-in template");
            return Ok(Self::from_source(t.name, t.source));
        }

        let path = Path::new(requested);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading template file");
            return Self::from_file(path);
        }

        Err(crate::err!(TemplateNotFound {
            name: requested.to_string(),
        }))
    }

    /// Resolve an optional `--template` value.
    ///
    /// An unknown name falls back to the default template with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing template file cannot be loaded.
    pub fn resolve(requested: Option<&str>) -> Result<Self> {
        let Some(requested) = requested else {
            return Ok(Self::default());
        };

        match Self::lookup(requested) {
            Err(TfUsageError::TemplateNotFound { name, .. }) => {
                tracing::warn!(template = %name, "Template not found, using default template");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Template name or file path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check that the template compiles.
    ///
    /// # Errors
    ///
    /// Returns `TemplateSyntax` describing the first syntax error.
    pub fn validate(&self) -> Result<()> {
        let env = environment();
        env.template_from_named_str(&self.name, &self.source)
            .map(|_| ())
            .map_err(|e| self.syntax_error(&e))
    }

    /// Render the template.
    ///
    /// # Errors
    ///
    /// Returns `TemplateSyntax` if the template doesn't compile and
    /// `TemplateRender` if it references an unknown slot.
    pub fn render<S: Serialize>(&self, context: &S) -> Result<String> {
        let env = environment();
        let template = env
            .template_from_named_str(&self.name, &self.source)
            .map_err(|e| self.syntax_error(&e))?;

        template.render(context).map_err(|e| {
            crate::err!(TemplateRender {
                template: self.name.clone(),
                message: e.to_string(),
            })
        })
    }

    fn syntax_error(&self, error: &minijinja::Error) -> crate::error::TfUsageError {
        crate::err!(TemplateSyntax {
            template: self.name.clone(),
            message: error.to_string(),
        })
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env
}

/// Human-readable list of built-in templates.
#[must_use]
pub fn template_listing() -> String {
    let mut out = String::from("Built-in templates:\n");
    for t in BUILTIN_TEMPLATES {
        out.push_str(&format!("  - {:<10}: {}\n", t.name, t.description));
    }
    out.push_str("\nTo use a built-in template, specify: --template <name>\n");
    out.push_str(
        "To use a custom template, specify: --template <path> \
         (lines starting with # are ignored)\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use std::collections::BTreeMap;

    fn context() -> BTreeMap<&'static str, &'static str> {
        BTreeMap::from([
            ("module_name", "vpc"),
            ("source", "github.com/acme/vpc"),
            ("version", ""),
            ("source_line", "  source  = \"github.com/acme/vpc\"\n\n"),
            ("version_line", ""),
            ("required_variables", "  name = # Required: n"),
            ("optional_variables", ""),
        ])
    }

    #[test]
    fn test_builtin_names() {
        let names: Vec<_> = BUILTIN_TEMPLATES.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["default", "compact", "minimal", "detailed"]);
    }

    #[test]
    fn test_every_builtin_renders() {
        for t in BUILTIN_TEMPLATES {
            let rendered = UsageTemplate::lookup(t.name)
                .unwrap()
                .render(&context())
                .unwrap();
            assert!(rendered.contains("module \"vpc\" {"), "{}", t.name);
        }
    }

    #[test]
    fn test_default_template_layout() {
        let rendered = UsageTemplate::default().render(&context()).unwrap();
        assert_eq!(
            rendered,
            "```hcl\nmodule \"vpc\" {\n  source  = \"github.com/acme/vpc\"\n\n\n  name = # Required: n\n}\n```"
        );
    }

    #[test]
    fn test_unknown_template_not_found() {
        assert!(matches!(
            UsageTemplate::lookup("fancy"),
            Err(TfUsageError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_slot_is_fatal() {
        let template = UsageTemplate::from_source("custom", "{{ module_name }} {{ author }}");
        assert!(matches!(
            template.render(&context()),
            Err(TfUsageError::TemplateRender { .. })
        ));
    }

    #[test]
    fn test_syntax_error_detected() {
        let template = UsageTemplate::from_source("broken", "{{ module_name ");
        assert!(matches!(
            template.validate(),
            Err(TfUsageError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_no_html_escaping() {
        let template = UsageTemplate::from_source("custom.md", "{{ source_line }}");
        let rendered = template.render(&context()).unwrap();
        assert!(rendered.contains("\"github.com/acme/vpc\""));
    }

    #[test]
    fn test_strip_comment_lines() {
        assert_eq!(
            strip_comment_lines("# header\nmodule {\n  # note\n  x\n}\n"),
            "module {\n  x\n}\n"
        );
    }

    #[test]
    fn test_resolve_file_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.tpl");
        std::fs::write(&path, "# my template\nmodule \"{module_name}\" {{}}\n").unwrap();

        let template = UsageTemplate::resolve(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(
            template.source(),
            "module \"{{ module_name }}\" {{ \"{\" }}}\n"
        );
        assert_eq!(
            template.render(&context()).unwrap(),
            "module \"vpc\" {}\n"
        );
    }

    #[test]
    fn test_resolve_prefers_builtin_name() {
        assert_eq!(UsageTemplate::resolve(Some("minimal")).unwrap().name(), "minimal");
        assert_eq!(UsageTemplate::resolve(None).unwrap().name(), "default");
    }

    #[test]
    fn test_resolve_missing_file_falls_back() {
        let template = UsageTemplate::resolve(Some("/definitely/missing.tpl")).unwrap();
        assert_eq!(template, UsageTemplate::default());
    }

    #[test]
    fn test_translate_slots() {
        assert_eq!(
            translate_slots("module \"{module_name}\" {{\n}}").unwrap(),
            "module \"{{ module_name }}\" {{ \"{\" }}\n}"
        );
        assert_eq!(translate_slots("{{{version}}}").unwrap(), "{{ \"{\" }}{{ version }}}");
        assert_eq!(translate_slots("100% of #tags").unwrap(), "100% of #tags");
    }

    #[test_case("module {" ; "unclosed brace")]
    #[test_case("module }" ; "lone closing brace")]
    #[test_case("module {}" ; "empty slot")]
    #[test_case("{module name}" ; "slot with space")]
    #[test_case("{source:>10}" ; "format spec")]
    #[test_case("{% if source %}" ; "template tag")]
    fn test_translate_slots_rejects(source: &str) {
        assert!(translate_slots(source).is_err());
        assert!(matches!(
            UsageTemplate::from_slot_source("custom", source),
            Err(TfUsageError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_single_brace_template_matches_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.tpl");
        std::fs::write(
            &path,
            "```hcl\nmodule \"{module_name}\" {{\n{source_line}{version_line}\n\
             {required_variables}\n{optional_variables}}}\n```",
        )
        .unwrap();

        let template = UsageTemplate::lookup(path.to_str().unwrap()).unwrap();
        assert_eq!(
            template.render(&context()).unwrap(),
            UsageTemplate::default().render(&context()).unwrap()
        );
    }

    #[test]
    fn test_unknown_single_brace_slot_is_fatal() {
        let template = UsageTemplate::from_slot_source("custom", "{module_name} {author}").unwrap();
        assert!(matches!(
            template.render(&context()),
            Err(TfUsageError::TemplateRender { .. })
        ));
    }

    #[test]
    fn test_template_listing_mentions_all() {
        let listing = template_listing();
        for t in BUILTIN_TEMPLATES {
            assert!(listing.contains(t.name));
            assert!(listing.contains(t.description));
        }
    }
}
