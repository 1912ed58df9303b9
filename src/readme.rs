//! README usage block management.
//!
//! The usage block lives between two HTML comment markers:
//!
//! ````text
//! <!-- BEGIN_AUTOMATED_TF_USAGE_BLOCK -->
//! <!-- MODULE: vpc -->
//! <!-- SOURCE: github.com/acme/vpc -->
//! <!-- VERSION: v1.2.0 -->
//! ```hcl
//! module "vpc" { ... }
//! ```
//! <!-- END_AUTOMATED_TF_USAGE_BLOCK -->
//! ````
//!
//! Metadata comments directly after the begin marker persist the resolved
//! module name, source and version so later runs can reuse them. Everything
//! outside the first marker pair is preserved byte for byte.

use crate::error::{Result, ResultExt};
use crate::types::{MetadataField, ResolvedMetadata};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Start of the managed region.
pub const BEGIN_MARKER: &str = "<!-- BEGIN_AUTOMATED_TF_USAGE_BLOCK -->";

/// End of the managed region.
pub const END_MARKER: &str = "<!-- END_AUTOMATED_TF_USAGE_BLOCK -->";

/// Default README file name inside a target directory.
pub const README_FILE_NAME: &str = "README.md";

static METADATA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s){}\s*(?:<!-- MODULE: (.*?) -->\s*)?(?:<!-- SOURCE: (.*?) -->\s*)?(?:<!-- VERSION: (.*?) -->\s*)?",
        regex::escape(BEGIN_MARKER)
    ))
    .expect("Invalid regex")
});

/// Location of the first marker pair in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRegion {
    /// Byte offset just after the begin marker.
    body_start: usize,
    /// Byte offset of the end marker.
    body_end: usize,
}

impl MarkerRegion {
    /// Find the first begin marker and the first end marker after it.
    #[must_use]
    pub fn locate(content: &str) -> Option<Self> {
        let begin = content.find(BEGIN_MARKER)?;
        let body_start = begin + BEGIN_MARKER.len();
        let body_end = body_start + content[body_start..].find(END_MARKER)?;
        Some(Self {
            body_start,
            body_end,
        })
    }

    /// Text between the markers.
    #[must_use]
    pub fn body<'a>(&self, content: &'a str) -> &'a str {
        &content[self.body_start..self.body_end]
    }

    /// Replace the text between the markers, keeping everything else.
    #[must_use]
    pub fn replace_body(&self, content: &str, body: &str) -> String {
        let mut result = String::with_capacity(content.len() + body.len());
        result.push_str(&content[..self.body_start]);
        result.push_str(body);
        result.push_str(&content[self.body_end..]);
        result
    }
}

/// Metadata recovered from the comments after the begin marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedMetadata {
    /// `<!-- MODULE: ... -->`
    pub module_name: Option<String>,
    /// `<!-- SOURCE: ... -->`
    pub source: Option<String>,
    /// `<!-- VERSION: ... -->`
    pub version: Option<String>,
}

impl PersistedMetadata {
    /// Extract persisted metadata from a document.
    ///
    /// The comments must appear in MODULE, SOURCE, VERSION order, each one
    /// optional, separated only by whitespace.
    #[must_use]
    pub fn extract(content: &str) -> Self {
        let Some(caps) = METADATA_PATTERN.captures(content) else {
            return Self::default();
        };

        // Values are kept verbatim so they render back identically.
        let field = |idx: usize| {
            caps.get(idx)
                .map(|m| m.as_str().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            module_name: field(1),
            source: field(2),
            version: field(3),
        }
    }

    /// Persisted value of one field.
    #[must_use]
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::ModuleName => self.module_name.as_deref(),
            MetadataField::Source => self.source.as_deref(),
            MetadataField::Version => self.version.as_deref(),
        }
    }
}

/// Metadata comment lines for the non-empty fields, in MODULE, SOURCE,
/// VERSION order.
#[must_use]
pub fn metadata_comment_lines(metadata: &ResolvedMetadata) -> Vec<String> {
    MetadataField::ALL
        .into_iter()
        .map(|field| (field.comment_label(), metadata.get(field)))
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("<!-- {label}: {value} -->"))
        .collect()
}

/// Text written between the markers.
#[must_use]
pub fn render_region_body(metadata: &ResolvedMetadata, usage_block: &str) -> String {
    let lines = metadata_comment_lines(metadata);
    if lines.is_empty() {
        format!("\n{usage_block}\n")
    } else {
        format!("\n{}\n{usage_block}\n", lines.join("\n"))
    }
}

/// Result of comparing a README against freshly generated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The region matches, ignoring surrounding whitespace.
    UpToDate,
    /// The region differs.
    OutOfDate {
        /// Trimmed current region.
        current: String,
        /// Trimmed expected region.
        expected: String,
    },
}

/// Result of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The file was rewritten.
    Updated,
    /// The file already had this content and was not touched.
    Unchanged,
}

/// A README loaded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeDocument {
    path: PathBuf,
    content: String,
}

impl ReadmeDocument {
    /// Wrap already loaded content.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read a README from disk.
    ///
    /// # Errors
    ///
    /// Returns `ReadmeNotFound` when the file doesn't exist and
    /// `ReadmeUnreadable` when it can't be read.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::new(path, content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(crate::err!(ReadmeNotFound {
                    path: path.to_path_buf(),
                }))
            }
            Err(e) => Err(crate::err!(ReadmeUnreadable {
                path: path.to_path_buf(),
                source: e,
            })),
        }
    }

    /// Path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full document text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Metadata persisted in the document.
    #[must_use]
    pub fn persisted_metadata(&self) -> PersistedMetadata {
        PersistedMetadata::extract(&self.content)
    }

    fn region(&self) -> Result<MarkerRegion> {
        MarkerRegion::locate(&self.content).ok_or_else(|| {
            crate::err!(MarkersNotFound {
                path: self.path.clone(),
            })
        })
    }

    /// Compare the managed region against generated content.
    ///
    /// # Errors
    ///
    /// Returns `MarkersNotFound` when the document has no marker pair.
    pub fn check(&self, metadata: &ResolvedMetadata, usage_block: &str) -> Result<CheckOutcome> {
        let region = self.region()?;
        let current = region.body(&self.content).trim();

        let lines = metadata_comment_lines(metadata);
        let expected = if lines.is_empty() {
            usage_block.to_string()
        } else {
            format!("{}\n{usage_block}", lines.join("\n"))
        };
        let expected = expected.trim();

        if current == expected {
            Ok(CheckOutcome::UpToDate)
        } else {
            Ok(CheckOutcome::OutOfDate {
                current: current.to_string(),
                expected: expected.to_string(),
            })
        }
    }

    /// Document text with the managed region regenerated.
    ///
    /// # Errors
    ///
    /// Returns `MarkersNotFound` when the document has no marker pair.
    pub fn render_update(&self, metadata: &ResolvedMetadata, usage_block: &str) -> Result<String> {
        let region = self.region()?;
        Ok(region.replace_body(&self.content, &render_region_body(metadata, usage_block)))
    }

    /// Regenerate the managed region and write the file if it changed.
    ///
    /// # Errors
    ///
    /// Returns `MarkersNotFound` when the document has no marker pair, or
    /// an I/O error if the file cannot be written.
    pub fn update(&mut self, metadata: &ResolvedMetadata, usage_block: &str) -> Result<UpdateOutcome> {
        let updated = self.render_update(metadata, usage_block)?;
        if updated == self.content {
            tracing::debug!(path = %self.path.display(), "README already up to date");
            return Ok(UpdateOutcome::Unchanged);
        }

        std::fs::write(&self.path, &updated).with_path(&self.path)?;
        tracing::info!(path = %self.path.display(), "README updated");
        self.content = updated;
        Ok(UpdateOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfUsageError;
    use pretty_assertions::assert_eq;

    const BLOCK: &str = "```hcl\nmodule \"vpc\" {\n}\n```";

    fn metadata() -> ResolvedMetadata {
        ResolvedMetadata::new("vpc", "github.com/acme/vpc", "v1.2.0")
    }

    fn document(content: &str) -> ReadmeDocument {
        ReadmeDocument::new("README.md", content)
    }

    #[test]
    fn test_locate_requires_begin_before_end() {
        let reversed = format!("{END_MARKER}\n{BEGIN_MARKER}\n");
        assert_eq!(MarkerRegion::locate(&reversed), None);
        assert_eq!(MarkerRegion::locate("no markers"), None);

        let ok = format!("a\n{BEGIN_MARKER}\nx\n{END_MARKER}\nb");
        let region = MarkerRegion::locate(&ok).unwrap();
        assert_eq!(region.body(&ok), "\nx\n");
    }

    #[test]
    fn test_metadata_lines_skip_empty_fields() {
        let lines = metadata_comment_lines(&ResolvedMetadata::new("vpc", "", "v1"));
        assert_eq!(lines, vec!["<!-- MODULE: vpc -->", "<!-- VERSION: v1 -->"]);
    }

    #[test]
    fn test_update_preserves_surroundings() {
        let readme = format!("# Title\n\nIntro\n\n{BEGIN_MARKER}\nold\n{END_MARKER}\n\n## Inputs\n");
        let updated = document(&readme).render_update(&metadata(), BLOCK).unwrap();

        let expected = format!(
            "# Title\n\nIntro\n\n{BEGIN_MARKER}\n<!-- MODULE: vpc -->\n<!-- SOURCE: github.com/acme/vpc -->\n<!-- VERSION: v1.2.0 -->\n{BLOCK}\n{END_MARKER}\n\n## Inputs\n"
        );
        assert_eq!(updated, expected);
    }

    #[test]
    fn test_update_without_metadata() {
        let readme = format!("{BEGIN_MARKER}{END_MARKER}");
        let updated = document(&readme)
            .render_update(&ResolvedMetadata::default(), BLOCK)
            .unwrap();
        assert_eq!(updated, format!("{BEGIN_MARKER}\n{BLOCK}\n{END_MARKER}"));
    }

    #[test]
    fn test_only_first_region_replaced() {
        let readme = format!(
            "{BEGIN_MARKER}\none\n{END_MARKER}\n{BEGIN_MARKER}\ntwo\n{END_MARKER}\n"
        );
        let updated = document(&readme).render_update(&metadata(), BLOCK).unwrap();
        assert!(updated.ends_with(&format!("{BEGIN_MARKER}\ntwo\n{END_MARKER}\n")));
        assert!(!updated.contains("one"));
    }

    #[test]
    fn test_check_after_update_is_up_to_date() {
        let readme = format!("intro\n{BEGIN_MARKER}\n{END_MARKER}\n");
        let updated = document(&readme).render_update(&metadata(), BLOCK).unwrap();
        assert_eq!(
            document(&updated).check(&metadata(), BLOCK).unwrap(),
            CheckOutcome::UpToDate
        );
    }

    #[test]
    fn test_check_ignores_surrounding_whitespace() {
        let readme = format!("{BEGIN_MARKER}\n\n\n{BLOCK}\n   \n{END_MARKER}");
        assert_eq!(
            document(&readme)
                .check(&ResolvedMetadata::default(), BLOCK)
                .unwrap(),
            CheckOutcome::UpToDate
        );
    }

    #[test]
    fn test_check_reports_stale_content() {
        let readme = format!("{BEGIN_MARKER}\nstale\n{END_MARKER}");
        match document(&readme).check(&metadata(), BLOCK).unwrap() {
            CheckOutcome::OutOfDate { current, expected } => {
                assert_eq!(current, "stale");
                assert!(expected.starts_with("<!-- MODULE: vpc -->"));
                assert!(expected.ends_with("```"));
            }
            CheckOutcome::UpToDate => panic!("Expected stale content"),
        }
    }

    #[test]
    fn test_missing_markers() {
        let doc = document("# Title\n");
        assert!(matches!(
            doc.check(&metadata(), BLOCK),
            Err(TfUsageError::MarkersNotFound { .. })
        ));
        assert!(matches!(
            doc.render_update(&metadata(), BLOCK),
            Err(TfUsageError::MarkersNotFound { .. })
        ));
    }

    #[test]
    fn test_persisted_metadata_round_trip() {
        let readme = format!("{BEGIN_MARKER}\n{END_MARKER}\n");
        let updated = document(&readme).render_update(&metadata(), BLOCK).unwrap();

        let persisted = PersistedMetadata::extract(&updated);
        assert_eq!(persisted.module_name.as_deref(), Some("vpc"));
        assert_eq!(persisted.source.as_deref(), Some("github.com/acme/vpc"));
        assert_eq!(persisted.version.as_deref(), Some("v1.2.0"));
    }

    #[test]
    fn test_persisted_metadata_keeps_whitespace() {
        let padded = ResolvedMetadata::new("vpc", " src ", "  v1  ");
        let readme = format!("{BEGIN_MARKER}\n{END_MARKER}\n");
        let first = document(&readme).render_update(&padded, BLOCK).unwrap();

        let persisted = PersistedMetadata::extract(&first);
        assert_eq!(persisted.source.as_deref(), Some(" src "));
        assert_eq!(persisted.version.as_deref(), Some("  v1  "));

        let reloaded = ResolvedMetadata::new(
            persisted.module_name.unwrap(),
            persisted.source.unwrap(),
            persisted.version.unwrap(),
        );
        let second = document(&first).render_update(&reloaded, BLOCK).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_persisted_metadata_partial() {
        let readme = format!("{BEGIN_MARKER}\n<!-- SOURCE: git.example.com/x -->\n```hcl\n");
        let persisted = PersistedMetadata::extract(&readme);
        assert_eq!(persisted.module_name, None);
        assert_eq!(persisted.source.as_deref(), Some("git.example.com/x"));
        assert_eq!(persisted.get(MetadataField::Version), None);
    }

    #[test]
    fn test_persisted_metadata_without_marker() {
        assert_eq!(
            PersistedMetadata::extract("<!-- MODULE: vpc -->"),
            PersistedMetadata::default()
        );
    }

    #[test]
    fn test_update_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(README_FILE_NAME);
        std::fs::write(&path, format!("{BEGIN_MARKER}\n{END_MARKER}\n")).unwrap();

        let mut doc = ReadmeDocument::load(&path).unwrap();
        assert_eq!(doc.update(&metadata(), BLOCK).unwrap(), UpdateOutcome::Updated);
        assert_eq!(doc.update(&metadata(), BLOCK).unwrap(), UpdateOutcome::Unchanged);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, doc.content());
        assert!(on_disk.contains(BLOCK));
    }

    #[test]
    fn test_load_missing_readme() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReadmeDocument::load(&dir.path().join(README_FILE_NAME));
        assert!(matches!(result, Err(TfUsageError::ReadmeNotFound { .. })));
    }
}
