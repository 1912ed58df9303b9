//! Metadata resolution.
//!
//! Each field of [`ResolvedMetadata`] is taken from the first layer that
//! yields a non-empty value:
//!
//! 1. **Explicit**: CLI flags or the configuration file
//! 2. **Detected**: repository inspection, when detection is enabled
//! 3. **Persisted**: metadata comments in the existing README, unless the
//!    field is forced to auto-detect
//! 4. **Fallback**: `example` for the module name, nothing otherwise
//!
//! Layers are evaluated lazily, so repository queries only run for fields
//! that have no explicit value.

use crate::config::{Config, DetectionOptions, MetadataOverrides};
use crate::git::{detect, RepositoryInspector};
use crate::readme::PersistedMetadata;
use crate::types::{MetadataField, ResolvedMetadata};
use crate::version;

use std::fmt;
use std::path::Path;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// CLI flag or configuration file.
    Explicit,
    /// Repository inspection.
    Detected,
    /// README metadata comments.
    Persisted,
    /// Built-in fallback.
    Fallback,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Detected => write!(f, "detected"),
            Self::Persisted => write!(f, "persisted"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

type Candidate<'a> = Box<dyn FnOnce() -> Option<String> + 'a>;

/// Resolves module metadata for one directory at a time.
pub struct MetadataResolver<'a> {
    inspector: &'a dyn RepositoryInspector,
    overrides: &'a MetadataOverrides,
    detection: &'a DetectionOptions,
}

impl<'a> MetadataResolver<'a> {
    /// Create a resolver from the run configuration.
    #[must_use]
    pub fn new(inspector: &'a dyn RepositoryInspector, config: &'a Config) -> Self {
        Self {
            inspector,
            overrides: &config.metadata,
            detection: &config.detection,
        }
    }

    /// Resolve all three fields.
    ///
    /// `persisted` is the metadata read from the target README, or `None`
    /// when there is no README.
    #[must_use]
    pub fn resolve(&self, directory: &Path, persisted: Option<&PersistedMetadata>) -> ResolvedMetadata {
        let resolve = |field| {
            self.resolve_field(field, directory, persisted)
                .unwrap_or_default()
        };

        ResolvedMetadata {
            module_name: resolve(MetadataField::ModuleName),
            source: resolve(MetadataField::Source),
            version: resolve(MetadataField::Version),
        }
    }

    /// Resolve one field, or `None` when every layer is empty.
    #[must_use]
    pub fn resolve_field(
        &self,
        field: MetadataField,
        directory: &Path,
        persisted: Option<&PersistedMetadata>,
    ) -> Option<String> {
        let layers: [(Layer, Candidate<'_>); 4] = [
            (
                Layer::Explicit,
                Box::new(move || self.overrides.get(field).map(String::from)),
            ),
            (Layer::Detected, Box::new(move || self.detect(field, directory))),
            (
                Layer::Persisted,
                Box::new(move || self.persisted(field, persisted)),
            ),
            (
                Layer::Fallback,
                Box::new(move || field.fallback().map(String::from)),
            ),
        ];

        first_available(field, directory, layers)
    }

    fn detect(&self, field: MetadataField, directory: &Path) -> Option<String> {
        if !self.detection.enabled {
            return None;
        }

        match field {
            MetadataField::ModuleName => detect::detect_module_name(self.inspector, directory),
            MetadataField::Source => detect::detect_source(self.inspector, directory),
            MetadataField::Version => version::detect_version(self.inspector, directory),
        }
    }

    fn persisted(&self, field: MetadataField, persisted: Option<&PersistedMetadata>) -> Option<String> {
        if self.detection.force.forces(field) {
            tracing::debug!(field = %field, "Ignoring persisted value, auto-detection forced");
            return None;
        }
        persisted?.get(field).map(String::from)
    }
}

fn first_available<'a>(
    field: MetadataField,
    directory: &Path,
    layers: impl IntoIterator<Item = (Layer, Candidate<'a>)>,
) -> Option<String> {
    for (layer, candidate) in layers {
        if let Some(value) = candidate().filter(|value| !value.is_empty()) {
            tracing::debug!(
                directory = %directory.display(),
                field = %field,
                layer = %layer,
                value = %value,
                "Resolved metadata"
            );
            return Some(value);
        }
    }

    tracing::debug!(directory = %directory.display(), field = %field, "No value for metadata field");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceFlags;
    use crate::git::MockRepositoryInspector;
    use pretty_assertions::assert_eq;

    fn silent_inspector() -> MockRepositoryInspector {
        let mut inspector = MockRepositoryInspector::new();
        inspector.expect_is_repository().returning(|_| false);
        inspector.expect_remote_url().returning(|_| None);
        inspector
    }

    fn github_inspector() -> MockRepositoryInspector {
        let mut inspector = MockRepositoryInspector::new();
        inspector.expect_is_repository().returning(|_| true);
        inspector
            .expect_remote_url()
            .returning(|_| Some("git@github.com:acme/terraform-aws-vpc.git".to_string()));
        inspector
            .expect_latest_tag()
            .returning(|_| Some("v1.2.3".to_string()));
        inspector
            .expect_commit_subjects_since()
            .returning(|_, _| Some(vec!["fix: subnet tags".to_string()]));
        inspector
    }

    fn persisted() -> PersistedMetadata {
        PersistedMetadata {
            module_name: Some("from-readme".to_string()),
            source: Some("readme.example.com/x".to_string()),
            version: Some("v0.9.0".to_string()),
        }
    }

    #[test]
    fn test_nothing_available_falls_back() {
        let inspector = silent_inspector();
        let config = Config::default();
        let resolver = MetadataResolver::new(&inspector, &config);

        let metadata = resolver.resolve(Path::new("/work/network"), None);
        assert_eq!(metadata.module_name, "network");
        assert_eq!(metadata.source, "");
        assert_eq!(metadata.version, "");
    }

    #[test]
    fn test_detection_disabled_uses_example() {
        let inspector = MockRepositoryInspector::new();
        let mut config = Config::default();
        config.detection.enabled = false;
        let resolver = MetadataResolver::new(&inspector, &config);

        assert_eq!(
            resolver.resolve(Path::new("/work/network"), None),
            ResolvedMetadata::new("example", "", "")
        );
    }

    #[test]
    fn test_explicit_beats_detection() {
        // No expectations: the inspector must not be queried for explicit fields.
        let inspector = MockRepositoryInspector::new();
        let mut config = Config::default();
        config.metadata = MetadataOverrides {
            module_name: Some("x".to_string()),
            source: Some("s".to_string()),
            version: Some("v9".to_string()),
        };
        let resolver = MetadataResolver::new(&inspector, &config);

        assert_eq!(
            resolver.resolve(Path::new("/repo"), Some(&persisted())),
            ResolvedMetadata::new("x", "s", "v9")
        );
    }

    #[test]
    fn test_detection_beats_persisted() {
        let inspector = github_inspector();
        let config = Config::default();
        let resolver = MetadataResolver::new(&inspector, &config);

        assert_eq!(
            resolver.resolve(Path::new("/repo"), Some(&persisted())),
            ResolvedMetadata::new(
                "terraform-aws-vpc",
                "github.com/acme/terraform-aws-vpc",
                "v1.2.4"
            )
        );
    }

    #[test]
    fn test_persisted_fills_gaps() {
        let inspector = MockRepositoryInspector::new();
        let mut config = Config::default();
        config.detection.enabled = false;
        let resolver = MetadataResolver::new(&inspector, &config);

        assert_eq!(
            resolver.resolve(Path::new("/repo"), Some(&persisted())),
            ResolvedMetadata::new("from-readme", "readme.example.com/x", "v0.9.0")
        );
    }

    #[test]
    fn test_forced_field_ignores_persisted() {
        let inspector = MockRepositoryInspector::new();
        let mut config = Config::default();
        config.detection.enabled = false;
        config.detection.force = ForceFlags {
            version: true,
            ..ForceFlags::default()
        };
        let resolver = MetadataResolver::new(&inspector, &config);

        let metadata = resolver.resolve(Path::new("/repo"), Some(&persisted()));
        assert_eq!(metadata.module_name, "from-readme");
        assert_eq!(metadata.source, "readme.example.com/x");
        assert_eq!(metadata.version, "");
    }

    #[test]
    fn test_force_all_ignores_every_persisted_field() {
        let inspector = MockRepositoryInspector::new();
        let mut config = Config::default();
        config.detection.enabled = false;
        config.detection.force.all = true;
        let resolver = MetadataResolver::new(&inspector, &config);

        assert_eq!(
            resolver.resolve(Path::new("/repo"), Some(&persisted())),
            ResolvedMetadata::new("example", "", "")
        );
    }

    #[test]
    fn test_empty_explicit_value_is_skipped() {
        let inspector = MockRepositoryInspector::new();
        let mut config = Config::default();
        config.detection.enabled = false;
        config.metadata.module_name = Some(String::new());
        let resolver = MetadataResolver::new(&inspector, &config);

        assert_eq!(
            resolver.resolve_field(MetadataField::ModuleName, Path::new("/repo"), Some(&persisted())),
            Some("from-readme".to_string())
        );
    }
}
