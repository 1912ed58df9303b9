//! Configuration for tfusage.
//!
//! Settings come from, in increasing order of precedence:
//! - built-in defaults
//! - a YAML configuration file (`.terraform-usage.yaml` in the base
//!   directory, or the file named by `--config` / `TFUSAGE_CONFIG`)
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # .terraform-usage.yaml
//!
//! # Repository detection
//! detection:
//!   enabled: true
//!   timeout_seconds: 5
//!   # Ignore values persisted in the README for these fields
//!   force:
//!     all: false
//!     module: false
//!     source: false
//!     version: false
//!
//! # Explicit metadata (highest priority)
//! metadata:
//!   module_name: vpc
//!   source: ${MODULE_REGISTRY}/vpc   # Environment variable expansion
//!   # version: v1.0.0
//!
//! # Built-in template name or path to a template file
//! template: default
//!
//! # README path (default: README.md in each target directory)
//! # readme: docs/README.md
//!
//! # Output options
//! output:
//!   colored: true
//!   diff: false
//! ```

use crate::cli::Cli;
use crate::error::{Result, TfUsageError};
use crate::types::{MetadataField, Mode};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Configuration file names looked up in the base directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[".terraform-usage.yaml", ".terraform-usage.yml"];

static BRACED_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));

static BARE_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Which metadata fields must not be taken from the README.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ForceFlags {
    /// Applies to every field.
    pub all: bool,
    /// Module name only.
    pub module: bool,
    /// Source only.
    pub source: bool,
    /// Version only.
    pub version: bool,
}

impl ForceFlags {
    /// Whether persisted values of `field` are ignored.
    #[must_use]
    pub const fn forces(&self, field: MetadataField) -> bool {
        self.all
            || match field {
                MetadataField::ModuleName => self.module,
                MetadataField::Source => self.source,
                MetadataField::Version => self.version,
            }
    }
}

/// Repository detection options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DetectionOptions {
    /// Query the repository for missing metadata.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Timeout for each `git` command, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Fields whose README values are ignored.
    pub force: ForceFlags,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: default_timeout_seconds(),
            force: ForceFlags::default(),
        }
    }
}

/// Explicitly supplied metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MetadataOverrides {
    /// Module label.
    pub module_name: Option<String>,
    /// Module source.
    pub source: Option<String>,
    /// Module version.
    pub version: Option<String>,
}

impl MetadataOverrides {
    /// Explicit value of one field, if any.
    #[must_use]
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::ModuleName => self.module_name.as_deref(),
            MetadataField::Source => self.source.as_deref(),
            MetadataField::Version => self.version.as_deref(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    #[serde(default = "default_true")]
    pub colored: bool,

    /// Show a unified diff for stale usage blocks.
    pub diff: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            diff: false,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Repository detection options
    pub detection: DetectionOptions,

    /// Explicit metadata
    pub metadata: MetadataOverrides,

    /// Built-in template name or template file path
    pub template: Option<String>,

    /// README path used for every target directory
    pub readme: Option<PathBuf>,

    /// Output options
    pub output: OutputOptions,

    /// Check or update; only set from the command line
    #[serde(skip)]
    pub mode: Mode,
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_seconds() -> u64 {
    5
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");

        let expanded = expand_env_vars(content);
        let config: Self = serde_yaml::from_str(&expanded).map_err(|e| {
            TfUsageError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;
        config.validate()?;

        tracing::debug!(
            detection = config.detection.enabled,
            template = ?config.template,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load the configuration for a run.
    ///
    /// An explicit path must exist. Otherwise the first of
    /// [`CONFIG_FILE_NAMES`] found in `base_dir` is used, falling back to
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>, base_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "Loading configuration from explicit path");
            return Self::from_file(path);
        }

        for name in CONFIG_FILE_NAMES {
            let path = base_dir.join(name);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Found configuration file");
                return Self::from_file(&path);
            }
        }

        tracing::debug!("No configuration file found, using default configuration");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TfUsageError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid key.
    pub fn validate(&self) -> Result<()> {
        if self.detection.timeout_seconds == 0 {
            return Err(crate::err!(ConfigValue {
                key: "detection.timeout_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            }));
        }
        if self.template.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(crate::err!(ConfigValue {
                key: "template".to_string(),
                message: "must not be empty".to_string(),
            }));
        }
        Ok(())
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &Cli) {
        self.mode = args.mode();

        if let Some(ref name) = args.module_name {
            self.metadata.module_name = Some(name.clone());
        }
        if let Some(ref source) = args.source {
            self.metadata.source = Some(source.clone());
        }
        if let Some(ref version) = args.module_version {
            self.metadata.version = Some(version.clone());
        }

        if args.no_auto_detect {
            self.detection.enabled = false;
        }
        self.detection.force.all |= args.force_autodetect;
        self.detection.force.module |= args.force_autodetect_module;
        self.detection.force.source |= args.force_autodetect_source;
        self.detection.force.version |= args.force_autodetect_version;

        if let Some(ref template) = args.template {
            self.template = Some(template.clone());
        }
        if let Some(ref readme) = args.readme {
            self.readme = Some(readme.clone());
        }

        if args.no_color {
            self.output.colored = false;
        }
        if args.diff {
            self.output.diff = true;
        }
    }

    /// Per-command timeout for repository inspection.
    #[must_use]
    pub const fn detection_timeout(&self) -> Duration {
        Duration::from_secs(self.detection.timeout_seconds)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unset variables are left as is.
fn expand_env_vars(content: &str) -> String {
    let expanded = BRACED_VAR_PATTERN.replace_all(content, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR_PATTERN
        .replace_all(&expanded, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
