//! Next-version calculation from conventional commit subjects.
//!
//! The latest tag is bumped according to the strongest change among the
//! commits made since it:
//!
//! | Commit subject                         | Bump  |
//! |----------------------------------------|-------|
//! | contains `breaking change:`            | major |
//! | `type!:` or `type(scope)!:`            | major |
//! | `feat:` / `feat(scope):`               | minor |
//! | `fix:` / `fix(scope):`                 | patch |
//!
//! Matching is case-insensitive. Without any tag the first version is picked
//! from a fixed table (see [`initial_version`]).

use crate::git::RepositoryInspector;

use regex::Regex;
use semver::Version;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static BREAKING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+(?:\([^)]*\))?!:").expect("Invalid regex"));

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(v?)(\d+)\.(\d+)\.(\d+)").expect("Invalid regex"));

/// Strength of a version change, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Bump {
    /// No releasable change.
    #[default]
    None,
    /// Bug fixes.
    Patch,
    /// New features.
    Minor,
    /// Breaking changes.
    Major,
}

impl Bump {
    /// Classify a single commit subject.
    #[must_use]
    pub fn of_subject(subject: &str) -> Self {
        let subject = subject.to_lowercase();

        if subject.contains("breaking change:") || BREAKING_PATTERN.is_match(&subject) {
            Self::Major
        } else if subject.starts_with("feat:") || subject.starts_with("feat(") {
            Self::Minor
        } else if subject.starts_with("fix:") || subject.starts_with("fix(") {
            Self::Patch
        } else {
            Self::None
        }
    }

    /// The strongest bump among a set of commit subjects.
    #[must_use]
    pub fn classify<S: AsRef<str>>(subjects: &[S]) -> Self {
        let mut bump = Self::None;
        for subject in subjects {
            bump = bump.max(Self::of_subject(subject.as_ref()));
            if bump == Self::Major {
                break;
            }
        }
        bump
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A tag understood as `[v]MAJOR.MINOR.PATCH`.
///
/// Trailing text after the three numbers (pre-release, build metadata or
/// anything else) is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    /// `v` or empty.
    pub prefix: String,
    /// The numeric version.
    pub version: Version,
}

impl TagVersion {
    /// Parse a tag. Unparseable tags read as `v0.0.0`.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        TAG_PATTERN
            .captures(tag)
            .and_then(|caps| {
                let number = |idx: usize| caps[idx].parse::<u64>().ok();
                Some(Self {
                    prefix: caps[1].to_string(),
                    version: Version::new(number(2)?, number(3)?, number(4)?),
                })
            })
            .unwrap_or_else(|| Self {
                prefix: "v".to_string(),
                version: Version::new(0, 0, 0),
            })
    }

    /// Apply a bump, keeping the prefix.
    ///
    /// Returns `None` when the bumped component would overflow.
    #[must_use]
    pub fn bump(&self, bump: Bump) -> Option<Self> {
        let Version {
            major,
            minor,
            patch,
            ..
        } = self.version;

        let version = match bump {
            Bump::Major => Version::new(major.checked_add(1)?, 0, 0),
            Bump::Minor => Version::new(major, minor.checked_add(1)?, 0),
            Bump::Patch => Version::new(major, minor, patch.checked_add(1)?),
            Bump::None => Version::new(major, minor, patch),
        };

        Some(Self {
            prefix: self.prefix.clone(),
            version,
        })
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.version)
    }
}

/// First version of a repository that has commits but no tag.
#[must_use]
pub const fn initial_version(bump: Bump) -> &'static str {
    match bump {
        Bump::Major => "v1.0.0",
        Bump::Patch => "v0.0.1",
        Bump::Minor | Bump::None => "v0.1.0",
    }
}

/// Compute the next version from a tag (if any) and the commits since it.
///
/// A tag with nothing to release is returned as is, even when it isn't a
/// version number. Returns `None` when the tag cannot be bumped without
/// overflowing.
#[must_use]
pub fn next_version<S: AsRef<str>>(latest_tag: Option<&str>, subjects: &[S]) -> Option<String> {
    let bump = Bump::classify(subjects);
    let next = match latest_tag {
        Some(tag) if bump == Bump::None => tag.to_string(),
        Some(tag) => {
            let Some(bumped) = TagVersion::parse(tag).bump(bump) else {
                tracing::debug!(tag = %tag, bump = %bump, "Tag version cannot be bumped");
                return None;
            };
            bumped.to_string()
        }
        None => initial_version(bump).to_string(),
    };

    tracing::debug!(
        latest_tag = ?latest_tag,
        commits = subjects.len(),
        bump = %bump,
        next = %next,
        "Computed next version"
    );

    Some(next)
}

/// Detect the next version of the module in `directory`.
///
/// Commit listing failures count as "no releasable commits". A repository
/// without any commit has no version.
#[must_use]
pub fn detect_version(inspector: &dyn RepositoryInspector, directory: &Path) -> Option<String> {
    if !inspector.is_repository(directory) {
        tracing::debug!(directory = %directory.display(), "Not a git repository");
        return None;
    }

    let latest_tag = inspector.latest_tag(directory);
    let subjects = match latest_tag.as_deref() {
        Some(tag) => inspector
            .commit_subjects_since(directory, tag)
            .unwrap_or_default(),
        None => {
            if inspector.commit_count(directory).unwrap_or(0) == 0 {
                tracing::debug!(directory = %directory.display(), "Repository has no commits");
                return None;
            }
            inspector.all_commit_subjects(directory).unwrap_or_default()
        }
    };

    next_version(latest_tag.as_deref(), &subjects)
}
