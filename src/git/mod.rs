//! Repository inspection.
//!
//! Module metadata (source, name, next version) is derived from the Git
//! repository that contains the module. Inspection is best effort: every
//! query answers with a value or with `None`, never with an error, so the
//! metadata resolver can simply fall through to its next layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 RepositoryInspector (trait)                     │
//! │  - is_repository / latest_tag / commit subjects / remote_url    │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           GitCli                                │
//! │  - runs `git` with a fixed timeout                              │
//! │  - failure, non-zero exit or timeout ⇒ None                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use tfusage::git::{GitCli, RepositoryInspector};
//!
//! fn main() -> tfusage::Result<()> {
//!     let git = GitCli::new(Duration::from_secs(5))?;
//!     if let Some(url) = git.remote_url(Path::new(".")) {
//!         println!("origin: {url}");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
pub mod detect;

pub use client::{GitCli, DEFAULT_TIMEOUT};

use std::path::Path;

/// Read-only questions asked about the repository containing a directory.
///
/// Implementations must not fail: anything that goes wrong (not a
/// repository, `git` missing, timeout) is reported as `None`/`false`.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryInspector {
    /// Whether `directory` is inside a Git work tree.
    fn is_repository(&self, directory: &Path) -> bool;

    /// The most recent tag reachable from `HEAD`.
    fn latest_tag(&self, directory: &Path) -> Option<String>;

    /// Commit subjects in `tag..HEAD`, newest first.
    fn commit_subjects_since(&self, directory: &Path, tag: &str) -> Option<Vec<String>>;

    /// Every commit subject reachable from `HEAD`, newest first.
    fn all_commit_subjects(&self, directory: &Path) -> Option<Vec<String>>;

    /// Number of commits reachable from `HEAD`.
    fn commit_count(&self, directory: &Path) -> Option<u64>;

    /// URL of the `origin` remote, as configured.
    fn remote_url(&self, directory: &Path) -> Option<String>;
}
