//! `git` command-line inspector.
//!
//! Each query spawns `git` in the target directory and waits at most
//! [`DEFAULT_TIMEOUT`] (or the configured timeout). A timed-out child is
//! killed when its handle is dropped.

use crate::error::Result;
use crate::git::RepositoryInspector;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository inspector backed by the `git` binary.
pub struct GitCli {
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl GitCli {
    /// Create a new inspector with the given per-command timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal runtime cannot be created.
    pub fn new(timeout: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                crate::err!(Internal {
                    message: format!("Failed to start process runtime: {e}"),
                })
            })?;

        Ok(Self { timeout, runtime })
    }

    /// The per-command timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `git <args>` in `directory` and return trimmed stdout on success.
    fn run(&self, directory: &Path, args: &[&str]) -> Option<String> {
        let mut command = tokio::process::Command::new("git");
        command
            .args(args)
            .current_dir(directory)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let result = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, command.output()).await });

        match result {
            Err(_) => {
                tracing::debug!(
                    directory = %directory.display(),
                    args = ?args,
                    timeout_ms = self.timeout.as_millis(),
                    "git command timed out"
                );
                None
            }
            Ok(Err(e)) => {
                tracing::debug!(
                    directory = %directory.display(),
                    args = ?args,
                    error = %e,
                    "Failed to run git"
                );
                None
            }
            Ok(Ok(output)) if !output.status.success() => {
                tracing::trace!(
                    directory = %directory.display(),
                    args = ?args,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "git command failed"
                );
                None
            }
            Ok(Ok(output)) => Some(String::from_utf8_lossy(&output.stdout).trim().to_string()),
        }
    }

    fn run_lines(&self, directory: &Path, args: &[&str]) -> Option<Vec<String>> {
        self.run(directory, args).map(|stdout| {
            stdout
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(String::from)
                .collect()
        })
    }
}

impl RepositoryInspector for GitCli {
    fn is_repository(&self, directory: &Path) -> bool {
        self.run(directory, &["rev-parse", "--git-dir"]).is_some()
    }

    fn latest_tag(&self, directory: &Path) -> Option<String> {
        self.run(directory, &["describe", "--tags", "--abbrev=0"])
            .filter(|tag| !tag.is_empty())
    }

    fn commit_subjects_since(&self, directory: &Path, tag: &str) -> Option<Vec<String>> {
        let range = format!("{tag}..HEAD");
        self.run_lines(directory, &["log", &range, "--pretty=%s"])
    }

    fn all_commit_subjects(&self, directory: &Path) -> Option<Vec<String>> {
        self.run_lines(directory, &["log", "--pretty=%s"])
    }

    fn commit_count(&self, directory: &Path) -> Option<u64> {
        self.run(directory, &["rev-list", "--count", "HEAD"])
            .and_then(|count| count.parse().ok())
    }

    fn remote_url(&self, directory: &Path) -> Option<String> {
        self.run(directory, &["config", "--get", "remote.origin.url"])
            .filter(|url| !url.is_empty())
    }
}
