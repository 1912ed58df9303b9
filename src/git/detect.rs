//! Source and module name detection from the `origin` remote.

use crate::git::RepositoryInspector;

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

/// scp-like SSH form: `user@host:path`.
static SCP_LIKE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@/:\s]+@([^:/\s]+):/?(.+)$").expect("Invalid regex")
});

static SCHEME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("Invalid regex"));

/// Turn a remote URL into a module source of the form `host/path`.
///
/// - a trailing `.git` is removed
/// - `git@host:org/repo` becomes `host/org/repo`
/// - URL schemes and embedded credentials are dropped
///
/// Anything unrecognised (a local path, say) is returned without its
/// `.git` suffix.
#[must_use]
pub fn normalize_remote_url(remote: &str) -> String {
    let trimmed = remote.trim();
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    if trimmed.contains("://") {
        if let Some(normalized) = normalize_url_form(trimmed) {
            return normalized;
        }
        return SCHEME_PATTERN.replace(trimmed, "").into_owned();
    }

    if let Some(caps) = SCP_LIKE_PATTERN.captures(trimmed) {
        return format!("{}/{}", &caps[1], &caps[2]);
    }

    trimmed.to_string()
}

fn normalize_url_form(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;

    let mut normalized = host.to_string();
    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }
    if url.path() != "/" {
        normalized.push_str(url.path());
    }

    Some(normalized)
}

/// Detect the module source from the `origin` remote.
#[must_use]
pub fn detect_source(inspector: &dyn RepositoryInspector, directory: &Path) -> Option<String> {
    let remote = inspector.remote_url(directory)?;
    let source = normalize_remote_url(&remote);
    tracing::debug!(remote = %remote, source = %source, "Detected module source");
    (!source.is_empty()).then_some(source)
}

/// Detect the module name.
///
/// Uses the last path segment of the detected source, or the directory's
/// own name when there is no remote.
#[must_use]
pub fn detect_module_name(inspector: &dyn RepositoryInspector, directory: &Path) -> Option<String> {
    detect_source(inspector, directory)
        .and_then(|source| last_segment(&source))
        .or_else(|| directory_name(directory))
}

fn last_segment(source: &str) -> Option<String> {
    source
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(String::from)
}

/// Name of a directory, resolving `.` and friends through the filesystem.
#[must_use]
pub fn directory_name(directory: &Path) -> Option<String> {
    let named = |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty() && name != "." && name != "..")
    };

    named(directory).or_else(|| {
        directory
            .canonicalize()
            .ok()
            .and_then(|absolute| named(&absolute))
    })
}
