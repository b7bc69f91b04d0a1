use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{Result, StatusError};

lazy_static! {
    static ref SCHEME_URL: Regex = Regex::new(
        r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:(?P<user>[^@/]*)@)?(?P<host>[^/:?#]*)(?::(?P<port>[0-9]*))?(?P<path>/[^?#]*)?(?:\?[^#]*)?(?:#.*)?$"
    )
    .unwrap();
    static ref SCP_URL: Regex = Regex::new(
        r"^(?:(?P<user>[^@]+)@)?(?P<host>[^:\s]+):(?:(?P<port>[0-9]{1,5})/)?(?P<path>[^\\?#][^?#]*)(?:\?[^#]*)?(?:#.*)?$"
    )
    .unwrap();
}

const SCHEMES: &[&str] = &[
    "ssh", "git", "git+ssh", "ssh+git", "http", "https", "ftp", "ftps", "rsync", "file",
];

/// Extract the repository path of a git remote in any of the forms git itself
/// accepts: a URL with a scheme, the scp-like `user@host:path` syntax or a local path.
fn parse_remote_path(raw: &str) -> Result<String> {
    let invalid = || StatusError::InvalidRepoUrl(raw.to_string());
    if raw.trim().is_empty() || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }
    if raw.contains("://") {
        let caps = SCHEME_URL.captures(raw).ok_or_else(invalid)?;
        let scheme = caps["scheme"].to_ascii_lowercase();
        if !SCHEMES.contains(&scheme.as_str()) {
            return Err(invalid());
        }
        if caps["host"].is_empty() && scheme != "file" {
            return Err(invalid());
        }
        return Ok(caps.name("path").map_or("", |m| m.as_str()).to_string());
    }
    if let Some(caps) = SCP_URL.captures(raw) {
        return Ok(caps["path"].to_string());
    }
    Ok(raw.to_string())
}

/// Whether `segment` can be placed into an API route as a single path segment.
pub fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
}

/// Reduce a git remote to `owner/repo`. Paths with fewer than two segments are
/// returned as their single segment, or empty.
pub fn full_name_by_repo_url(raw: &str) -> Result<String> {
    let path = parse_remote_path(raw)?;
    let path = path.strip_suffix(".git").unwrap_or(&path);
    let parts = path.split('/').filter(|p| !p.is_empty()).collect::<Vec<_>>();
    if parts.len() >= 2 {
        return Ok(parts[..2].join("/"));
    }
    Ok(parts.first().copied().unwrap_or_default().to_string())
}

/// Resolve a git remote to the repository slug used by the GitHub API.
pub fn resolve_slug(raw: &str) -> Result<util::Slug> {
    let invalid = || StatusError::InvalidRepositoryName(raw.to_string());
    let slug: util::Slug = full_name_by_repo_url(raw)?.parse().map_err(|_| invalid())?;
    if !is_path_segment(&slug.owner) || !is_path_segment(&slug.repo) {
        return Err(invalid());
    }
    Ok(slug)
}
