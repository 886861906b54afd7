/// Name used when a repository URL does not end in `<host>/<owner>/<repo>`.
pub const FALLBACK_PROJECT_NAME: &str = "project";

/// Derive a human-readable project name from a repository locator.
///
/// Returns the final path segment when the input ends in `<host>/<owner>/<repo>`
/// (owner and repo non-empty, no slashes), otherwise [`FALLBACK_PROJECT_NAME`].
/// Never fails.
pub fn derive_project_name(url: &str) -> String {
    match split_owner_repo(url) {
        Some((_owner, repo)) => repo.to_string(),
        None => FALLBACK_PROJECT_NAME.to_string(),
    }
}

fn split_owner_repo(url: &str) -> Option<(&str, &str)> {
    let mut parts = url.rsplitn(3, '/');
    let repo = parts.next()?;
    let owner = parts.next()?;
    let host = parts.next()?;
    if repo.is_empty() || owner.is_empty() || host.is_empty() {
        return None;
    }
    Some((owner, repo))
}
