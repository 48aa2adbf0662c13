//! Host-qualified paths
//!
//! Paths published by pipeline steps may name the machine they live on
//! (`nextgen:/mnt/runs/run1/output`) or be plain absolute paths. Inside
//! Courier they are carried as a tagged `{host, path}` pair and only turned
//! back into a string at the edges (project document, job spec).

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path together with the host it physically resides on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPath {
    host: String,
    path: String,
}

impl HostPath {
    /// Create a host path; the path is normalized to start with `/`
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: ensure_leading_slash(path.into()),
        }
    }

    /// Split a raw `host:/abs/path` string
    ///
    /// Everything before the first colon is the host; without a colon the
    /// `default_host` is used. The path always comes back absolute, which
    /// repairs upstream values that dropped their leading slash.
    ///
    /// # Example
    ///
    /// ```
    /// use courier::domain::host_path::HostPath;
    ///
    /// let hp = HostPath::split("nextgen:mnt/data", "local");
    /// assert_eq!(hp.host(), "nextgen");
    /// assert_eq!(hp.path(), "/mnt/data");
    ///
    /// let hp = HostPath::split("/mnt/data", "local");
    /// assert_eq!(hp.host(), "local");
    /// ```
    pub fn split(raw: &str, default_host: &str) -> Self {
        match raw.split_once(':') {
            Some((host, rest)) => Self::new(host, rest),
            None => Self::new(default_host, raw),
        }
    }

    /// Host-qualify a local absolute path
    ///
    /// A path inside `project_root` is re-expressed relative to the project's
    /// own host-qualified root (`project`), reusing the project host. Any other
    /// path falls back to `current_host` plus the raw absolute path.
    pub fn hostify(
        local_abs: &Path,
        project_root: &Path,
        project: &HostPath,
        current_host: &str,
    ) -> Self {
        let local = normalize(local_abs);
        let root = normalize(project_root);

        match local.strip_prefix(&root) {
            Ok(rel) => project.join(&rel.to_string_lossy()),
            Err(_) => Self::new(current_host, local.to_string_lossy().into_owned()),
        }
    }

    /// Host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute path on the host
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append a relative path on the same host
    pub fn join(&self, rel: &str) -> Self {
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() {
            return self.clone();
        }
        let base = self.path.trim_end_matches('/');
        Self::new(self.host.clone(), format!("{base}/{rel}"))
    }

    /// Path relative to `root`, if both are on the same host and `root`
    /// contains this path. The root itself relates as `"."`.
    pub fn relative_to(&self, root: &HostPath) -> Option<String> {
        if self.host != root.host {
            return None;
        }
        let rel = normalize(Path::new(&self.path))
            .strip_prefix(normalize(Path::new(&root.path)))
            .ok()?
            .to_string_lossy()
            .into_owned();
        Some(if rel.is_empty() { ".".to_string() } else { rel })
    }
}

impl fmt::Display for HostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.path)
    }
}

/// Short host name of the machine running Courier
///
/// Only the part before the first dot is kept so that `nextgen.lab.example`
/// and `nextgen` compare equal to the host prefixes used in project files.
pub fn current_hostname() -> String {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned())
        .and_then(|h| h.split('.').next().map(str::to_string))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Lexically normalize a path: drop `.` components and fold `..`
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn ensure_leading_slash(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}
