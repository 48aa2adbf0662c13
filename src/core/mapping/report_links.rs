//! Report link resolution
//!
//! Report links point from the export report into an exported entry. They
//! are always expressed relative to the entry's source root, never across
//! hosts, so host prefixes on resolved values are dropped.

use crate::core::job::ReportLink;
use crate::core::mapping::{non_blank, ReportLinkRule};
use crate::domain::selector;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// Where a rule's report links are anchored
#[derive(Debug, Clone)]
pub struct LinkAnchor {
    root: PathBuf,
    target: PathBuf,
    local: bool,
}

impl LinkAnchor {
    /// Anchor on an export source
    ///
    /// For a local file source links resolve against its parent directory
    /// and `"."` points at the file itself. Remote sources are never touched.
    pub fn new(src: &Path, local: bool) -> Self {
        if local && src.is_file() {
            let root = src.parent().map(Path::to_path_buf).unwrap_or_default();
            Self {
                root,
                target: src.to_path_buf(),
                local,
            }
        } else {
            Self {
                root: src.to_path_buf(),
                target: src.to_path_buf(),
                local,
            }
        }
    }

    /// Directory links are relative to
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Resolve declared report links for one export entry
///
/// Links that cannot be resolved are dropped. `dest` is used to name links
/// pointing at the entry itself.
pub fn build_report_links(
    rules: &[ReportLinkRule],
    anchor: &LinkAnchor,
    dest: &str,
    document: &Value,
) -> Vec<ReportLink> {
    let mut links = Vec::new();

    for rule in rules {
        let Some(section) = non_blank(&rule.section) else {
            tracing::debug!(dest, "Report link without section skipped");
            continue;
        };
        let Some(path) = link_path(rule, document, anchor.root()) else {
            continue;
        };
        if Path::new(&path).is_absolute() {
            tracing::debug!(dest, path = %path, "Absolute report link skipped");
            continue;
        }

        let description = non_blank(&rule.description);
        let link_name = non_blank(&rule.link_name);

        if path.contains(GLOB_CHARS) {
            if !anchor.local {
                tracing::debug!(dest, path = %path, "Glob report link on remote source skipped");
                continue;
            }
            for matched in expand(anchor.root(), &path) {
                let rel = matched
                    .strip_prefix(anchor.root())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(file_name(&matched)));
                let rel = rel.to_string_lossy().into_owned();
                let name = link_name
                    .map(str::to_string)
                    .or_else(|| auto_link_name(&file_name(&matched)));
                links.push(make_link(rel, section, description, name));
            }
            continue;
        }

        let target = if path == "." {
            anchor.target.clone()
        } else {
            anchor.root().join(&path)
        };
        if anchor.local && path != "." && !target.exists() {
            tracing::debug!(dest, path = %path, "Report link target missing, skipped");
            continue;
        }

        let base = if path == "." {
            file_name(Path::new(dest))
        } else {
            file_name(Path::new(&path))
        };
        let name = link_name.map(str::to_string).or_else(|| auto_link_name(&base));
        links.push(make_link(path, section, description, name));
    }

    links
}

/// Link path from a literal `path` or a project-key lookup
fn link_path(rule: &ReportLinkRule, document: &Value, root: &Path) -> Option<String> {
    if let Some(path) = non_blank(&rule.path) {
        return Some(path.to_string());
    }

    let key = non_blank(&rule.src_project_key)?;
    let resolved = selector::resolve(document, key).and_then(Value::as_str)?;
    let resolved = resolved.trim();
    if resolved.is_empty() {
        return None;
    }

    let resolved = match resolved.split_once(':') {
        Some((host, rest)) if !host.is_empty() && rest.starts_with('/') => rest,
        _ => resolved,
    };

    let path = Path::new(resolved);
    if path.is_absolute() {
        Some(match path.strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => file_name(path),
        })
    } else {
        Some(resolved.to_string())
    }
}

fn expand(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        pattern
    );
    let mut matches: Vec<PathBuf> = match glob::glob(&full) {
        Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Invalid report link pattern");
            Vec::new()
        }
    };
    matches.sort();
    matches
}

fn make_link(
    path: String,
    section: &str,
    description: Option<&str>,
    link_name: Option<String>,
) -> ReportLink {
    ReportLink {
        path,
        section: section.to_string(),
        description: description.map(str::to_string),
        link_name,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display name derived from a file name: underscores become spaces
pub fn auto_link_name(base: &str) -> Option<String> {
    let name = base.replace('_', " ");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rule(path: &str, section: &str) -> ReportLinkRule {
        ReportLinkRule {
            path: Some(path.to_string()),
            src_project_key: None,
            section: Some(section.to_string()),
            description: None,
            link_name: None,
        }
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("qc")).unwrap();
        fs::write(dir.path().join("qc/multiqc_report.html"), "x").unwrap();
        fs::write(dir.path().join("qc/fastqc_a.html"), "x").unwrap();
        fs::write(dir.path().join("qc/fastqc_b.html"), "x").unwrap();
        dir
    }

    #[test]
    fn test_literal_link_existing() {
        let dir = fixture();
        let anchor = LinkAnchor::new(dir.path(), true);
        let links = build_report_links(
            &[rule("qc/multiqc_report.html", "qc")],
            &anchor,
            "raw/qc",
            &Value::Null,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path, "qc/multiqc_report.html");
        assert_eq!(links[0].link_name.as_deref(), Some("multiqc report.html"));
        assert!(links[0].description.is_none());
    }

    #[test]
    fn test_missing_local_link_skipped() {
        let dir = fixture();
        let anchor = LinkAnchor::new(dir.path(), true);
        let links = build_report_links(&[rule("qc/nope.html", "qc")], &anchor, "d", &Value::Null);
        assert!(links.is_empty());
    }

    #[test]
    fn test_remote_link_kept_as_declared() {
        let anchor = LinkAnchor::new(Path::new("/remote/only/path"), false);
        let links = build_report_links(&[rule("qc/x.html", "qc")], &anchor, "d", &Value::Null);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path, "qc/x.html");
    }

    #[test]
    fn test_dot_link_names_after_dest() {
        let anchor = LinkAnchor::new(Path::new("/does/not/exist"), true);
        let links = build_report_links(
            &[rule(".", "analysis")],
            &anchor,
            "rnaseq/salmon_quant",
            &Value::Null,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path, ".");
        assert_eq!(links[0].link_name.as_deref(), Some("salmon quant"));
    }

    #[test]
    fn test_glob_link_expands_sorted() {
        let dir = fixture();
        let anchor = LinkAnchor::new(dir.path(), true);
        let mut glob_rule = rule("qc/fastqc_*.html", "qc");
        glob_rule.link_name = Some("FastQC".to_string());
        let links = build_report_links(&[glob_rule], &anchor, "d", &Value::Null);
        let paths: Vec<_> = links.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(paths, vec!["qc/fastqc_a.html", "qc/fastqc_b.html"]);
        assert!(links.iter().all(|l| l.link_name.as_deref() == Some("FastQC")));
    }

    #[test]
    fn test_glob_link_on_remote_skipped() {
        let anchor = LinkAnchor::new(Path::new("/remote"), false);
        let links = build_report_links(&[rule("*.html", "qc")], &anchor, "d", &Value::Null);
        assert!(links.is_empty());
    }

    #[test]
    fn test_absolute_literal_skipped() {
        let anchor = LinkAnchor::new(Path::new("/remote"), false);
        let links = build_report_links(&[rule("/etc/passwd", "qc")], &anchor, "d", &Value::Null);
        assert!(links.is_empty());
    }

    #[test]
    fn test_project_key_strips_host_and_relativizes() {
        let dir = fixture();
        let report = dir.path().join("qc/multiqc_report.html");
        let doc: Value = serde_yaml::from_str(&format!(
            "templates:\n  - id: qc\n    published:\n      report: \"nextgen:{}\"\n",
            report.display()
        ))
        .unwrap();
        let anchor = LinkAnchor::new(dir.path(), true);
        let link = ReportLinkRule {
            path: None,
            src_project_key: Some("templates[id=qc].published.report".to_string()),
            section: Some("qc".to_string()),
            description: Some("MultiQC summary".to_string()),
            link_name: None,
        };
        let links = build_report_links(&[link], &anchor, "d", &doc);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path, "qc/multiqc_report.html");
        assert_eq!(links[0].description.as_deref(), Some("MultiQC summary"));
    }

    #[test]
    fn test_file_source_anchors_on_parent() {
        let dir = fixture();
        let file = dir.path().join("qc/multiqc_report.html");
        let anchor = LinkAnchor::new(&file, true);
        assert_eq!(anchor.root(), dir.path().join("qc"));

        let links = build_report_links(
            &[rule(".", "qc"), rule("fastqc_a.html", "qc")],
            &anchor,
            "qc/multiqc_report.html",
            &Value::Null,
        );
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].link_name.as_deref(), Some("multiqc report.html"));
        assert_eq!(links[1].path, "fastqc_a.html");
    }

    #[test]
    fn test_link_without_section_skipped() {
        let anchor = LinkAnchor::new(Path::new("/remote"), false);
        let mut no_section = rule("x.html", "qc");
        no_section.section = Some("  ".to_string());
        assert!(build_report_links(&[no_section], &anchor, "d", &Value::Null).is_empty());
    }

    #[test]
    fn test_auto_link_name() {
        assert_eq!(auto_link_name("multi_qc_"), Some("multi qc".to_string()));
        assert_eq!(auto_link_name("_"), None);
    }
}
