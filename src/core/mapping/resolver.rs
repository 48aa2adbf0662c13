//! Mapping table resolution
//!
//! Walks the mapping table in order and turns every applicable rule into
//! zero or more [`ExportEntry`] values. Misses (unused template, missing
//! published output, missing local source, empty glob) skip the rule and
//! never fail the resolution.

use crate::core::job::ExportEntry;
use crate::core::mapping::report_links::{build_report_links, LinkAnchor};
use crate::core::mapping::{non_blank, MappingRule, RuleKind};
use crate::domain::host_path::normalize;
use crate::domain::selector;
use crate::domain::{HostPath, ProjectState, Result, TemplateId, EXPORT_TEMPLATE_ID};
use crate::log_rule_skipped;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE_ROOT: &str = "{template_root}";

/// Filesystem and host facts the resolver needs about a project
#[derive(Debug, Clone)]
pub struct ResolveContext {
    project_root: PathBuf,
    project_home: HostPath,
    current_host: String,
    project_name: String,
    template_roots: HashMap<String, PathBuf>,
}

impl ResolveContext {
    /// Create a context from explicit values
    ///
    /// `project_root` is the local directory of the project and
    /// `project_home` the same directory as seen from its own host.
    pub fn new(
        project_root: impl Into<PathBuf>,
        project_home: HostPath,
        current_host: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            project_root: normalize(&project_root.into()),
            project_home,
            current_host: current_host.into(),
            project_name: project_name.into(),
            template_roots: HashMap::new(),
        }
    }

    /// Derive a context from a project directory and its state document
    ///
    /// The project host comes from `project_path` when the document has
    /// one; otherwise the project is assumed to live on the current host.
    pub fn for_project(project_dir: &Path, state: &ProjectState, current_host: &str) -> Self {
        let root = fs::canonicalize(project_dir).unwrap_or_else(|_| normalize(project_dir));
        let home = match state.project_path.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => HostPath::split(raw, current_host),
            _ => HostPath::new(current_host, root.to_string_lossy().into_owned()),
        };
        Self::new(root, home, current_host, state.name.clone())
    }

    /// Override the on-disk root of one template
    pub fn with_template_root(mut self, template_id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.template_roots.insert(template_id.into(), root.into());
        self
    }

    /// Local project directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Project directory as seen from its own host
    pub fn project_home(&self) -> &HostPath {
        &self.project_home
    }

    /// Host the project lives on
    pub fn project_host(&self) -> &str {
        self.project_home.host()
    }

    /// Host running the resolution
    pub fn current_host(&self) -> &str {
        &self.current_host
    }

    /// Project name used on emitted entries
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// On-disk root of a template, `<project_root>/<id>` unless overridden
    pub fn template_root(&self, template_id: &str) -> PathBuf {
        self.template_roots
            .get(template_id)
            .cloned()
            .unwrap_or_else(|| self.project_root.join(template_id))
    }

    /// Host-qualify a local absolute path against this project
    pub fn hostify(&self, local_abs: &Path) -> HostPath {
        HostPath::hostify(
            local_abs,
            &self.project_root,
            &self.project_home,
            &self.current_host,
        )
    }
}

/// Resolves mapping rules against a project
#[derive(Debug, Clone)]
pub struct MappingResolver {
    ctx: ResolveContext,
}

/// A rule's source after precedence and placeholder handling
struct ResolvedSource {
    host: String,
    path: PathBuf,
}

impl MappingResolver {
    /// Create a resolver for one project
    pub fn new(ctx: ResolveContext) -> Self {
        Self { ctx }
    }

    /// The project context
    pub fn context(&self) -> &ResolveContext {
        &self.ctx
    }

    /// Resolve `rules` in table order
    ///
    /// With `used` set, rules for templates the project never rendered are
    /// skipped. The result is deterministic for an unchanged project and
    /// filesystem.
    pub fn resolve(
        &self,
        rules: &[MappingRule],
        state: &ProjectState,
        used: Option<&HashSet<TemplateId>>,
    ) -> Result<Vec<ExportEntry>> {
        let document = state.to_value()?;
        let mut entries = Vec::new();

        for rule in rules {
            let template_id = rule.template_id.trim();
            if template_id.is_empty() || template_id == EXPORT_TEMPLATE_ID {
                continue;
            }
            if let Some(used) = used {
                if !used.iter().any(|id| id.as_str() == template_id) {
                    log_rule_skipped!(template_id, "template not used by project");
                    continue;
                }
            }

            let before = entries.len();
            self.resolve_rule(rule, template_id, state, &document, &mut entries);
            tracing::debug!(
                template_id,
                dest = %rule.dest,
                emitted = entries.len() - before,
                "Resolved mapping rule"
            );
        }

        tracing::info!(
            rules = rules.len(),
            entries = entries.len(),
            project = %self.ctx.project_name,
            "Resolved export mapping"
        );
        Ok(entries)
    }

    fn resolve_rule(
        &self,
        rule: &MappingRule,
        template_id: &str,
        state: &ProjectState,
        document: &Value,
        out: &mut Vec<ExportEntry>,
    ) {
        let source = self.source_for(rule, template_id, state, document);
        let dest = rule.dest.replace("{template_id}", template_id);
        let on_project_host = source.host == self.ctx.project_host();

        match rule.rule {
            RuleKind::Tree => {
                if on_project_host && !source.path.exists() {
                    log_rule_skipped!(template_id, "source missing", source.path.display());
                    return;
                }
                out.push(self.entry(rule, &source.host, &source.path, dest, document));
            }
            RuleKind::Glob => {
                if !on_project_host {
                    tracing::warn!(
                        template_id,
                        host = %source.host,
                        "Glob rules need a source on the project host, rule skipped"
                    );
                    return;
                }
                let template_root = self.ctx.template_root(template_id);
                let roots = [template_root.as_path(), self.ctx.project_root.as_path()];
                let pattern = glob_pattern(&source.path, &roots);
                for file in glob_files(&pattern) {
                    let dest = expand_glob_dest(&dest, &file, &template_root);
                    out.push(self.entry(rule, &source.host, &file, dest, document));
                }
            }
        }
    }

    /// Apply source precedence: project key, published key, literal `src`,
    /// then the template root
    fn source_for(
        &self,
        rule: &MappingRule,
        template_id: &str,
        state: &ProjectState,
        document: &Value,
    ) -> ResolvedSource {
        let default_host = non_blank(&rule.host).unwrap_or(&self.ctx.current_host);

        let from_project_key = non_blank(&rule.src_project_key)
            .and_then(|key| selector::resolve(document, key))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());
        let from_published = || {
            non_blank(&rule.src_published_key).and_then(|key| {
                state
                    .template(template_id)
                    .and_then(|entry| entry.published_str(key))
            })
        };

        let (mut host, raw) = if let Some(value) = from_project_key {
            let hp = HostPath::split(value.trim(), default_host);
            (hp.host().to_string(), hp.path().to_string())
        } else if let Some(value) = from_published() {
            let hp = HostPath::split(value, default_host);
            (hp.host().to_string(), hp.path().to_string())
        } else {
            let literal = non_blank(&rule.src).unwrap_or(TEMPLATE_ROOT);
            (default_host.to_string(), literal.to_string())
        };

        let raw = if raw.contains(TEMPLATE_ROOT) {
            host = self.ctx.project_host().to_string();
            let root = self.ctx.template_root(template_id);
            raw.replace(TEMPLATE_ROOT, &root.to_string_lossy())
        } else {
            raw
        };

        let path = Path::new(&raw);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            host = self.ctx.project_host().to_string();
            normalize(&self.ctx.project_root.join(path))
        };

        ResolvedSource { host, path }
    }

    fn entry(
        &self,
        rule: &MappingRule,
        host: &str,
        src: &Path,
        dest: String,
        document: &Value,
    ) -> ExportEntry {
        let report_links = if rule.report_links.is_empty() {
            Vec::new()
        } else {
            let anchor = LinkAnchor::new(src, host == self.ctx.project_host());
            build_report_links(&rule.report_links, &anchor, &dest, document)
        };

        ExportEntry {
            src: src.to_string_lossy().into_owned(),
            dest,
            host: host.to_string(),
            project: non_blank(&rule.project)
                .unwrap_or(&self.ctx.project_name)
                .to_string(),
            mode: rule.mode,
            include_in_report: rule.include_in_report,
            report_section: non_blank(&rule.report_section).map(str::to_string),
            description: non_blank(&rule.description).map(str::to_string),
            report_links,
        }
    }
}

/// Render a glob source as a pattern, escaping the first root it lies under
///
/// Only the part below the root is a pattern; the root itself is a literal
/// directory that may contain `[`, `?` or `*`.
fn glob_pattern(source: &Path, roots: &[&Path]) -> String {
    for root in roots.iter().filter(|r| !r.as_os_str().is_empty()) {
        if let Ok(rest) = source.strip_prefix(root) {
            let root = glob::Pattern::escape(&root.to_string_lossy());
            if rest.as_os_str().is_empty() {
                return root;
            }
            return format!("{}/{}", root.trim_end_matches('/'), rest.to_string_lossy());
        }
    }
    source.to_string_lossy().into_owned()
}

/// Files matching a glob pattern, sorted
fn glob_files(pattern: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
            .collect(),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Invalid glob pattern");
            Vec::new()
        }
    };
    files.sort();
    files
}

/// Substitute `{basename}`, `{stem}` and `{relpath}` for one glob match
fn expand_glob_dest(dest: &str, file: &Path, template_root: &Path) -> String {
    let basename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let relpath = file
        .strip_prefix(template_root)
        .map(|rel| rel.to_string_lossy().into_owned())
        .unwrap_or_else(|_| basename.clone());

    dest.replace("{basename}", &basename)
        .replace("{stem}", &stem)
        .replace("{relpath}", &relpath)
}
