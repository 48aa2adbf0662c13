//! Export mapping table
//!
//! The mapping table is an ordered list of rules, each describing how one
//! output of one template is exported. It is loaded from YAML:
//!
//! ```yaml
//! mappings:
//!   - template_id: rnaseq
//!     src_published_key: salmon_dir
//!     dest: "{template_id}/quant"
//!     report_section: analysis
//!     description: Salmon quantification
//!   - template_id: rnaseq
//!     src: "{template_root}/results/**/*.html"
//!     rule: glob
//!     dest: "{template_id}/reports/{basename}"
//!     mode: copy
//! ```
//!
//! Table order is significant: it is the order of the export list.

pub mod report_links;
pub mod resolver;

pub use resolver::{MappingResolver, ResolveContext};

use crate::domain::selector::Selector;
use crate::domain::{CourierError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::fs;
use std::path::Path;

/// How the export engine materializes an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Link to the source in place
    #[default]
    Symlink,
    /// Copy the source
    Copy,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::Symlink => write!(f, "symlink"),
            ExportMode::Copy => write!(f, "copy"),
        }
    }
}

/// How a rule's source is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// The source is one file or directory tree
    #[default]
    Tree,
    /// The source is a glob pattern; every matching file is exported
    Glob,
}

/// A report link declared on a mapping rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLinkRule {
    /// Path relative to the export source, `"."` for the source itself
    #[serde(default)]
    pub path: Option<String>,

    /// Selector into the project document yielding the path
    #[serde(default)]
    pub src_project_key: Option<String>,

    /// Report section the link belongs to
    #[serde(default)]
    pub section: Option<String>,

    /// Link description
    #[serde(default)]
    pub description: Option<String>,

    /// Display name; derived from the file name when absent
    #[serde(default)]
    pub link_name: Option<String>,
}

/// One row of the mapping table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Template whose outputs this rule exports
    pub template_id: String,

    /// Literal source path; may contain `{template_root}`
    #[serde(default)]
    pub src: Option<String>,

    /// Key into the template's `published` map
    #[serde(default)]
    pub src_published_key: Option<String>,

    /// Selector into the whole project document
    #[serde(default)]
    pub src_project_key: Option<String>,

    /// Destination inside the export; may contain `{template_id}`, and for
    /// glob rules `{basename}`, `{stem}` and `{relpath}`
    pub dest: String,

    /// Host override for the source
    #[serde(default)]
    pub host: Option<String>,

    /// Project name override for the emitted entry
    #[serde(default)]
    pub project: Option<String>,

    /// Export mode
    #[serde(default)]
    pub mode: ExportMode,

    /// Source interpretation
    #[serde(default)]
    pub rule: RuleKind,

    /// Report section of the entry
    #[serde(default)]
    pub report_section: Option<String>,

    /// Entry description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the entry appears in the export report
    #[serde(default = "default_true")]
    pub include_in_report: bool,

    /// Report links attached to the entry
    #[serde(default)]
    pub report_links: Vec<ReportLinkRule>,
}

impl MappingRule {
    /// Check the rule for configuration errors
    pub fn validate(&self) -> Result<()> {
        if self.dest.trim().is_empty() {
            return Err(CourierError::Mapping(format!(
                "rule for template '{}' has an empty dest",
                self.template_id
            )));
        }

        if let Some(key) = non_blank(&self.src_project_key) {
            Selector::parse(key)?;
        }

        for (idx, link) in self.report_links.iter().enumerate() {
            if non_blank(&link.section).is_none() {
                return Err(CourierError::Mapping(format!(
                    "report link #{idx} of template '{}' has no section",
                    self.template_id
                )));
            }
            match (non_blank(&link.path), non_blank(&link.src_project_key)) {
                (None, None) => {
                    return Err(CourierError::Mapping(format!(
                        "report link #{idx} of template '{}' needs path or src_project_key",
                        self.template_id
                    )))
                }
                (None, Some(key)) => {
                    Selector::parse(key)?;
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// The ordered mapping table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    /// Rules in table order
    pub mappings: Vec<MappingRule>,
}

impl MappingTable {
    /// Parse a mapping table from YAML
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Mapping`] if the document is not a mapping,
    /// `mappings` is not a list, or any rule is malformed.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(contents)
            .map_err(|e| CourierError::Mapping(format!("Failed to parse mapping YAML: {e}")))?;

        let entries = match &doc {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(map) => match map.get("mappings") {
                None | Some(Value::Null) => return Ok(Self::default()),
                Some(Value::Sequence(entries)) => entries,
                Some(_) => {
                    return Err(CourierError::Mapping(
                        "mapping table must contain a 'mappings' list".to_string(),
                    ))
                }
            },
            _ => {
                return Err(CourierError::Mapping(
                    "mapping table must be a YAML mapping".to_string(),
                ))
            }
        };

        let mappings = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let rule: MappingRule = serde_yaml::from_value(entry.clone()).map_err(|e| {
                    CourierError::Mapping(format!("mapping rule #{idx} is malformed: {e}"))
                })?;
                rule.validate()?;
                Ok(rule)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rules = mappings.len(), "Parsed mapping table");
        Ok(Self { mappings })
    }

    /// Load a mapping table from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CourierError::Mapping(format!(
                "Failed to read mapping table {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the table has no rules
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn default_true() -> bool {
    true
}
