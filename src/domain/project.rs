//! Project state document
//!
//! A project is described by a `project.yaml` holding its name, authors and
//! the templates that have been rendered into it. Each template entry carries
//! its `params` and the `published` outputs later steps consume:
//!
//! ```yaml
//! name: 250901_Demo_UKA
//! project_path: nextgen:/mnt/nextgen/projects/250901_Demo_UKA
//! authors:
//!   - name: Ada Lovelace
//!     affiliation: UKA
//! templates:
//!   - id: rnaseq
//!     params: {genome: GRCh38}
//!     published:
//!       salmon_dir: nextgen:/mnt/nextgen/projects/250901_Demo_UKA/rnaseq/results/salmon
//! ```
//!
//! Keys Courier does not interpret are kept in `extra` so that writing the
//! document back does not lose them.

use crate::domain::ids::TemplateId;
use crate::domain::selector;
use crate::domain::{CourierError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

/// One project author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    /// Structured author entry
    Detailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        affiliation: Option<String>,
    },
    /// Bare author string
    Name(String),
}

impl Author {
    /// Render as `"name, affiliation"`, `"name"`, or nothing without a name
    pub fn formatted(&self) -> Option<String> {
        match self {
            Author::Detailed {
                name: Some(name),
                affiliation,
            } if !name.is_empty() => Some(match affiliation.as_deref() {
                Some(aff) if !aff.is_empty() => format!("{name}, {aff}"),
                _ => name.clone(),
            }),
            Author::Name(name) if !name.is_empty() => Some(name.clone()),
            _ => None,
        }
    }
}

/// A template rendered into the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Template id, unique within the project
    pub id: String,

    /// Parameters the template was rendered with
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub params: Mapping,

    /// Outputs exposed for downstream steps
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub published: Mapping,

    /// Keys not interpreted by Courier
    #[serde(flatten)]
    pub extra: Mapping,
}

impl TemplateEntry {
    /// Create an empty entry for `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Mapping::new(),
            published: Mapping::new(),
            extra: Mapping::new(),
        }
    }

    /// A published value, if it is a non-empty string
    pub fn published_str(&self, key: &str) -> Option<&str> {
        non_empty_str(self.published.get(key))
    }

    /// A parameter value, if it is a non-empty string
    pub fn param_str(&self, key: &str) -> Option<&str> {
        non_empty_str(self.params.get(key))
    }

    /// A raw parameter value
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }
}

/// The project state document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Project name, e.g. `250901_Demo_UKA`
    #[serde(default)]
    pub name: String,

    /// Host-qualified project location, e.g. `nextgen:/mnt/projects/P1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,

    /// Project authors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    /// Rendered templates in project order
    #[serde(default)]
    pub templates: Vec<TemplateEntry>,

    /// Keys not interpreted by Courier
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ProjectState {
    /// Parse a project document from YAML
    ///
    /// An empty document yields an empty project.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let state: ProjectState = serde_yaml::from_str(contents)
            .map_err(|e| CourierError::Project(format!("Failed to parse project YAML: {e}")))?;
        state.validate()?;
        Ok(state)
    }

    /// Serialize the project document to YAML
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check structural invariants
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Project`] if two template entries share an id.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.templates {
            if !seen.insert(entry.id.as_str()) {
                return Err(CourierError::Project(format!(
                    "template id '{}' appears more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    /// Find the template entry with `id`
    pub fn template(&self, id: &str) -> Option<&TemplateEntry> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Find or append the template entry with `id`
    pub fn template_entry(&mut self, id: &str) -> &mut TemplateEntry {
        let idx = match self.templates.iter().position(|t| t.id == id) {
            Some(idx) => idx,
            None => {
                self.templates.push(TemplateEntry::new(id));
                self.templates.len() - 1
            }
        };
        &mut self.templates[idx]
    }

    /// Ids of all templates used by the project
    pub fn used_template_ids(&self) -> HashSet<TemplateId> {
        self.templates
            .iter()
            .filter_map(|t| TemplateId::new(t.id.clone()).ok())
            .collect()
    }

    /// Authors rendered for the export job
    pub fn formatted_authors(&self) -> Vec<String> {
        self.authors.iter().filter_map(Author::formatted).collect()
    }

    /// The whole document as a YAML value, for selector lookups
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_yaml::to_value(self)?)
    }

    /// Resolve a selector against this document to a non-empty string
    pub fn lookup_str(&self, document: &Value, path: &str) -> Option<String> {
        selector::resolve(document, path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"
name: 250901_Demo_UKA
project_path: nextgen:/mnt/nextgen/projects/250901_Demo_UKA
authors:
  - name: Ada Lovelace
    affiliation: UKA
  - name: Grace Hopper
  - Alan Turing
  - affiliation: Nobody
templates:
  - id: rnaseq
    params:
      genome: GRCh38
    published:
      salmon_dir: /data/salmon
    status: done
  - id: export
    params:
      export_engine_api_url: http://export.example.org/export
custom_key: keep me
"#;

    #[test]
    fn test_parse_project() {
        let state = ProjectState::from_yaml_str(PROJECT).unwrap();
        assert_eq!(state.name, "250901_Demo_UKA");
        assert_eq!(state.templates.len(), 2);
        assert_eq!(
            state.template("rnaseq").unwrap().published_str("salmon_dir"),
            Some("/data/salmon")
        );
        assert_eq!(
            state.template("export").unwrap().param_str("export_engine_api_url"),
            Some("http://export.example.org/export")
        );
    }

    #[test]
    fn test_formatted_authors() {
        let state = ProjectState::from_yaml_str(PROJECT).unwrap();
        assert_eq!(
            state.formatted_authors(),
            vec!["Ada Lovelace, UKA", "Grace Hopper", "Alan Turing"]
        );
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let state = ProjectState::from_yaml_str(PROJECT).unwrap();
        let yaml = state.to_yaml_string().unwrap();
        assert!(yaml.contains("custom_key: keep me"));
        assert!(yaml.contains("status: done"));

        let reparsed = ProjectState::from_yaml_str(&yaml).unwrap();
        assert_eq!(reparsed, state);
    }

    #[test]
    fn test_duplicate_template_ids_rejected() {
        let yaml = "name: p\ntemplates:\n  - id: a\n  - id: a\n";
        let err = ProjectState::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, CourierError::Project(_)));
    }

    #[test]
    fn test_empty_document() {
        let state = ProjectState::from_yaml_str("  \n").unwrap();
        assert!(state.templates.is_empty());
        assert!(state.name.is_empty());
    }

    #[test]
    fn test_template_entry_creates_once() {
        let mut state = ProjectState::from_yaml_str(PROJECT).unwrap();
        state.template_entry("qc");
        state.template_entry("qc");
        assert_eq!(state.templates.len(), 3);
        assert_eq!(state.templates[2].id, "qc");
    }

    #[test]
    fn test_lookup_through_selector() {
        let state = ProjectState::from_yaml_str(PROJECT).unwrap();
        let doc = state.to_value().unwrap();
        assert_eq!(
            state.lookup_str(&doc, "templates[id=rnaseq].published.salmon_dir"),
            Some("/data/salmon".to_string())
        );
        assert_eq!(state.lookup_str(&doc, "templates[id=rnaseq].params.nope"), None);
    }

    #[test]
    fn test_used_template_ids() {
        let state = ProjectState::from_yaml_str(PROJECT).unwrap();
        let used = state.used_template_ids();
        assert!(used.contains(&TemplateId::new("rnaseq").unwrap()));
        assert!(used.contains(&TemplateId::new("export").unwrap()));
    }
}
