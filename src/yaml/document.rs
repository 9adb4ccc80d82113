//! Component documents: the input and output files of the CLI
//!
//! Input is YAML (or JSON, by extension) with a top-level `components` list.
//! Output carries the resolved components, the anomalies and the sequenced
//! order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::pipeline::PipelineOutcome;
use crate::entities::anomaly::{Anomaly, Severity};
use crate::entities::component::Component;
use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};
use crate::yaml::parser::parse_yaml;

/// Errors while reading or writing component documents
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("failed to read {path}")]
    #[diagnostic(code(pcfr::document::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] YamlError),

    #[error("failed to write {path}")]
    #[diagnostic(code(pcfr::document::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize output: {0}")]
    #[diagnostic(code(pcfr::document::serialize))]
    Serialize(String),

    #[error("duplicate refno '{refno}'")]
    #[diagnostic(
        code(pcfr::document::duplicate_refno),
        help("every component in one document needs its own refno")
    )]
    DuplicateRefno { refno: String },
}

/// On-disk representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Input document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDocument {
    /// Pipeline reference applied to components that carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,

    #[serde(default)]
    pub components: Vec<Component>,
}

impl ComponentDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string(), DocumentFormat::from_path(path))
    }

    pub fn parse(content: &str, filename: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        let doc: ComponentDocument = match format {
            DocumentFormat::Yaml => parse_yaml(content, filename)?,
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| {
                YamlError::Syntax(YamlSyntaxError::from_json_error(&e, content, filename))
            })?,
        };

        let mut seen = HashSet::new();
        for component in &doc.components {
            if !seen.insert(component.refno.as_str()) {
                return Err(DocumentError::DuplicateRefno {
                    refno: component.refno.clone(),
                });
            }
        }
        Ok(doc)
    }

    /// Components ready for the pipeline
    ///
    /// When no component states an ordinal, document order is used.
    pub fn into_components(self) -> Vec<Component> {
        let number = self.components.iter().all(|c| c.ordinal == 0);
        let pipeline = self.pipeline;
        self.components
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                if number {
                    c.ordinal = i;
                }
                if c.pipeline_ref.is_none() {
                    c.pipeline_ref = pipeline.clone();
                }
                c
            })
            .collect()
    }
}

/// Counts shown at the top of an output document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mode: String,
    pub components: usize,
    pub synthetic: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    #[serde(default)]
    pub second_pass: bool,
}

/// Output document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    pub summary: Summary,
    pub components: Vec<Component>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default)]
    pub order: Vec<String>,
}

impl ResolvedDocument {
    /// Wrap a pipeline outcome; `mode` labels the summary
    pub fn from_outcome(outcome: PipelineOutcome, mode: impl std::fmt::Display) -> Self {
        let summary = Summary {
            mode: mode.to_string(),
            components: outcome.components.len(),
            synthetic: outcome
                .components
                .iter()
                .filter(|c| c.provenance.is_synthetic())
                .count(),
            errors: outcome.count(Severity::Error),
            warnings: outcome.count(Severity::Warning),
            infos: outcome.count(Severity::Info),
            second_pass: outcome.second_pass,
        };
        Self {
            summary,
            components: outcome.components,
            anomalies: outcome.anomalies,
            order: outcome.order,
        }
    }

    pub fn render(&self, format: DocumentFormat) -> Result<String, DocumentError> {
        match format {
            DocumentFormat::Yaml => {
                serde_yml::to_string(self).map_err(|e| DocumentError::Serialize(e.to_string()))
            }
            DocumentFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| DocumentError::Serialize(e.to_string())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let content = self.render(DocumentFormat::from_path(path))?;
        std::fs::write(path, content).map_err(|source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
