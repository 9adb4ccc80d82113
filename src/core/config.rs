//! Resolution settings and layered configuration loading
//!
//! `Settings` is immutable once handed to the engine. A pass that needs
//! different tolerances builds a new value with `for_pass` or
//! `relaxed_second_pass`.
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config: `<config dir>/pcfr/settings.yaml`
//! 3. Project config: `./pcfr.yaml`
//! 4. Explicit `--config` file
//!
//! Layers are merged key by key, so each file may set any subset.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use thiserror::Error;

use crate::core::direction::DEFAULT_SKEW_THRESHOLD;

/// Project-local settings file name
pub const PROJECT_CONFIG_FILE: &str = "pcfr.yaml";

/// Processing mode selected by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ProcessingMode {
    /// Trust coordinates exactly; no gap filling
    Strict,
    /// Gap filling enabled, optional relaxed second pass
    #[default]
    Repair,
    /// Input is in physical order: snap, bridge and segmentize
    Sequential,
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Strict => write!(f, "strict"),
            ProcessingMode::Repair => write!(f, "repair"),
            ProcessingMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// Fallback values for missing design attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignDefaults {
    pub radius: Option<f64>,
    pub wall_thickness: Option<f64>,
    pub corrosion_allowance: Option<f64>,
    pub insulation_thickness: Option<f64>,
    pub weight_per_length: Option<f64>,
    pub pressure: Option<f64>,
    pub hydro_pressure: Option<f64>,
    /// Used only when the material field is completely absent
    pub material: String,
}

impl Default for DesignDefaults {
    fn default() -> Self {
        Self {
            radius: None,
            wall_thickness: None,
            corrosion_allowance: Some(3.0),
            insulation_thickness: None,
            weight_per_length: None,
            pressure: None,
            hydro_pressure: None,
            material: "A106-B".to_string(),
        }
    }
}

/// Proximity sequencer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerSettings {
    /// Distance multiplier for misaligned candidates beyond tolerance
    pub penalty: f64,
    /// Minimum dot product counted as aligned with the exit direction
    pub alignment: f64,
    /// Longest hop before the chain restarts
    pub max_hop: f64,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            penalty: 10.0,
            alignment: 0.9,
            max_hop: 15_000.0,
        }
    }
}

/// Configuration threaded through every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Endpoints closer than this coincide (mm)
    pub continuity_tolerance: f64,
    /// Bores within this are compatible (mm)
    pub bore_tolerance: f64,
    /// Shortest sub-run or bridge worth creating (mm)
    pub min_pipe_length: f64,
    /// Smallest bore eligible for splitting and gap filling (mm)
    pub min_split_bore: f64,
    /// Longest acceptable connection (mm)
    pub max_run_length: f64,
    /// Two-plane skew beyond this is an error (mm)
    pub skew_2plane_limit: f64,
    /// Three-plane skew beyond this is a warning (mm)
    pub skew_3plane_limit: f64,
    /// Longest accepted non-aligned diagonal gap (mm)
    pub max_diagonal_gap: f64,
    /// Per-axis displacement counted as travel on that axis (mm)
    pub skew_threshold: f64,
    /// Consecutive directions with a dot product below this fold back
    pub rollback_dot_threshold: f64,
    /// Same-type overlap beyond this is an error (mm)
    pub max_overlap: f64,
    /// Longest fabricated run before segmentation (mm)
    pub max_segment_length: f64,
    /// Pre-existing runs longer than this may be suppressed as artifacts (mm)
    pub oversized_run_length: f64,
    pub gasket_min_length: f64,
    pub gasket_max_length: f64,
    pub mode: ProcessingMode,
    /// Run a relaxed second pass when repair leaves gaps
    pub multi_pass: bool,
    /// Bridge sequence-adjacent gaps during resolution
    pub gap_fill: bool,
    /// Let supports with two endpoints take part in gap filling
    pub bridge_supports: bool,
    /// Refno the proximity sequencer starts from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_refno: Option<String>,
    pub sequencer: SequencerSettings,
    pub defaults: DesignDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            continuity_tolerance: 6.0,
            bore_tolerance: 1.0,
            min_pipe_length: 10.0,
            min_split_bore: 0.0,
            max_run_length: 20_000.0,
            skew_2plane_limit: 2_000.0,
            skew_3plane_limit: 3_000.0,
            max_diagonal_gap: 50.0,
            skew_threshold: DEFAULT_SKEW_THRESHOLD,
            rollback_dot_threshold: -0.99,
            max_overlap: 25.0,
            max_segment_length: 13_100.0,
            oversized_run_length: 5_000.0,
            gasket_min_length: 0.1,
            gasket_max_length: 20.0,
            mode: ProcessingMode::default(),
            multi_pass: true,
            gap_fill: true,
            bridge_supports: true,
            start_refno: None,
            sequencer: SequencerSettings::default(),
            defaults: DesignDefaults::default(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    #[diagnostic(code(pcfr::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in config file {path}: {message}")]
    #[diagnostic(
        code(pcfr::config::syntax),
        help("Config files are YAML mappings, e.g. `continuity_tolerance: 6.0`")
    )]
    Syntax { path: PathBuf, message: String },

    #[error("Invalid setting `{field}`: {reason}")]
    #[diagnostic(code(pcfr::config::invalid))]
    Invalid { field: &'static str, reason: String },
}

impl Settings {
    /// Load defaults merged with the user, project and explicit config files
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                layers.push(path);
            }
        }
        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        if project.exists() {
            layers.push(project);
        }
        if let Some(path) = explicit {
            layers.push(path.to_path_buf());
        }
        Self::from_layers(&layers)
    }

    /// Merge the given files over the defaults, in order
    pub fn from_layers(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = serde_yml::to_value(Settings::default()).map_err(|e| {
            ConfigError::Syntax {
                path: PathBuf::from("<defaults>"),
                message: e.to_string(),
            }
        })?;

        for path in paths {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let layer: Value = serde_yml::from_str(&content).map_err(|e| ConfigError::Syntax {
                path: path.clone(),
                message: e.to_string(),
            })?;
            merge_values(&mut merged, layer);
        }

        let settings: Settings = serde_yml::from_value(merged).map_err(|e| ConfigError::Syntax {
            path: paths.last().cloned().unwrap_or_default(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// `<config dir>/pcfr/settings.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pcfr").map(|dirs| dirs.config_dir().join("settings.yaml"))
    }

    /// Reject negative tolerances and non-positive lengths
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative: [(&'static str, f64); 9] = [
            ("continuity_tolerance", self.continuity_tolerance),
            ("bore_tolerance", self.bore_tolerance),
            ("min_pipe_length", self.min_pipe_length),
            ("min_split_bore", self.min_split_bore),
            ("max_diagonal_gap", self.max_diagonal_gap),
            ("skew_threshold", self.skew_threshold),
            ("max_overlap", self.max_overlap),
            ("gasket_min_length", self.gasket_min_length),
            ("sequencer.penalty", self.sequencer.penalty),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number, got {}", value),
                });
            }
        }

        let positive: [(&'static str, f64); 6] = [
            ("max_run_length", self.max_run_length),
            ("skew_2plane_limit", self.skew_2plane_limit),
            ("skew_3plane_limit", self.skew_3plane_limit),
            ("max_segment_length", self.max_segment_length),
            ("oversized_run_length", self.oversized_run_length),
            ("sequencer.max_hop", self.sequencer.max_hop),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be greater than zero, got {}", value),
                });
            }
        }

        if self.gasket_max_length < self.gasket_min_length {
            return Err(ConfigError::Invalid {
                field: "gasket_max_length",
                reason: "must not be below gasket_min_length".to_string(),
            });
        }
        if !(-1.0..=1.0).contains(&self.rollback_dot_threshold) {
            return Err(ConfigError::Invalid {
                field: "rollback_dot_threshold",
                reason: "must lie in [-1, 1]".to_string(),
            });
        }
        if !(-1.0..=1.0).contains(&self.sequencer.alignment) {
            return Err(ConfigError::Invalid {
                field: "sequencer.alignment",
                reason: "must lie in [-1, 1]".to_string(),
            });
        }
        Ok(())
    }

    /// Variant with gap filling switched on or off
    pub fn for_pass(&self, gap_fill: bool) -> Settings {
        Settings {
            gap_fill,
            ..self.clone()
        }
    }

    /// Second repair pass: 5x tolerance, 1 mm minimum pipe, supports excluded from bridging
    pub fn relaxed_second_pass(&self) -> Settings {
        Settings {
            continuity_tolerance: self.continuity_tolerance * 5.0,
            min_pipe_length: 1.0,
            bridge_supports: false,
            gap_fill: true,
            ..self.clone()
        }
    }
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}
