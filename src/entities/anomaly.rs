//! Anomaly entity type - structured, non-fatal findings about the topology

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entities::component::Component;

/// Stable rule identifiers
pub mod rules {
    pub const PARSE_SENTINEL: &str = "PARSE_SENTINEL";
    pub const MISSING_COORDINATE: &str = "MISSING_COORDINATE";
    pub const INVALID_ROLE: &str = "INVALID_ROLE";
    pub const DUPLICATE_ROLE: &str = "DUPLICATE_ROLE";
    pub const EMPTY_POINTS: &str = "EMPTY_POINTS";
    pub const INCOMPLETE_SPAN: &str = "INCOMPLETE_SPAN";
    pub const BEND_CORNER_INFERRED: &str = "BEND_CORNER_INFERRED";
    pub const BEND_ANGLE_DEGENERATE: &str = "BEND_ANGLE_DEGENERATE";
    pub const RUN_END_INFERRED: &str = "RUN_END_INFERRED";
    pub const RUN_END_AMBIGUOUS: &str = "RUN_END_AMBIGUOUS";
    pub const GASKET_ABSORBED: &str = "GASKET_ABSORBED";
    pub const OVERSIZED_RUN_SUPPRESSED: &str = "OVERSIZED_RUN_SUPPRESSED";
    pub const GAP_BRIDGED: &str = "GAP_BRIDGED";
    pub const FOLD_BACK: &str = "FOLD_BACK";
    pub const DIRECTION_MISMATCH: &str = "DIRECTION_MISMATCH";
    pub const RUN_TOO_LONG: &str = "RUN_TOO_LONG";
    pub const HORIZONTAL_SKEW: &str = "HORIZONTAL_SKEW";
    pub const SKEW_2PLANE_LIMIT: &str = "SKEW_2PLANE_LIMIT";
    pub const SKEW_3PLANE_LIMIT: &str = "SKEW_3PLANE_LIMIT";
    pub const DISCONNECTED: &str = "DISCONNECTED";
    pub const OPEN_END: &str = "OPEN_END";
    pub const SAME_TYPE_OVERLAP: &str = "SAME_TYPE_OVERLAP";
    pub const SEQUENCE_BRIDGED: &str = "SEQUENCE_BRIDGED";
    pub const SEGMENTED: &str = "SEGMENTED";
    pub const UNKNOWN_START: &str = "UNKNOWN_START";
}

/// Anomaly severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!("Invalid severity: {}. Use info, warning or error", s)),
        }
    }
}

/// A structured finding about one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// De-duplication identifier: `RULE:refno[:scope]`
    pub id: String,
    pub severity: Severity,
    pub rule: String,
    /// Implicated component
    pub refno: String,
    /// Originating input position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<usize>,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub detail: BTreeMap<String, String>,
}

impl Anomaly {
    pub fn new(
        severity: Severity,
        rule: &str,
        refno: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let refno = refno.into();
        Self {
            id: format!("{}:{}", rule, refno),
            severity,
            rule: rule.to_string(),
            refno,
            ordinal: None,
            message: message.into(),
            detail: BTreeMap::new(),
        }
    }

    pub fn error(rule: &str, component: &Component, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, rule, component.refno.clone(), message).at(component.ordinal)
    }

    pub fn warning(rule: &str, component: &Component, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule, component.refno.clone(), message).at(component.ordinal)
    }

    pub fn info(rule: &str, component: &Component, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule, component.refno.clone(), message).at(component.ordinal)
    }

    pub fn at(mut self, ordinal: usize) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Narrow the identifier so several findings of one rule can coexist
    pub fn scoped(mut self, scope: impl std::fmt::Display) -> Self {
        self.id = format!("{}:{}:{}", self.rule, self.refno, scope);
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.detail.insert(key.to_string(), value.to_string());
        self
    }
}

/// Accumulates anomalies, suppressing duplicate identifiers
#[derive(Debug, Clone, Default)]
pub struct AnomalyLog {
    entries: Vec<Anomaly>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anomaly; returns false when its identifier was already seen
    pub fn push(&mut self, anomaly: Anomaly) -> bool {
        if !self.seen.insert(anomaly.id.clone()) {
            return false;
        }
        self.entries.push(anomaly);
        true
    }

    pub fn extend(&mut self, anomalies: impl IntoIterator<Item = Anomaly>) {
        for a in anomalies {
            self.push(a);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.entries.iter()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|a| a.severity == severity).count()
    }

    pub fn into_vec(self) -> Vec<Anomaly> {
        self.entries
    }
}

impl FromIterator<Anomaly> for AnomalyLog {
    fn from_iter<I: IntoIterator<Item = Anomaly>>(iter: I) -> Self {
        let mut log = AnomalyLog::new();
        log.extend(iter);
        log
    }
}
