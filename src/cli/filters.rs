//! Filter enums for CLI commands

use clap::ValueEnum;

use crate::entities::anomaly::{Anomaly, Severity};

/// Minimum severity for listing anomalies or failing a run
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum SeverityFilter {
    /// Everything
    #[default]
    Info,
    /// Warnings and errors
    Warning,
    /// Errors only
    Error,
}

impl SeverityFilter {
    pub fn threshold(&self) -> Severity {
        match self {
            SeverityFilter::Info => Severity::Info,
            SeverityFilter::Warning => Severity::Warning,
            SeverityFilter::Error => Severity::Error,
        }
    }

    /// Check if an anomaly is at or above this level
    pub fn matches(&self, anomaly: &Anomaly) -> bool {
        anomaly.severity >= self.threshold()
    }
}

impl std::fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.threshold())
    }
}
