//! Pipeline orchestrator
//!
//! Builds point models, runs the stages for the selected processing mode,
//! and sequences the result:
//!
//! - **strict**: overlap resolution without gap filling
//! - **repair**: resolution with gap filling, then a relaxed second pass
//!   while disconnections remain (when multi-pass is on)
//! - **sequential**: resolution without gap filling, then the sequential
//!   snapper and the segmentizer
//!
//! Each pass gets its own `Settings` value; the configured one is never
//! changed. Anomalies from all passes are merged and de-duplicated.

use tracing::{debug, info, info_span};

use crate::core::config::{ConfigError, ProcessingMode, Settings};
use crate::core::point_model::{build_all, complete_bends};
use crate::core::refno::RefnoAllocator;
use crate::core::resolve::{check_continuity, check_same_type_overlaps, resolve_with};
use crate::core::segment::segmentize_with;
use crate::core::sequencer::sequence_with;
use crate::core::snapper::snap_with;
use crate::entities::anomaly::{rules, Anomaly, AnomalyLog, Severity};
use crate::entities::component::Component;

/// Everything one orchestrated run produces
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub components: Vec<Component>,
    pub anomalies: Vec<Anomaly>,
    /// Refnos in proximity-sequenced order
    pub order: Vec<String>,
    /// Whether the relaxed second repair pass ran
    pub second_pass: bool,
}

impl PipelineOutcome {
    pub fn count(&self, severity: Severity) -> usize {
        self.anomalies.iter().filter(|a| a.severity == severity).count()
    }

    /// Highest severity present, if any anomaly was raised
    pub fn worst(&self) -> Option<Severity> {
        self.anomalies.iter().map(|a| a.severity).max()
    }
}

/// Runs the full reconstruction for one component collection
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
}

/// Continuity findings are recomputed by later passes
fn is_continuity(anomaly: &Anomaly) -> bool {
    anomaly.rule == rules::DISCONNECTED || anomaly.rule == rules::OPEN_END
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run(&self, mut components: Vec<Component>) -> PipelineOutcome {
        let span = info_span!("pipeline", mode = %self.settings.mode);
        let _guard = span.enter();

        let mut log = AnomalyLog::new();
        log.extend(build_all(&mut components, &self.settings));
        log.extend(complete_bends(&mut components, &self.settings));

        let mut alloc = RefnoAllocator::from_components(&components);
        let mut second_pass = false;
        let components = match self.settings.mode {
            ProcessingMode::Strict => {
                let resolved = resolve_with(components, &self.settings.for_pass(false), &mut alloc);
                log.extend(resolved.anomalies);
                resolved.components
            }
            ProcessingMode::Repair => {
                let (components, relaxed) = self.repair(components, &mut alloc, &mut log);
                second_pass = relaxed;
                components
            }
            ProcessingMode::Sequential => self.sequential(components, &mut alloc, &mut log),
        };

        let sequencing = sequence_with(
            &components,
            self.settings.start_refno.as_deref(),
            self.settings.continuity_tolerance,
            &self.settings.sequencer,
        );
        debug!(restarts = sequencing.restarts, "sequenced components");
        log.extend(sequencing.anomalies);

        info!(
            components = components.len(),
            anomalies = log.len(),
            errors = log.count(Severity::Error),
            "pipeline finished"
        );
        PipelineOutcome {
            components,
            anomalies: log.into_vec(),
            order: sequencing.order,
            second_pass,
        }
    }

    fn repair(
        &self,
        components: Vec<Component>,
        alloc: &mut RefnoAllocator,
        log: &mut AnomalyLog,
    ) -> (Vec<Component>, bool) {
        let first = resolve_with(
            components,
            &self.settings.for_pass(self.settings.gap_fill),
            alloc,
        );
        let gaps_remain = first.anomalies.iter().any(|a| a.rule == rules::DISCONNECTED);
        if !self.settings.multi_pass || !gaps_remain {
            log.extend(first.anomalies);
            return (first.components, false);
        }

        let relaxed = self.settings.relaxed_second_pass();
        info!(
            tolerance = relaxed.continuity_tolerance,
            "disconnections remain; running relaxed second pass"
        );
        log.extend(first.anomalies.into_iter().filter(|a| !is_continuity(a)));
        let second = resolve_with(first.components, &relaxed, alloc);
        log.extend(second.anomalies);
        (second.components, true)
    }

    /// Resolve, then snap in the resolver's order
    ///
    /// Input is put in ordinal order first; the resolver keeps each run's
    /// occupants between its sub-runs, so the snapper can trust that order.
    fn sequential(
        &self,
        mut components: Vec<Component>,
        alloc: &mut RefnoAllocator,
        log: &mut AnomalyLog,
    ) -> Vec<Component> {
        components.sort_by_key(|c| c.ordinal);
        let resolved = resolve_with(components, &self.settings.for_pass(false), alloc);
        log.extend(resolved.anomalies.into_iter().filter(|a| !is_continuity(a)));

        let snapped = snap_with(resolved.components, self.settings.continuity_tolerance, alloc);
        log.extend(snapped.anomalies);

        let segmented = segmentize_with(snapped.components, self.settings.max_segment_length, alloc);
        log.extend(segmented.anomalies);

        check_continuity(&segmented.components, &self.settings, log);
        check_same_type_overlaps(&segmented.components, &self.settings, log);
        segmented.components
    }
}
