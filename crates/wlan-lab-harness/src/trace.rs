use serde::Serialize;
use wlan_lab_abstract::ScenarioConfig;

use crate::plot::PlotDescriptor;
use crate::throughput::ThroughputSample;

#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub config: ScenarioConfig,
    pub samples: Vec<ThroughputSample>,
}

/// Everything one completed sweep produced.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub engine: String,
    pub trials: Vec<TrialRecord>,
    pub plot: PlotDescriptor,
}

impl SweepReport {
    pub fn point_count(&self) -> usize {
        self.plot.datasets.iter().map(|d| d.len()).sum()
    }
}

/// Reports of every sweep that completed in one harness run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarnessReport {
    pub sweeps: Vec<SweepReport>,
}
