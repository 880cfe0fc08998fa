use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::error::EngineError;
use crate::flow::FlowRecord;
use crate::rate::DataRate;

/// Traffic installed for one wireless station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPlan {
    pub index: usize,
    /// Address of the station's wifi interface; flows are attributed by destination.
    pub address: Ipv4Addr,
    pub offered_rate: DataRate,
    /// Application start, in seconds of simulated time.
    pub start: f64,
    /// Application stop, in seconds of simulated time.
    pub stop: f64,
}

/// Everything an engine needs to run one trial.
///
/// The plan is complete before the engine runs; engines never receive parameter
/// changes mid-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialPlan {
    pub backbone_rate: DataRate,
    pub backbone_delay_ms: u32,
    /// UDP payload size in bytes.
    pub packet_size: u32,
    pub rts_cts_threshold: u32,
    pub stations: Vec<StationPlan>,
    /// Absolute simulated time at which the run ends.
    pub stop_time: f64,
}

impl TrialPlan {
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn rts_cts_active(&self) -> bool {
        self.packet_size > self.rts_cts_threshold
    }

    /// Position of the station whose wifi interface has `address`.
    pub fn station_position(&self, address: Ipv4Addr) -> Option<usize> {
        self.stations.iter().position(|s| s.address == address)
    }
}

/// The packet-level simulator the harness drives.
///
/// An engine holds global simulation state, so at most one context is live at a time.
/// A trial is `acquire` -> `install` -> `run_until` -> `release`; callers must release on
/// every path once `acquire` succeeded.
pub trait SimulationEngine {
    /// Short identifier used in logs and traces.
    fn name(&self) -> &str;

    /// Create a fresh simulation context.
    fn acquire(&mut self) -> Result<(), EngineError>;

    /// Build topology, attributes and applications for a trial.
    fn install(&mut self, plan: &TrialPlan) -> Result<(), EngineError>;

    /// Advance to `stop_time` and return the flow monitor counters.
    fn run_until(&mut self, stop_time: f64) -> Result<Vec<FlowRecord>, EngineError>;

    /// Destroy the context. Must be safe to call after a failed `install` or `run_until`.
    fn release(&mut self);
}
