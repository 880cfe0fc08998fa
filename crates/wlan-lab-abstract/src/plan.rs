use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PACKET_SIZE;
use crate::rate::DataRate;

const SWEEP_BACKBONE_RATE: DataRate = DataRate::from_mbps(11);

/// Average throughput against backbone data rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackboneSweep {
    pub start_kbps: u64,
    pub step_kbps: u64,
    pub steps: u32,
    pub station_count: u32,
    pub packet_size: u32,
    pub variant: u8,
}

impl Default for BackboneSweep {
    fn default() -> Self {
        Self {
            start_kbps: 1,
            step_kbps: 100,
            steps: 20,
            station_count: 3,
            packet_size: DEFAULT_PACKET_SIZE,
            variant: 1,
        }
    }
}

/// Average and total throughput against number of saturating stations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSweep {
    pub max_stations: u32,
    pub backbone_rate: DataRate,
    pub packet_size: u32,
    pub rts_cts_variant: u8,
    pub no_rts_cts_variant: u8,
}

impl Default for StationSweep {
    fn default() -> Self {
        Self {
            max_stations: 20,
            backbone_rate: SWEEP_BACKBONE_RATE,
            packet_size: DEFAULT_PACKET_SIZE,
            rts_cts_variant: 2,
            no_rts_cts_variant: 3,
        }
    }
}

/// Throughput of low-rate stations sharing the channel with one streamer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamerSweep {
    pub streaming_rates: Vec<DataRate>,
    pub station_count: u32,
    pub backbone_rate: DataRate,
    pub packet_size: u32,
    pub rts_cts_variant: u8,
    pub no_rts_cts_variant: u8,
}

impl Default for StreamerSweep {
    fn default() -> Self {
        Self {
            streaming_rates: (1..=5).map(DataRate::from_mbps).collect(),
            station_count: 5,
            backbone_rate: SWEEP_BACKBONE_RATE,
            packet_size: DEFAULT_PACKET_SIZE,
            rts_cts_variant: 4,
            no_rts_cts_variant: 5,
        }
    }
}

/// Plan file contents. Every table and field is optional.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct HarnessPlan {
    pub backbone: Option<BackboneSweepOverride>,
    pub stations: Option<StationSweepOverride>,
    pub streamer: Option<StreamerSweepOverride>,
}

impl HarnessPlan {
    pub fn backbone_sweep(&self) -> BackboneSweep {
        let mut sweep = BackboneSweep::default();
        if let Some(over) = &self.backbone {
            over.apply_to(&mut sweep);
        }
        sweep
    }

    pub fn station_sweep(&self) -> StationSweep {
        let mut sweep = StationSweep::default();
        if let Some(over) = &self.stations {
            over.apply_to(&mut sweep);
        }
        sweep
    }

    pub fn streamer_sweep(&self) -> StreamerSweep {
        let mut sweep = StreamerSweep::default();
        if let Some(over) = &self.streamer {
            over.apply_to(&mut sweep);
        }
        sweep
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BackboneSweepOverride {
    pub start_kbps: Option<u64>,
    pub step_kbps: Option<u64>,
    pub steps: Option<u32>,
    pub station_count: Option<u32>,
    pub packet_size: Option<u32>,
    pub variant: Option<u8>,
}

impl BackboneSweepOverride {
    pub fn apply_to(&self, sweep: &mut BackboneSweep) {
        if let Some(v) = self.start_kbps {
            sweep.start_kbps = v;
        }
        if let Some(v) = self.step_kbps {
            sweep.step_kbps = v;
        }
        if let Some(v) = self.steps {
            sweep.steps = v;
        }
        if let Some(v) = self.station_count {
            sweep.station_count = v;
        }
        if let Some(v) = self.packet_size {
            sweep.packet_size = v;
        }
        if let Some(v) = self.variant {
            sweep.variant = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StationSweepOverride {
    pub max_stations: Option<u32>,
    pub backbone_rate: Option<DataRate>,
    pub packet_size: Option<u32>,
    pub rts_cts_variant: Option<u8>,
    pub no_rts_cts_variant: Option<u8>,
}

impl StationSweepOverride {
    pub fn apply_to(&self, sweep: &mut StationSweep) {
        if let Some(v) = self.max_stations {
            sweep.max_stations = v;
        }
        if let Some(v) = self.backbone_rate {
            sweep.backbone_rate = v;
        }
        if let Some(v) = self.packet_size {
            sweep.packet_size = v;
        }
        if let Some(v) = self.rts_cts_variant {
            sweep.rts_cts_variant = v;
        }
        if let Some(v) = self.no_rts_cts_variant {
            sweep.no_rts_cts_variant = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StreamerSweepOverride {
    pub streaming_rates: Option<Vec<DataRate>>,
    pub station_count: Option<u32>,
    pub backbone_rate: Option<DataRate>,
    pub packet_size: Option<u32>,
    pub rts_cts_variant: Option<u8>,
    pub no_rts_cts_variant: Option<u8>,
}

impl StreamerSweepOverride {
    pub fn apply_to(&self, sweep: &mut StreamerSweep) {
        if let Some(v) = &self.streaming_rates {
            sweep.streaming_rates = v.clone();
        }
        if let Some(v) = self.station_count {
            sweep.station_count = v;
        }
        if let Some(v) = self.backbone_rate {
            sweep.backbone_rate = v;
        }
        if let Some(v) = self.packet_size {
            sweep.packet_size = v;
        }
        if let Some(v) = self.rts_cts_variant {
            sweep.rts_cts_variant = v;
        }
        if let Some(v) = self.no_rts_cts_variant {
            sweep.no_rts_cts_variant = v;
        }
    }
}
