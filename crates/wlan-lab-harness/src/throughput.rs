use serde::Serialize;
use tracing::debug;
use wlan_lab_abstract::config::WINDOW_SECONDS;
use wlan_lab_abstract::{FlowRecord, TrialPlan};

/// Throughput one station received during its measurement window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputSample {
    pub station_index: usize,
    /// Megabits per second.
    pub mbps: f64,
}

/// Convert a byte counter into Mb/s over the fixed 9 s window.
pub fn bytes_to_mbps(bytes: u64) -> f64 {
    bytes as f64 * 8.0 / WINDOW_SECONDS / 1_000_000.0
}

/// Per-station throughput of one trial.
///
/// The result always has one sample per planned station, in station order. Control
/// flows (id 0) and flows to addresses that are not stations are skipped; stations
/// without a flow get 0.
pub fn extract(plan: &TrialPlan, records: &[FlowRecord]) -> Vec<ThroughputSample> {
    let mut received = vec![0u64; plan.station_count()];
    for record in records {
        if record.is_control() {
            continue;
        }
        debug!(
            "Flow {} ({} -> {})",
            record.flow_id, record.source, record.destination
        );
        match plan.station_position(record.destination) {
            Some(position) => received[position] += record.received_bytes,
            None => debug!("flow {} does not end at a station", record.flow_id),
        }
    }

    received
        .into_iter()
        .enumerate()
        .map(|(station_index, bytes)| ThroughputSample {
            station_index,
            mbps: bytes_to_mbps(bytes),
        })
        .collect()
}

pub fn values(samples: &[ThroughputSample]) -> Vec<f64> {
    samples.iter().map(|s| s.mbps).collect()
}
