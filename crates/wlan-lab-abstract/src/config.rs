use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::error::HarnessError;
use crate::interface::{StationPlan, TrialPlan};
use crate::rate::DataRate;
use crate::variant::Variant;

/// Start of station 0's traffic and measurement window, in seconds.
pub const WINDOW_START: f64 = 1.0;
/// End of station 0's traffic and measurement window, in seconds.
pub const WINDOW_END: f64 = 10.0;
/// Throughput denominator for every station of every trial.
pub const WINDOW_SECONDS: f64 = 9.0;
/// Per-station shift of the traffic window.
pub const STATION_STAGGER: f64 = 0.1;
/// Absolute stop time; later than the last staggered stop of the largest sweep.
pub const STOP_TIME: f64 = 12.2;

pub const DEFAULT_PACKET_SIZE: u32 = 1400;
pub const BACKBONE_DELAY_MS: u32 = 2;
/// Largest station count whose last staggered window still ends before [`STOP_TIME`].
pub const MAX_STATIONS: u32 = 22;

/// Traffic window of one station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementWindow {
    pub start: f64,
    pub stop: f64,
}

impl MeasurementWindow {
    pub fn for_station(index: usize) -> Self {
        let offset = STATION_STAGGER * index as f64;
        Self {
            start: WINDOW_START + offset,
            stop: WINDOW_END + offset,
        }
    }
}

/// Parameters of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub backbone_rate: DataRate,
    pub station_count: u32,
    pub packet_size: u32,
    /// Offered rate of station 0 in streamer variants.
    pub streaming_rate: Option<DataRate>,
    /// Raw variant code; resolved when the trial is installed.
    pub variant: u8,
}

impl ScenarioConfig {
    pub fn new(backbone_rate: DataRate, station_count: u32, variant: u8) -> Self {
        Self {
            backbone_rate,
            station_count,
            packet_size: DEFAULT_PACKET_SIZE,
            streaming_rate: None,
            variant,
        }
    }

    pub fn with_packet_size(mut self, packet_size: u32) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn with_streaming_rate(mut self, rate: DataRate) -> Self {
        self.streaming_rate = Some(rate);
        self
    }

    pub fn variant(&self) -> Result<Variant, HarnessError> {
        Variant::from_code(self.variant)
    }

    /// Resolve the variant policy into the plan an engine installs.
    pub fn plan(&self) -> Result<TrialPlan, HarnessError> {
        let variant = self.variant()?;
        if self.station_count == 0 || self.station_count > MAX_STATIONS {
            return Err(HarnessError::InvalidStationCount(self.station_count));
        }

        let stations = (0..self.station_count as usize)
            .map(|index| {
                let window = MeasurementWindow::for_station(index);
                Ok(StationPlan {
                    index,
                    address: station_address(index),
                    offered_rate: variant.rate_for_station(index, self.streaming_rate)?,
                    start: window.start,
                    stop: window.stop,
                })
            })
            .collect::<Result<Vec<_>, HarnessError>>()?;

        Ok(TrialPlan {
            backbone_rate: self.backbone_rate,
            backbone_delay_ms: BACKBONE_DELAY_MS,
            packet_size: self.packet_size,
            rts_cts_threshold: variant.rts_cts_threshold(),
            stations,
            stop_time: STOP_TIME,
        })
    }
}

/// Wifi interfaces are numbered from 10.1.3.1 in station order.
pub fn station_address(index: usize) -> Ipv4Addr {
    Ipv4Addr::new(10, 1, 3, (index + 1) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn station_windows_are_staggered() {
        for index in 0..20 {
            let window = MeasurementWindow::for_station(index);
            assert!(close(window.start, 1.0 + 0.1 * index as f64));
            assert!(close(window.stop, 10.0 + 0.1 * index as f64));
            assert!(close(window.stop - window.start, WINDOW_SECONDS));
        }
    }

    #[test]
    fn stop_time_covers_every_station() {
        let last = MeasurementWindow::for_station(MAX_STATIONS as usize - 1);
        assert!(last.stop < STOP_TIME);
    }

    #[test]
    fn station_count_is_bounded_by_stop_time() {
        let largest = ScenarioConfig::new(DataRate::from_mbps(11), MAX_STATIONS, 1);
        let plan = largest.plan().unwrap();
        assert_eq!(plan.station_count(), 22);
        assert!(plan.stations.iter().all(|s| s.stop < plan.stop_time));

        let too_many = ScenarioConfig::new(DataRate::from_mbps(11), MAX_STATIONS + 1, 1);
        assert!(matches!(
            too_many.plan(),
            Err(HarnessError::InvalidStationCount(23))
        ));
        let far_too_many = ScenarioConfig::new(DataRate::from_mbps(11), 30, 1);
        assert!(matches!(
            far_too_many.plan(),
            Err(HarnessError::InvalidStationCount(30))
        ));
    }

    #[test]
    fn plan_resolves_streamer_variant() {
        let config = ScenarioConfig::new(DataRate::from_mbps(11), 5, 4)
            .with_streaming_rate(DataRate::from_mbps(2));
        let plan = config.plan().unwrap();
        assert_eq!(plan.station_count(), 5);
        assert_eq!(plan.rts_cts_threshold, 100);
        assert!(plan.rts_cts_active());
        assert_eq!(plan.stations[0].offered_rate, DataRate::from_mbps(2));
        assert_eq!(plan.stations[4].offered_rate, DataRate::from_kbps(448));
        assert_eq!(plan.stations[2].address, Ipv4Addr::new(10, 1, 3, 3));
        assert!(close(plan.stations[3].start, 1.3));
        assert!(close(plan.stop_time, 12.2));
    }

    #[test]
    fn plan_rejects_bad_inputs() {
        let bad_variant = ScenarioConfig::new(DataRate::from_mbps(11), 3, 9);
        assert!(matches!(bad_variant.plan(), Err(HarnessError::InvalidVariant(9))));

        let no_stations = ScenarioConfig::new(DataRate::from_mbps(11), 0, 2);
        assert!(matches!(
            no_stations.plan(),
            Err(HarnessError::InvalidStationCount(0))
        ));

        let no_stream = ScenarioConfig::new(DataRate::from_mbps(11), 5, 5);
        assert!(matches!(
            no_stream.plan(),
            Err(HarnessError::MissingStreamingRate(5))
        ));
    }
}
