use std::net::Ipv4Addr;
use tracing::debug;
use wlan_lab_abstract::{
    DataRate, EngineError, FlowRecord, SimulationEngine, StationPlan, TrialPlan,
};

/// Address of the backbone host that sources every downstream flow.
const BACKBONE_HOST: Ipv4Addr = Ipv4Addr::new(10, 1, 1, 2);

const PLCP_PREAMBLE_US: f64 = 192.0;
const SLOT_US: f64 = 20.0;
const SIFS_US: f64 = 10.0;
const DIFS_US: f64 = 50.0;
const UDP_IP_HEADER_BYTES: u32 = 28;
const PPP_HEADER_BYTES: u32 = 2;
const MAC_HEADER_BYTES: u32 = 36;
const ACK_BYTES: u32 = 14;
const RTS_BYTES: u32 = 20;
const CTS_BYTES: u32 = 14;

/// Channel parameters of the fluid model.
#[derive(Debug, Clone)]
pub struct FluidConfig {
    /// Rate used for data frames.
    pub phy_rate: DataRate,
    /// Rate used for control frames (ACK, RTS, CTS).
    pub basic_rate: DataRate,
    pub cw_min: u32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            phy_rate: DataRate::from_mbps(11),
            basic_rate: DataRate::from_mbps(1),
            cw_min: 31,
        }
    }
}

#[derive(Default)]
struct FluidContext {
    plan: Option<TrialPlan>,
}

/// Deterministic capacity model of the access-point topology.
///
/// Every flow runs backbone host -> access point -> station, so the access point is the
/// only data transmitter on the wireless channel and there are no data collisions. The
/// bottleneck is the smaller of backbone goodput and channel goodput; it is shared among
/// the stations by max-min fairness over their offered rates.
pub struct FluidEngine {
    config: FluidConfig,
    context: Option<FluidContext>,
    trials: u64,
}

impl FluidEngine {
    pub fn new(config: FluidConfig) -> Self {
        Self {
            config,
            context: None,
            trials: 0,
        }
    }

    fn airtime_us(&self, bytes: u32, rate: DataRate) -> f64 {
        PLCP_PREAMBLE_US + f64::from(bytes) * 8.0 / rate.mbps()
    }

    /// Application-level bits per second the channel carries for one packet size.
    pub fn channel_goodput(&self, packet_size: u32, rts_cts: bool) -> f64 {
        let frame = packet_size + UDP_IP_HEADER_BYTES + MAC_HEADER_BYTES;
        let backoff = f64::from(self.config.cw_min) / 2.0 * SLOT_US;
        let mut exchange = DIFS_US
            + backoff
            + self.airtime_us(frame, self.config.phy_rate)
            + SIFS_US
            + self.airtime_us(ACK_BYTES, self.config.basic_rate);
        if rts_cts {
            exchange += self.airtime_us(RTS_BYTES, self.config.basic_rate)
                + SIFS_US
                + self.airtime_us(CTS_BYTES, self.config.basic_rate)
                + SIFS_US;
        }
        f64::from(packet_size) * 8.0 / exchange * 1e6
    }

    /// Application-level bits per second the point-to-point backbone carries.
    pub fn backbone_goodput(&self, plan: &TrialPlan) -> f64 {
        let payload = f64::from(plan.packet_size);
        let on_wire = f64::from(plan.packet_size + UDP_IP_HEADER_BYTES + PPP_HEADER_BYTES);
        plan.backbone_rate.bps() as f64 * payload / on_wire
    }

    fn simulate(&self, plan: &TrialPlan, stop_time: f64) -> Vec<FlowRecord> {
        let capacity = self
            .backbone_goodput(plan)
            .min(self.channel_goodput(plan.packet_size, plan.rts_cts_active()));
        let demands: Vec<f64> = plan
            .stations
            .iter()
            .map(|s| s.offered_rate.bps() as f64)
            .collect();
        let shares = max_min_share(&demands, capacity);
        debug!(
            "fluid capacity {:.0} bps shared by {} stations",
            capacity,
            demands.len()
        );

        plan.stations
            .iter()
            .zip(shares)
            .enumerate()
            .map(|(i, (station, share))| FlowRecord {
                flow_id: (i + 1) as u32,
                source: BACKBONE_HOST,
                destination: station.address,
                received_bytes: received_bytes(station, share, stop_time),
            })
            .collect()
    }
}

fn received_bytes(station: &StationPlan, share_bps: f64, stop_time: f64) -> u64 {
    let active = (station.stop.min(stop_time) - station.start).max(0.0);
    (share_bps * active / 8.0).round() as u64
}

/// Water-filling allocation of `capacity` over `demands`, preserving input order.
pub fn max_min_share(demands: &[f64], capacity: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..demands.len()).collect();
    order.sort_by(|&a, &b| demands[a].total_cmp(&demands[b]));

    let mut shares = vec![0.0; demands.len()];
    let mut remaining = capacity.max(0.0);
    for (served, &idx) in order.iter().enumerate() {
        let fair = remaining / (order.len() - served) as f64;
        let share = demands[idx].max(0.0).min(fair);
        shares[idx] = share;
        remaining -= share;
    }
    shares
}

impl SimulationEngine for FluidEngine {
    fn name(&self) -> &str {
        "fluid"
    }

    fn acquire(&mut self) -> Result<(), EngineError> {
        if self.context.is_some() {
            return Err(EngineError::AlreadyAcquired);
        }
        self.context = Some(FluidContext::default());
        Ok(())
    }

    fn install(&mut self, plan: &TrialPlan) -> Result<(), EngineError> {
        let context = self.context.as_mut().ok_or(EngineError::NotAcquired)?;
        if plan.stations.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "scenario has no stations".to_string(),
            ));
        }
        if plan.packet_size == 0 {
            return Err(EngineError::InvalidConfiguration(
                "packet size must be positive".to_string(),
            ));
        }
        context.plan = Some(plan.clone());
        Ok(())
    }

    fn run_until(&mut self, stop_time: f64) -> Result<Vec<FlowRecord>, EngineError> {
        let context = self.context.as_ref().ok_or(EngineError::NotAcquired)?;
        let plan = context.plan.as_ref().ok_or(EngineError::NotInstalled)?;
        let records = self.simulate(plan, stop_time);
        self.trials += 1;
        debug!("fluid trial {} produced {} flows", self.trials, records.len());
        Ok(records)
    }

    fn release(&mut self) {
        self.context = None;
    }
}

pub fn fluid_engine(config: FluidConfig) -> Box<dyn SimulationEngine> {
    Box::new(FluidEngine::new(config))
}
