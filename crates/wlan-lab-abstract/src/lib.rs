pub mod config;
pub mod error;
pub mod flow;
pub mod interface;
pub mod plan;
pub mod rate;
pub mod variant;

pub use flow::FlowRecord;
pub use interface::{SimulationEngine, StationPlan, TrialPlan};
pub use rate::DataRate;
pub use variant::Variant;

pub use config::{MeasurementWindow, ScenarioConfig};
pub use error::{EngineError, HarnessError};
pub use plan::{
    BackboneSweep, BackboneSweepOverride, HarnessPlan, StationSweep, StationSweepOverride,
    StreamerSweep, StreamerSweepOverride,
};
