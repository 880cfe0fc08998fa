pub mod aggregate;
pub mod dataset;
pub mod experiments;
pub mod plot;
pub mod runner;
pub mod throughput;
pub mod trace;

pub use aggregate::Statistic;
pub use dataset::{Dataset, DatasetBuilder, Style, SweepPoint};
pub use experiments::Experiment;
pub use plot::{PlotDescriptor, PlotExporter};
pub use runner::SweepRunner;
pub use throughput::ThroughputSample;
pub use trace::{HarnessReport, SweepReport, TrialRecord};
