//! The three sweeps the harness knows how to run.
//!
//! An [`Experiment`] is pure data: ordered trial configs per arm, the statistic each
//! series takes from a trial, axis metadata and fixed reference lines. `run` is the only
//! step that touches the engine.

use tracing::info;
use wlan_lab_abstract::variant::{LOW_RATE, SATURATING_RATE};
use wlan_lab_abstract::{
    BackboneSweep, DataRate, HarnessError, ScenarioConfig, SimulationEngine, StationSweep,
    StreamerSweep,
};

use crate::aggregate::Statistic;
use crate::dataset::{DatasetBuilder, Style, SweepPoint};
use crate::plot::PlotDescriptor;
use crate::runner::SweepRunner;
use crate::throughput::{self, ThroughputSample};
use crate::trace::{SweepReport, TrialRecord};

/// On-wire rate, in kb/s, of one station offered 448 kb/s of 1400 byte datagrams.
pub const BREAK_EVEN_KBPS_PER_STATION: f64 = 472.32;

/// One series fed from every trial of an arm.
#[derive(Debug, Clone)]
pub struct SeriesOutput {
    pub series: String,
    pub statistic: Statistic,
}

/// Trials that share a variant, each tagged with its x coordinate.
#[derive(Debug, Clone)]
pub struct Arm {
    pub trials: Vec<(f64, ScenarioConfig)>,
    pub outputs: Vec<SeriesOutput>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub title: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct Experiment {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Data series in drawing order.
    pub series: Vec<String>,
    pub arms: Vec<Arm>,
    pub annotations: Vec<Annotation>,
}

fn output(series: &str, statistic: Statistic) -> SeriesOutput {
    SeriesOutput {
        series: series.to_string(),
        statistic,
    }
}

fn horizontal(title: &str, from: f64, to: f64, y: f64) -> Annotation {
    Annotation {
        title: title.to_string(),
        points: vec![(from, y), (to, y)],
    }
}

/// Backbone rate in kb/s of sweep step `i`.
fn sweep_position(sweep: &BackboneSweep, i: u32) -> Result<u64, HarnessError> {
    sweep
        .step_kbps
        .checked_mul(u64::from(i))
        .and_then(|offset| offset.checked_add(sweep.start_kbps))
        .ok_or_else(|| {
            HarnessError::InvalidRate(format!(
                "{} + {} x {i} kbps",
                sweep.start_kbps, sweep.step_kbps
            ))
        })
}

impl Experiment {
    /// Average throughput of a fixed set of low-rate stations as the backbone grows.
    ///
    /// Fails with `InvalidRate` when a sweep position overflows.
    pub fn backbone(sweep: &BackboneSweep) -> Result<Self, HarnessError> {
        const SERIES: &str = "Throughput vs. backbone datarate";

        let trials = (0..sweep.steps)
            .map(|i| {
                let kbps = sweep_position(sweep, i)?;
                let config = ScenarioConfig::new(
                    DataRate::try_from_kbps(kbps)?,
                    sweep.station_count,
                    sweep.variant,
                )
                .with_packet_size(sweep.packet_size);
                Ok((kbps as f64, config))
            })
            .collect::<Result<Vec<_>, HarnessError>>()?;

        let x_end = sweep_position(sweep, sweep.steps)? as f64;
        let span = (sweep.step_kbps * u64::from(sweep.steps)) as f64;
        let saturation = f64::from(sweep.station_count) * BREAK_EVEN_KBPS_PER_STATION;
        Ok(Self {
            name: "throughput-vs-backbone-datarate".to_string(),
            title: "Throughput vs. backbone datarate".to_string(),
            x_label: "Backbone datarate (kbps)".to_string(),
            y_label: "Average throughput (Mbps)".to_string(),
            x_range: (sweep.start_kbps as f64, x_end),
            y_range: (0.0, 0.7),
            series: vec![SERIES.to_string()],
            arms: vec![Arm {
                trials,
                outputs: vec![output(SERIES, Statistic::Mean)],
            }],
            annotations: vec![
                Annotation {
                    title: "Saturation for all nodes".to_string(),
                    points: vec![(saturation, 0.0), (saturation, 0.55)],
                },
                horizontal(
                    "Saturation throughput of each node",
                    0.0,
                    span,
                    BREAK_EVEN_KBPS_PER_STATION / 1000.0,
                ),
            ],
        })
    }

    /// Average and total throughput of saturating stations, with and without RTS/CTS.
    pub fn stations(sweep: &StationSweep) -> Self {
        const AVG_RTS: &str = "Average throughput with RTS/CTS";
        const AVG_NO_RTS: &str = "Average throughput without RTS/CTS";
        const TOTAL_RTS: &str = "Total throughput with RTS/CTS";
        const TOTAL_NO_RTS: &str = "Total throughput without RTS/CTS";

        let arm = |variant: u8, average: &str, total: &str| Arm {
            trials: (1..=sweep.max_stations)
                .map(|n| {
                    let config = ScenarioConfig::new(sweep.backbone_rate, n, variant)
                        .with_packet_size(sweep.packet_size);
                    (f64::from(n), config)
                })
                .collect(),
            outputs: vec![
                output(average, Statistic::Mean),
                output(total, Statistic::Total),
            ],
        };

        let x_end = f64::from(sweep.max_stations);
        Self {
            name: "throughput-vs-numOfStations".to_string(),
            title: "Average throughput vs. number of stations".to_string(),
            x_label: "Number of stations".to_string(),
            y_label: "Throughput (Mbps)".to_string(),
            x_range: (1.0, x_end),
            y_range: (0.0, 5.5),
            series: [AVG_RTS, AVG_NO_RTS, TOTAL_RTS, TOTAL_NO_RTS]
                .map(String::from)
                .to_vec(),
            arms: vec![
                arm(sweep.rts_cts_variant, AVG_RTS, TOTAL_RTS),
                arm(sweep.no_rts_cts_variant, AVG_NO_RTS, TOTAL_NO_RTS),
            ],
            annotations: vec![horizontal(
                "Offered load per station",
                1.0,
                x_end,
                SATURATING_RATE.mbps(),
            )],
        }
    }

    /// Low-rate stations next to one streamer of increasing rate. The streamer is left
    /// out of the average by trimming the largest sample.
    pub fn streamer(sweep: &StreamerSweep) -> Self {
        const AVG_RTS: &str = "Average throughput non-streamers with RTS/CTS";
        const AVG_NO_RTS: &str = "Average throughput non-streamers without RTS/CTS";
        const TOTAL_RTS: &str = "Total throughput with RTS/CTS";
        const TOTAL_NO_RTS: &str = "Total throughput without RTS/CTS";

        let arm = |variant: u8, average: &str, total: &str| Arm {
            trials: sweep
                .streaming_rates
                .iter()
                .map(|&rate| {
                    let config =
                        ScenarioConfig::new(sweep.backbone_rate, sweep.station_count, variant)
                            .with_packet_size(sweep.packet_size)
                            .with_streaming_rate(rate);
                    (rate.mbps(), config)
                })
                .collect(),
            outputs: vec![
                output(average, Statistic::TrimmedMeanExcludingMax),
                output(total, Statistic::Total),
            ],
        };

        let (x_start, x_end) = sweep
            .streaming_rates
            .iter()
            .map(DataRate::mbps)
            .fold(None, |range: Option<(f64, f64)>, x| match range {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
            .unwrap_or((0.0, 1.0));
        Self {
            name: "throughput-vs-streamer".to_string(),
            title: "Average throughput vs. a streamer's datarate".to_string(),
            x_label: "Streamer's datarate (Mbps)".to_string(),
            y_label: "Throughput (Mbps)".to_string(),
            x_range: (x_start, x_end),
            y_range: (0.0, 5.0),
            series: [AVG_RTS, AVG_NO_RTS, TOTAL_RTS, TOTAL_NO_RTS]
                .map(String::from)
                .to_vec(),
            arms: vec![
                arm(sweep.rts_cts_variant, AVG_RTS, TOTAL_RTS),
                arm(sweep.no_rts_cts_variant, AVG_NO_RTS, TOTAL_NO_RTS),
            ],
            annotations: vec![horizontal(
                "Offered load per non-streamer",
                x_start,
                x_end,
                LOW_RATE.mbps(),
            )],
        }
    }

    pub fn trial_count(&self) -> usize {
        self.arms.iter().map(|a| a.trials.len()).sum()
    }

    /// Reduce one arm's trial results to points, in trial order.
    pub fn aggregate(
        arm: &Arm,
        results: &[Vec<ThroughputSample>],
    ) -> Result<Vec<SweepPoint>, HarnessError> {
        let mut points = Vec::with_capacity(results.len() * arm.outputs.len());
        for ((x, _), samples) in arm.trials.iter().zip(results) {
            let values = throughput::values(samples);
            for out in &arm.outputs {
                points.push(SweepPoint {
                    series: out.series.clone(),
                    x: *x,
                    y: out.statistic.apply(&values)?,
                });
            }
        }
        Ok(points)
    }

    /// Assemble the descriptor from finished points. Data series come first, in the
    /// declared order, followed by the annotations.
    pub fn describe(&self, points: Vec<SweepPoint>) -> PlotDescriptor {
        let mut builder = DatasetBuilder::new();
        for series in &self.series {
            builder.series(series, Style::LinesPoints);
        }
        for point in points {
            builder.push(point);
        }
        for annotation in &self.annotations {
            builder.annotate(&annotation.title, Style::LinesPoints, &annotation.points);
        }

        let mut plot = PlotDescriptor::new(&self.name, &self.title)
            .with_legend(&self.x_label, &self.y_label)
            .with_ranges(self.x_range, self.y_range);
        for dataset in builder.finish() {
            plot.add_dataset(dataset);
        }
        plot
    }

    /// Run every arm against `engine`. Any failing trial or statistic aborts the whole
    /// experiment; there is no partial report.
    pub fn run(&self, engine: &mut dyn SimulationEngine) -> Result<SweepReport, HarnessError> {
        info!(
            "Starting sweep {} ({} trials)",
            self.name,
            self.trial_count()
        );
        let mut runner = SweepRunner::new(engine);
        let engine_name = runner.engine_name().to_string();

        let mut trials = Vec::with_capacity(self.trial_count());
        let mut points = Vec::new();
        for arm in &self.arms {
            let configs: Vec<ScenarioConfig> =
                arm.trials.iter().map(|(_, config)| config.clone()).collect();
            let results = runner.run_sweep(&configs)?;
            points.extend(Self::aggregate(arm, &results)?);
            trials.extend(
                configs
                    .into_iter()
                    .zip(results)
                    .map(|(config, samples)| TrialRecord { config, samples }),
            );
        }

        Ok(SweepReport {
            engine: engine_name,
            trials,
            plot: self.describe(points),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::tests::ScriptedEngine;
    use wlan_lab_loader::{EngineDescriptor, EngineLoader};

    fn fluid() -> Box<dyn SimulationEngine> {
        EngineLoader::builder()
            .build()
            .unwrap()
            .load(EngineDescriptor::Fluid)
            .unwrap()
    }

    #[test]
    fn backbone_sweep_points_in_order() {
        let experiment = Experiment::backbone(&BackboneSweep::default()).unwrap();
        let mut engine = ScriptedEngine::default();
        let report = experiment.run(&mut engine).unwrap();

        let data = &report.plot.datasets[0];
        assert_eq!(data.title, "Throughput vs. backbone datarate");
        let xs: Vec<f64> = data.points.iter().map(|p| p.0).collect();
        let expected: Vec<f64> = (0..20).map(|i| 1.0 + 100.0 * i as f64).collect();
        assert_eq!(xs, expected);
        assert_eq!(xs.last(), Some(&1901.0));
        assert_eq!(report.trials.len(), 20);
        assert!(report.trials.iter().all(|t| t.samples.len() == 3));
        assert_eq!(engine.released, 20);
    }

    #[test]
    fn backbone_annotations_follow_data() {
        let experiment = Experiment::backbone(&BackboneSweep::default()).unwrap();
        let plot = experiment.describe(Vec::new());
        let titles: Vec<_> = plot.datasets.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Throughput vs. backbone datarate",
                "Saturation for all nodes",
                "Saturation throughput of each node",
            ]
        );
        let saturation = &plot.datasets[1].points;
        assert!((saturation[0].0 - 1416.96).abs() < 1e-9);
        assert_eq!(saturation[0].1, 0.0);
        assert_eq!(saturation[1].1, 0.55);
        let per_node = &plot.datasets[2].points;
        assert_eq!(per_node.len(), 2);
        assert_eq!((per_node[0].0, per_node[1].0), (0.0, 2000.0));
        assert!(per_node.iter().all(|p| (p.1 - 0.47232).abs() < 1e-12));
        assert_eq!(plot.x_range, (1.0, 2001.0));
        assert_eq!(plot.y_range, (0.0, 0.7));
    }

    #[test]
    fn overflowing_backbone_sweep_is_rejected() {
        let sweep = BackboneSweep {
            start_kbps: u64::MAX - 50,
            ..BackboneSweep::default()
        };
        assert!(matches!(
            Experiment::backbone(&sweep),
            Err(HarnessError::InvalidRate(_))
        ));

        let sweep = BackboneSweep {
            step_kbps: u64::MAX,
            steps: 3,
            ..BackboneSweep::default()
        };
        assert!(matches!(
            Experiment::backbone(&sweep),
            Err(HarnessError::InvalidRate(_))
        ));
    }

    #[test]
    fn engine_failure_leaves_no_points() {
        let experiment = Experiment::stations(&StationSweep::default());
        let mut engine = ScriptedEngine::failing_on(7);
        let result = experiment.run(&mut engine);
        assert!(matches!(result, Err(HarnessError::Engine(_))));
        assert_eq!(engine.runs, 8);
        assert_eq!(engine.acquired, engine.released);
    }

    #[test]
    fn station_sweep_series_layout() {
        let sweep = StationSweep {
            max_stations: 4,
            ..StationSweep::default()
        };
        let experiment = Experiment::stations(&sweep);
        assert_eq!(experiment.trial_count(), 8);
        assert_eq!(experiment.arms[0].trials[0].1.variant, 2);
        assert_eq!(experiment.arms[1].trials[3].1.variant, 3);

        let mut engine = ScriptedEngine::default();
        let report = experiment.run(&mut engine).unwrap();
        let plot = &report.plot;
        assert_eq!(plot.datasets.len(), 5);
        assert_eq!(plot.datasets[0].title, "Average throughput with RTS/CTS");
        assert_eq!(plot.datasets[3].title, "Total throughput without RTS/CTS");
        // Every scripted station receives 1 Mb/s.
        assert_eq!(plot.datasets[0].points[3], (4.0, 1.0));
        assert_eq!(plot.datasets[2].points[3], (4.0, 4.0));
    }

    #[test]
    fn streamer_average_excludes_the_streamer() {
        let sweep = StreamerSweep {
            streaming_rates: vec![DataRate::from_mbps(2)],
            station_count: 3,
            ..StreamerSweep::default()
        };
        let experiment = Experiment::streamer(&sweep);
        let mut engine = ScriptedEngine::default();
        engine.bytes_per_station = vec![
            vec![4_500_000, 1_125_000, 1_125_000],
            vec![6_750_000, 1_125_000, 2_250_000],
        ]
        .into();
        let report = experiment.run(&mut engine).unwrap();
        let plot = &report.plot;
        assert_eq!(plot.datasets[0].points, vec![(2.0, 1.0)]);
        assert_eq!(plot.datasets[1].points, vec![(2.0, 1.5)]);
        assert_eq!(plot.datasets[2].points, vec![(2.0, 6.0)]);
        assert_eq!(plot.datasets[3].points, vec![(2.0, 9.0)]);
    }

    #[test]
    fn single_station_streamer_sweep_fails() {
        let sweep = StreamerSweep {
            station_count: 1,
            ..StreamerSweep::default()
        };
        let mut engine = ScriptedEngine::default();
        let result = Experiment::streamer(&sweep).run(&mut engine);
        assert!(matches!(
            result,
            Err(HarnessError::InsufficientSamples { required: 2, .. })
        ));
    }

    #[test]
    fn fluid_engine_end_to_end() {
        let mut engine = fluid();
        let report = Experiment::stations(&StationSweep {
            max_stations: 6,
            ..StationSweep::default()
        })
        .run(engine.as_mut())
        .unwrap();

        let with_rts = &report.plot.datasets[2].points;
        let without_rts = &report.plot.datasets[3].points;
        for (a, b) in with_rts.iter().zip(without_rts) {
            assert!(a.1 < b.1, "RTS/CTS should cost total throughput");
        }
        let averages = &report.plot.datasets[0].points;
        assert!(averages.windows(2).all(|w| w[1].1 < w[0].1));
    }
}
