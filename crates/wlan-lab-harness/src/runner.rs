use tracing::{debug, error, info};
use wlan_lab_abstract::{
    EngineError, FlowRecord, HarnessError, ScenarioConfig, SimulationEngine, TrialPlan,
};

use crate::throughput::{self, ThroughputSample};

/// An acquired engine context. Dropping it releases the context, so every exit path of
/// a trial (including errors) leaves the engine clean for the next one.
struct EngineContext<'e> {
    engine: &'e mut dyn SimulationEngine,
}

impl<'e> EngineContext<'e> {
    fn acquire(engine: &'e mut dyn SimulationEngine) -> Result<Self, EngineError> {
        engine.acquire()?;
        Ok(Self { engine })
    }

    fn install(&mut self, plan: &TrialPlan) -> Result<(), EngineError> {
        self.engine.install(plan)
    }

    fn run_until(&mut self, stop_time: f64) -> Result<Vec<FlowRecord>, EngineError> {
        self.engine.run_until(stop_time)
    }
}

impl Drop for EngineContext<'_> {
    fn drop(&mut self) {
        self.engine.release();
    }
}

/// Runs trials one after another against a single engine.
pub struct SweepRunner<'a> {
    engine: &'a mut dyn SimulationEngine,
}

impl<'a> SweepRunner<'a> {
    pub fn new(engine: &'a mut dyn SimulationEngine) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run one trial and return a fresh throughput array with one entry per station.
    pub fn run_trial(
        &mut self,
        config: &ScenarioConfig,
    ) -> Result<Vec<ThroughputSample>, HarnessError> {
        info!(
            "Trial: backbone {} | {} stations | variant {}",
            config.backbone_rate, config.station_count, config.variant
        );
        let mut context = EngineContext::acquire(&mut *self.engine)?;
        let plan = config.plan()?;
        context.install(&plan)?;
        let records = context.run_until(plan.stop_time)?;
        drop(context);

        let samples = throughput::extract(&plan, &records);
        for sample in &samples {
            debug!("throughput {}: {:.6}", sample.station_index, sample.mbps);
        }
        Ok(samples)
    }

    /// Run every config in order. The first failing trial aborts the whole sweep and no
    /// results are returned.
    pub fn run_sweep(
        &mut self,
        configs: &[ScenarioConfig],
    ) -> Result<Vec<Vec<ThroughputSample>>, HarnessError> {
        configs
            .iter()
            .enumerate()
            .map(|(position, config)| {
                self.run_trial(config).inspect_err(|e| {
                    error!("Trial {position} of {} failed: {e}", configs.len());
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use wlan_lab_abstract::DataRate;

    /// Engine double that records the calls it receives.
    #[derive(Default)]
    pub(crate) struct ScriptedEngine {
        pub acquired: usize,
        pub released: usize,
        pub runs: usize,
        pub live: bool,
        /// Zero-based run index that fails, if any.
        pub fail_on_run: Option<usize>,
        pub bytes_per_station: VecDeque<Vec<u64>>,
        plan: Option<TrialPlan>,
    }

    impl ScriptedEngine {
        pub(crate) fn failing_on(run: usize) -> Self {
            Self {
                fail_on_run: Some(run),
                ..Self::default()
            }
        }
    }

    impl SimulationEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn acquire(&mut self) -> Result<(), EngineError> {
            if self.live {
                return Err(EngineError::AlreadyAcquired);
            }
            self.live = true;
            self.acquired += 1;
            Ok(())
        }

        fn install(&mut self, plan: &TrialPlan) -> Result<(), EngineError> {
            self.plan = Some(plan.clone());
            Ok(())
        }

        fn run_until(&mut self, _stop_time: f64) -> Result<Vec<FlowRecord>, EngineError> {
            let run = self.runs;
            self.runs += 1;
            if self.fail_on_run == Some(run) {
                return Err(EngineError::InvalidConfiguration("scripted failure".into()));
            }
            let plan = self.plan.as_ref().ok_or(EngineError::NotInstalled)?;
            let bytes = self
                .bytes_per_station
                .pop_front()
                .unwrap_or_else(|| vec![1_125_000; plan.station_count()]);
            let mut records = vec![FlowRecord::new(
                0,
                Ipv4Addr::new(10, 1, 3, 1),
                Ipv4Addr::new(10, 1, 1, 1),
                999,
            )];
            records.extend(plan.stations.iter().zip(bytes).enumerate().map(
                |(i, (station, bytes))| {
                    let source = Ipv4Addr::new(10, 1, 1, 2);
                    FlowRecord::new((i + 1) as u32, source, station.address, bytes)
                },
            ));
            Ok(records)
        }

        fn release(&mut self) {
            self.live = false;
            self.released += 1;
            self.plan = None;
        }
    }

    fn config(stations: u32, variant: u8) -> ScenarioConfig {
        ScenarioConfig::new(DataRate::from_mbps(11), stations, variant)
    }

    #[test]
    fn arrays_are_sized_per_trial() {
        let mut engine = ScriptedEngine::default();
        engine.bytes_per_station = VecDeque::from(vec![vec![2_250_000; 5], vec![1_125_000; 2]]);
        let results = SweepRunner::new(&mut engine)
            .run_sweep(&[config(5, 2), config(2, 2)])
            .unwrap();
        assert_eq!(results[0].len(), 5);
        assert_eq!(results[1].len(), 2);
        assert!(results[1].iter().all(|s| s.mbps == 1.0));
        assert_eq!(engine.acquired, 2);
        assert_eq!(engine.released, 2);
    }

    #[test]
    fn invalid_variant_releases_and_aborts() {
        let mut engine = ScriptedEngine::default();
        let err = SweepRunner::new(&mut engine)
            .run_sweep(&[config(3, 1), config(3, 7), config(3, 1)])
            .unwrap_err();
        assert!(matches!(err, HarnessError::InvalidVariant(7)));
        assert_eq!(engine.acquired, 2);
        assert_eq!(engine.released, 2);
        assert_eq!(engine.runs, 1);
        assert!(!engine.live);
    }

    #[test]
    fn engine_failure_aborts_whole_sweep() {
        let mut engine = ScriptedEngine::failing_on(2);
        let configs: Vec<_> = (1..=5).map(|n| config(n, 2)).collect();
        let result = SweepRunner::new(&mut engine).run_sweep(&configs);
        assert!(matches!(result, Err(HarnessError::Engine(_))));
        assert_eq!(engine.runs, 3);
        assert_eq!(engine.acquired, engine.released);
    }

    #[test]
    fn acquire_failure_is_not_released() {
        let mut engine = ScriptedEngine {
            live: true,
            ..ScriptedEngine::default()
        };
        let err = SweepRunner::new(&mut engine)
            .run_trial(&config(1, 1))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Engine(EngineError::AlreadyAcquired)));
        assert_eq!(engine.released, 0);
    }
}
