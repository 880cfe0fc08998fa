use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};
use wlan_lab_abstract::{EngineError, FlowRecord, SimulationEngine, TrialPlan};

/// Request written to the engine program's stdin.
#[derive(Debug, Serialize)]
pub struct EngineRequest<'a> {
    pub stop_time: f64,
    pub plan: &'a TrialPlan,
}

/// Engine that runs each trial in an external program, e.g. a compiled ns-3 scenario.
///
/// The program reads one JSON [`EngineRequest`] from stdin and prints a JSON array of
/// flow records on stdout. A non-zero exit status fails the trial.
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    acquired: bool,
    plan: Option<TrialPlan>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            acquired: false,
            plan: None,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn invoke(&self, request: &EngineRequest<'_>) -> Result<Vec<FlowRecord>, EngineError> {
        let program = self.program.display().to_string();
        let payload = serde_json::to_vec(request)
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.clone(),
                source,
            })?;

        // A program that exits early closes its stdin; its status explains why.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };

        let output = child.wait_with_output().map_err(|source| EngineError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written.map_err(|source| EngineError::Spawn { program, source })?;

        parse_records(&output.stdout)
    }
}

/// Decode the flow records an engine program printed.
pub fn parse_records(stdout: &[u8]) -> Result<Vec<FlowRecord>, EngineError> {
    serde_json::from_slice(stdout).map_err(|e| EngineError::Malformed(e.to_string()))
}

impl SimulationEngine for ProcessEngine {
    fn name(&self) -> &str {
        "process"
    }

    fn acquire(&mut self) -> Result<(), EngineError> {
        if self.acquired {
            return Err(EngineError::AlreadyAcquired);
        }
        self.acquired = true;
        Ok(())
    }

    fn install(&mut self, plan: &TrialPlan) -> Result<(), EngineError> {
        if !self.acquired {
            return Err(EngineError::NotAcquired);
        }
        self.plan = Some(plan.clone());
        Ok(())
    }

    fn run_until(&mut self, stop_time: f64) -> Result<Vec<FlowRecord>, EngineError> {
        if !self.acquired {
            return Err(EngineError::NotAcquired);
        }
        let plan = self.plan.as_ref().ok_or(EngineError::NotInstalled)?;
        info!(
            "Running {} with {} stations",
            self.program.display(),
            plan.station_count()
        );
        let request = EngineRequest { stop_time, plan };
        let records = self.invoke(&request)?;
        debug!("engine program reported {} flows", records.len());
        Ok(records)
    }

    fn release(&mut self) {
        self.plan = None;
        self.acquired = false;
    }
}

pub fn process_engine(program: PathBuf, args: Vec<String>) -> Box<dyn SimulationEngine> {
    Box::new(ProcessEngine::new(program, args))
}
