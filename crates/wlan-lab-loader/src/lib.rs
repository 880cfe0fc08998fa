mod builtin;
mod process;
pub mod spec;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use wlan_lab_abstract::SimulationEngine;

pub use builtin::{FluidConfig, FluidEngine, max_min_share};
pub use process::{EngineRequest, ProcessEngine, parse_records};

/// Describes how to obtain a simulation engine.
pub enum EngineDescriptor {
    /// Built-in deterministic capacity model.
    Fluid,
    /// External engine program speaking JSON over stdin/stdout.
    Process { program: PathBuf, args: Vec<String> },
    Custom(Box<dyn SimulationEngine>),
}

/// Builder for the loader. Holds settings shared by every engine it creates.
pub struct LoaderBuilder {
    fluid: FluidConfig,
    extra_args: Vec<String>,
}

impl Default for LoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderBuilder {
    pub fn new() -> Self {
        Self {
            fluid: FluidConfig::default(),
            extra_args: Vec::new(),
        }
    }

    pub fn fluid_config(mut self, config: FluidConfig) -> Self {
        self.fluid = config;
        self
    }

    /// Arguments appended to every external engine invocation.
    pub fn engine_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn build(self) -> Result<EngineLoader> {
        if self.fluid.cw_min == 0 {
            anyhow::bail!("fluid contention window must be positive");
        }
        if self.fluid.phy_rate.bps() == 0 || self.fluid.basic_rate.bps() == 0 {
            anyhow::bail!("fluid channel rates must be positive");
        }
        Ok(EngineLoader {
            fluid: self.fluid,
            extra_args: self.extra_args,
        })
    }
}

/// Instantiates simulation engines from descriptors.
pub struct EngineLoader {
    fluid: FluidConfig,
    extra_args: Vec<String>,
}

impl EngineLoader {
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::new()
    }

    pub fn load(&self, descriptor: EngineDescriptor) -> Result<Box<dyn SimulationEngine>> {
        let engine = match descriptor {
            EngineDescriptor::Fluid => builtin::fluid_engine(self.fluid.clone()),
            EngineDescriptor::Process { program, mut args } => {
                args.extend(self.extra_args.iter().cloned());
                process::process_engine(program, args)
            }
            EngineDescriptor::Custom(engine) => engine,
        };
        info!("Loaded simulation engine `{}`", engine.name());
        Ok(engine)
    }
}
