use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::EngineDescriptor;

/// Map a user-visible engine name to a descriptor.
pub fn engine_by_name(
    name: &str,
    program: Option<PathBuf>,
    args: Vec<String>,
) -> Result<EngineDescriptor> {
    match name {
        "fluid" => {
            if program.is_some() {
                anyhow::bail!("--engine-program only applies to the 'process' engine");
            }
            Ok(EngineDescriptor::Fluid)
        }
        "process" => {
            let program = program.context("the 'process' engine needs --engine-program")?;
            Ok(EngineDescriptor::Process { program, args })
        }
        other => anyhow::bail!("Unknown engine '{other}'. Try 'fluid' or 'process'."),
    }
}
