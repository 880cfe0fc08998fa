use serde::{Deserialize, Serialize};
use wlan_lab_abstract::HarnessError;

pub fn mean(samples: &[f64]) -> Result<f64, HarnessError> {
    if samples.is_empty() {
        return Err(HarnessError::InsufficientSamples {
            required: 1,
            actual: 0,
        });
    }
    Ok(total(samples) / samples.len() as f64)
}

pub fn total(samples: &[f64]) -> f64 {
    samples.iter().sum()
}

/// Mean of every sample except the single largest one.
///
/// Used when one station is a designated streamer whose throughput must not bias
/// the other stations' average.
pub fn trimmed_mean_excluding_max(samples: &[f64]) -> Result<f64, HarnessError> {
    if samples.len() < 2 {
        return Err(HarnessError::InsufficientSamples {
            required: 2,
            actual: samples.len(),
        });
    }
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((total(samples) - max) / (samples.len() - 1) as f64)
}

/// Reduction applied to one trial's throughput array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Total,
    TrimmedMeanExcludingMax,
}

impl Statistic {
    pub fn apply(&self, samples: &[f64]) -> Result<f64, HarnessError> {
        match self {
            Statistic::Mean => mean(samples),
            Statistic::Total => Ok(total(samples)),
            Statistic::TrimmedMeanExcludingMax => trimmed_mean_excluding_max(samples),
        }
    }
}
