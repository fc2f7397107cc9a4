//! Device error profiling.

use std::collections::BTreeMap;

use qcraft_ir::DeviceProfile;
use serde::{Deserialize, Serialize};

/// Profiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Readout variance above which calibration data is considered noisy.
    pub variance_threshold: f64,
    /// Report `high` rather than `medium` uncertainty without calibrations.
    pub high_uncertainty_if_no_calibration: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            variance_threshold: 1.0e-4,
            high_uncertainty_if_no_calibration: true,
        }
    }
}

/// Confidence in the calibration data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Uncertainty {
    High,
    Medium,
    Low,
}

/// Calibration summary of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorProfile {
    pub gate_error_rates: BTreeMap<String, f64>,
    pub readout_error_mean: Option<f64>,
    /// Population variance of the readout errors.
    pub readout_error_var: Option<f64>,
    pub has_calibrations: bool,
    pub uncertainty: Uncertainty,
}

impl ErrorProfile {
    /// Summarize the calibration data of `device`.
    pub fn build(device: &DeviceProfile, config: &ProfilerConfig) -> Self {
        let readout = device.readout_errors();
        let mean = device.mean_readout_error();
        let var = mean.map(|mu| {
            readout.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / readout.len() as f64
        });
        let has_calibrations = !device.gate_error_rates.is_empty() || !readout.is_empty();

        let uncertainty = if !has_calibrations {
            if config.high_uncertainty_if_no_calibration {
                Uncertainty::High
            } else {
                Uncertainty::Medium
            }
        } else if var.is_some_and(|v| v > config.variance_threshold) {
            Uncertainty::Medium
        } else {
            Uncertainty::Low
        };

        Self {
            gate_error_rates: device.gate_error_rates.clone(),
            readout_error_mean: mean,
            readout_error_var: var,
            has_calibrations,
            uncertainty,
        }
    }
}
