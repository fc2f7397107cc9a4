//! Target device profile.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::capability::DeclaredCapabilities;
use crate::error::{IrError, IrResult};
use crate::graph::QubitGraph;

/// Calibration data for one physical qubit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitProperties {
    /// Readout (measurement) error probability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readout_error: Option<f64>,
}

/// Immutable description of a target backend.
///
/// Connectivity is symmetric by construction (see [`QubitGraph`]). The
/// profile is read-only for the duration of a workflow run and may be shared
/// across concurrent runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Provider identifier, e.g. `"ibm"`.
    #[serde(default)]
    pub provider_name: String,
    /// Backend name.
    #[serde(default, alias = "name")]
    pub device_name: String,
    /// Number of physical qubits.
    #[serde(default)]
    pub max_qubits: u32,
    /// Undirected qubit connectivity.
    #[serde(default, rename = "qubit_connectivity")]
    pub connectivity: QubitGraph,
    /// Gate error rates keyed by gate name.
    #[serde(default)]
    pub gate_error_rates: BTreeMap<String, f64>,
    /// Per-qubit calibration data.
    #[serde(default)]
    pub qubit_properties: BTreeMap<u32, QubitProperties>,
    /// Declared capability flags.
    #[serde(default)]
    pub capabilities: DeclaredCapabilities,
    /// Native gate names.
    #[serde(default)]
    pub native_gates: BTreeSet<String>,
}

impl DeviceProfile {
    /// Create a device with no connectivity or calibration data.
    pub fn new(provider: impl Into<String>, name: impl Into<String>, max_qubits: u32) -> Self {
        Self {
            provider_name: provider.into(),
            device_name: name.into(),
            max_qubits,
            ..Self::default()
        }
    }

    /// Parse a device profile from JSON and validate it.
    pub fn from_json(json: &str) -> IrResult<Self> {
        let device: Self = serde_json::from_str(json)?;
        device.validate()?;
        Ok(device)
    }

    /// Set the connectivity graph.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: QubitGraph) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Set a gate error rate.
    #[must_use]
    pub fn with_gate_error(mut self, gate: impl Into<String>, rate: f64) -> Self {
        self.gate_error_rates.insert(gate.into(), rate);
        self
    }

    /// Set the readout error of one qubit.
    #[must_use]
    pub fn with_readout_error(mut self, qubit: u32, rate: f64) -> Self {
        self.qubit_properties.insert(
            qubit,
            QubitProperties {
                readout_error: Some(rate),
            },
        );
        self
    }

    /// Set the declared capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: DeclaredCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the native gate set.
    #[must_use]
    pub fn with_native_gates<I, S>(mut self, gates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.native_gates = gates.into_iter().map(Into::into).collect();
        self
    }

    /// Check that every error rate lies in `[0, 1]`.
    pub fn validate(&self) -> IrResult<()> {
        for (name, &value) in &self.gate_error_rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(IrError::InvalidErrorRate {
                    name: name.clone(),
                    value,
                });
            }
        }
        for (q, props) in &self.qubit_properties {
            if let Some(value) = props.readout_error {
                if !(0.0..=1.0).contains(&value) {
                    return Err(IrError::InvalidErrorRate {
                        name: format!("readout[{q}]"),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Error rate of a gate, looked up case-insensitively.
    pub fn gate_error(&self, gate: &str) -> Option<f64> {
        self.gate_error_rates
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(gate))
            .map(|(_, &rate)| rate)
    }

    /// Readout error of a qubit, `0.0` when unknown.
    pub fn readout_error(&self, qubit: u32) -> f64 {
        self.qubit_properties
            .get(&qubit)
            .and_then(|p| p.readout_error)
            .unwrap_or(0.0)
    }

    /// All known readout errors.
    pub fn readout_errors(&self) -> Vec<f64> {
        self.qubit_properties
            .values()
            .filter_map(|p| p.readout_error)
            .collect()
    }

    /// Mean readout error over qubits with calibration data.
    pub fn mean_readout_error(&self) -> Option<f64> {
        let values = self.readout_errors();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    /// Physical qubits available for allocation.
    ///
    /// Connectivity nodes when connectivity is known, otherwise `0..max_qubits`.
    pub fn physical_qubits(&self) -> Vec<u32> {
        if self.connectivity.is_empty() {
            (0..self.max_qubits).collect()
        } else {
            self.connectivity.nodes().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_JSON: &str = r#"{
        "provider_name": "ibm",
        "device_name": "ibm_test",
        "max_qubits": 4,
        "qubit_connectivity": {"0": [1], "1": [0, 2], "2": [1, 3], "3": [2]},
        "gate_error_rates": {"cx": 0.02, "x": 0.0005},
        "qubit_properties": {"0": {"readout_error": 0.01}, "1": {"readout_error": 0.03}},
        "capabilities": {"conditional": true},
        "native_gates": ["cx", "x", "sx", "rz"]
    }"#;

    #[test]
    fn test_parse_device() {
        let device = DeviceProfile::from_json(DEVICE_JSON).unwrap();
        assert_eq!(device.max_qubits, 4);
        assert_eq!(device.connectivity.num_edges(), 3);
        assert_eq!(device.gate_error("CX"), Some(0.02));
        assert_eq!(device.readout_error(1), 0.03);
        assert_eq!(device.readout_error(3), 0.0);
        assert_eq!(device.capabilities.conditional, Some(true));
        assert!(device.native_gates.contains("sx"));
    }

    #[test]
    fn test_name_alias() {
        let device = DeviceProfile::from_json(r#"{"name": "garnet", "max_qubits": 20}"#).unwrap();
        assert_eq!(device.device_name, "garnet");
    }

    #[test]
    fn test_mean_readout_error() {
        let device = DeviceProfile::from_json(DEVICE_JSON).unwrap();
        let mean = device.mean_readout_error().unwrap();
        assert!((mean - 0.02).abs() < 1e-12);
        assert_eq!(DeviceProfile::new("x", "y", 3).mean_readout_error(), None);
    }

    #[test]
    fn test_physical_qubits_fallback() {
        let bare = DeviceProfile::new("sim", "sim", 3);
        assert_eq!(bare.physical_qubits(), vec![0, 1, 2]);

        let wired = bare.with_connectivity(QubitGraph::from_edges([(5, 7)]));
        assert_eq!(wired.physical_qubits(), vec![5, 7]);
    }

    #[test]
    fn test_validate_error_rates() {
        let device = DeviceProfile::new("sim", "sim", 2).with_gate_error("cx", 1.5);
        assert!(matches!(
            device.validate(),
            Err(IrError::InvalidErrorRate { .. })
        ));

        let device = DeviceProfile::new("sim", "sim", 2).with_readout_error(0, -0.1);
        assert!(device.validate().is_err());
    }
}
