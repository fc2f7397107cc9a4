//! Provider-ready job packages.

use chrono::Utc;
use qcraft_ir::{CircuitIr, DeviceCapabilities, DeviceProfile, GateRecord};
use serde::{Deserialize, Serialize};

/// Instructions handed to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeJob {
    pub instructions: Vec<GateRecord>,
    /// Full compiled circuit; removed by obfuscation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qcraft_circuit: Option<CircuitIr>,
}

/// Package metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub device: String,
    pub provider: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// A compiled circuit packaged for a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPackage {
    pub provider: String,
    pub device: String,
    pub capabilities: DeviceCapabilities,
    pub native_job: NativeJob,
    pub metadata: JobMetadata,
}

/// Builds [`JobPackage`]s for one device.
#[derive(Debug, Clone)]
pub struct JobPackager<'a> {
    device: &'a DeviceProfile,
    capabilities: DeviceCapabilities,
    comments: Option<String>,
}

impl<'a> JobPackager<'a> {
    /// Create a packager for `device`.
    pub fn new(device: &'a DeviceProfile, capabilities: DeviceCapabilities) -> Self {
        Self {
            device,
            capabilities,
            comments: None,
        }
    }

    /// Attach free-form comments to the package metadata.
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Package `circuit`, stamped with the current time.
    pub fn package(&self, circuit: &CircuitIr) -> JobPackage {
        self.package_at(circuit, unix_seconds())
    }

    /// Package `circuit` with an explicit timestamp.
    pub fn package_at(&self, circuit: &CircuitIr, timestamp: f64) -> JobPackage {
        JobPackage {
            provider: self.device.provider_name.clone(),
            device: self.device.device_name.clone(),
            capabilities: self.capabilities,
            native_job: NativeJob {
                instructions: circuit.gates.clone(),
                qcraft_circuit: Some(circuit.clone()),
            },
            metadata: JobMetadata {
                device: self.device.device_name.clone(),
                provider: self.device.provider_name.clone(),
                timestamp,
                comments: self.comments.clone(),
            },
        }
    }
}

/// Current time in fractional seconds since the Unix epoch.
pub fn unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_embeds_circuit() {
        let device = DeviceProfile::new("ibm", "ibm_kyiv", 127);
        let circuit = CircuitIr::new(1).gate("H", [0]).gate("MEASURE", [0]);
        let pkg = JobPackager::new(&device, DeviceCapabilities::all()).package_at(&circuit, 1.5);

        assert_eq!(pkg.provider, "ibm");
        assert_eq!(pkg.device, "ibm_kyiv");
        assert_eq!(pkg.native_job.instructions.len(), 2);
        assert_eq!(pkg.native_job.qcraft_circuit.as_ref(), Some(&circuit));
        assert_eq!(pkg.metadata.timestamp, 1.5);
        assert!(pkg.metadata.comments.is_none());
        assert!(pkg.capabilities.dynamic_circuits);
    }

    #[test]
    fn test_package_json_shape() {
        let device = DeviceProfile::new("sim", "local", 4);
        let pkg = JobPackager::new(&device, DeviceCapabilities::none())
            .with_comments("calibration run")
            .package(&CircuitIr::new(1));
        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(json["metadata"]["comments"], "calibration run");
        assert!(json["native_job"]["qcraft_circuit"].is_object());
        assert!(json["metadata"]["timestamp"].as_f64().unwrap() > 0.0);
    }
}
