//! Device capability flags.
//!
//! A device profile declares the capabilities it knows about; flags it leaves
//! out are resolved by [`detect_capabilities`], which applies provider
//! defaults before falling back to `false`.

use serde::{Deserialize, Serialize};

use crate::device::DeviceProfile;

/// Capability flags as declared in a device profile. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredCapabilities {
    /// Mid-circuit measurement support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid_circuit_measure: Option<bool>,
    /// Classically conditioned operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<bool>,
    /// Full dynamic-circuit support (feed-forward).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_circuits: Option<bool>,
}

impl DeclaredCapabilities {
    /// Declare every flag explicitly.
    pub fn new(mid_circuit_measure: bool, conditional: bool, dynamic_circuits: bool) -> Self {
        Self {
            mid_circuit_measure: Some(mid_circuit_measure),
            conditional: Some(conditional),
            dynamic_circuits: Some(dynamic_circuits),
        }
    }
}

/// Resolved capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Mid-circuit measurement support.
    #[serde(default)]
    pub mid_circuit_measure: bool,
    /// Classically conditioned operations.
    #[serde(default)]
    pub conditional: bool,
    /// Full dynamic-circuit support (feed-forward).
    #[serde(default)]
    pub dynamic_circuits: bool,
}

impl DeviceCapabilities {
    /// No capabilities.
    pub fn none() -> Self {
        Self::default()
    }

    /// All capabilities.
    pub fn all() -> Self {
        Self {
            mid_circuit_measure: true,
            conditional: true,
            dynamic_circuits: true,
        }
    }

    /// Set the conditional flag.
    #[must_use]
    pub fn with_conditional(mut self, conditional: bool) -> Self {
        self.conditional = conditional;
        self
    }

    /// Set the dynamic-circuits flag.
    #[must_use]
    pub fn with_dynamic_circuits(mut self, dynamic: bool) -> Self {
        self.dynamic_circuits = dynamic;
        self
    }

    /// Whether the device can act on measurement results during a run.
    pub fn supports_feed_forward(&self) -> bool {
        self.conditional || self.dynamic_circuits
    }
}

/// Resolve the capabilities of a device.
///
/// IBM backends default every undeclared flag to `true`; other providers
/// default to `false`. Explicitly declared flags always win.
pub fn detect_capabilities(device: &DeviceProfile) -> DeviceCapabilities {
    let declared = device.capabilities;
    let fallback = device.provider_name.eq_ignore_ascii_case("ibm");
    DeviceCapabilities {
        mid_circuit_measure: declared.mid_circuit_measure.unwrap_or(fallback),
        conditional: declared.conditional.unwrap_or(fallback),
        dynamic_circuits: declared.dynamic_circuits.unwrap_or(fallback),
    }
}
