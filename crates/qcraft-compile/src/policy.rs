//! Protocol selection for gates a code cannot implement transversally.

use std::collections::{BTreeMap, BTreeSet};

use qcraft_ir::{CircuitIr, DeviceCapabilities, gate};
use serde::{Deserialize, Serialize};

/// Fault-tolerant implementation protocol for a non-transversal gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    MagicStateInjection,
    LatticeSurgery,
    Teleportation,
}

impl Protocol {
    /// Wire name of the protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::MagicStateInjection => "magic_state_injection",
            Protocol::LatticeSurgery => "lattice_surgery",
            Protocol::Teleportation => "teleportation",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured protocol preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolPreferences {
    /// Preferred protocol for non-Clifford gates on feed-forward devices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer: Option<Protocol>,
    /// Fixed protocol per gate name (case-insensitive).
    pub per_gate: BTreeMap<String, Protocol>,
}

impl ProtocolPreferences {
    /// Set the preferred protocol.
    #[must_use]
    pub fn with_prefer(mut self, protocol: Protocol) -> Self {
        self.prefer = Some(protocol);
        self
    }

    /// Pin the protocol for one gate.
    #[must_use]
    pub fn with_gate(mut self, gate: impl Into<String>, protocol: Protocol) -> Self {
        self.per_gate.insert(gate.into(), protocol);
        self
    }

    fn pinned(&self, gate_name: &str) -> Option<Protocol> {
        self.per_gate
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(gate_name.trim()))
            .map(|(_, &p)| p)
    }
}

/// Select the protocol for `gate_name`.
///
/// A per-gate preference always wins. Non-Clifford gates use lattice surgery
/// (or the preferred protocol, if it is lattice surgery or magic-state
/// injection) on devices with feed-forward, and magic-state injection
/// otherwise. Every other gate is teleported.
pub fn select_protocol(
    gate_name: &str,
    capabilities: &DeviceCapabilities,
    preferences: &ProtocolPreferences,
) -> Protocol {
    if let Some(pinned) = preferences.pinned(gate_name) {
        return pinned;
    }
    if !gate::is_non_clifford(gate_name) {
        return Protocol::Teleportation;
    }
    if capabilities.supports_feed_forward() {
        match preferences.prefer {
            Some(p @ (Protocol::LatticeSurgery | Protocol::MagicStateInjection)) => p,
            _ => Protocol::LatticeSurgery,
        }
    } else {
        Protocol::MagicStateInjection
    }
}

/// A gate that needs a protocol switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchPoint {
    /// Position of the gate in the circuit.
    pub gate_index: usize,
    pub gate: String,
    pub protocol: Protocol,
}

/// List every gate outside `supported` with the protocol chosen for it.
///
/// `supported` is matched case-insensitively with `CX` and `CNOT` treated
/// as the same gate.
pub fn plan_code_switching(
    circuit: &CircuitIr,
    supported: &BTreeSet<String>,
    capabilities: &DeviceCapabilities,
    preferences: &ProtocolPreferences,
) -> Vec<SwitchPoint> {
    let supported: BTreeSet<String> = supported.iter().map(|g| gate::canonical_name(g)).collect();
    circuit
        .gates
        .iter()
        .enumerate()
        .filter(|(_, g)| !supported.contains(&gate::canonical_name(&g.name)))
        .map(|(i, g)| SwitchPoint {
            gate_index: i,
            gate: g.name.clone(),
            protocol: select_protocol(&g.name, capabilities, preferences),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_clifford_without_feed_forward() {
        let prefs = ProtocolPreferences::default().with_prefer(Protocol::LatticeSurgery);
        for g in ["T", "tdg", "CCX", "cs", "CSdg"] {
            assert_eq!(
                select_protocol(g, &DeviceCapabilities::none(), &prefs),
                Protocol::MagicStateInjection
            );
        }
    }

    #[test]
    fn test_non_clifford_with_feed_forward() {
        let caps = DeviceCapabilities::none().with_conditional(true);
        let none = ProtocolPreferences::default();
        assert_eq!(select_protocol("T", &caps, &none), Protocol::LatticeSurgery);

        let msi = ProtocolPreferences::default().with_prefer(Protocol::MagicStateInjection);
        assert_eq!(select_protocol("T", &caps, &msi), Protocol::MagicStateInjection);

        let tele = ProtocolPreferences::default().with_prefer(Protocol::Teleportation);
        let dynamic = DeviceCapabilities::none().with_dynamic_circuits(true);
        assert_eq!(select_protocol("CCX", &dynamic, &tele), Protocol::LatticeSurgery);
    }

    #[test]
    fn test_clifford_and_unknown_teleport() {
        let prefs = ProtocolPreferences::default().with_prefer(Protocol::LatticeSurgery);
        assert_eq!(
            select_protocol("SDG", &DeviceCapabilities::all(), &prefs),
            Protocol::Teleportation
        );
        assert_eq!(
            select_protocol("RZ", &DeviceCapabilities::none(), &prefs),
            Protocol::Teleportation
        );
    }

    #[test]
    fn test_per_gate_override_wins() {
        let prefs = ProtocolPreferences::default().with_gate("t", Protocol::Teleportation);
        assert_eq!(
            select_protocol("T", &DeviceCapabilities::all(), &prefs),
            Protocol::Teleportation
        );
    }

    #[test]
    fn test_plan_code_switching() {
        let circuit = CircuitIr::new(2)
            .gate("H", [0])
            .gate("T", [0])
            .gate("cx", [0, 1])
            .gate("SDG", [1]);
        let supported: BTreeSet<String> =
            ["X", "Z", "CNOT", "H", "S", "MEASURE"].map(String::from).into();
        let plan = plan_code_switching(
            &circuit,
            &supported,
            &DeviceCapabilities::none(),
            &ProtocolPreferences::default(),
        );
        assert_eq!(
            plan,
            vec![
                SwitchPoint {
                    gate_index: 1,
                    gate: "T".into(),
                    protocol: Protocol::MagicStateInjection
                },
                SwitchPoint {
                    gate_index: 3,
                    gate: "SDG".into(),
                    protocol: Protocol::Teleportation
                },
            ]
        );
    }

    #[test]
    fn test_protocol_serde_names() {
        let json = serde_json::to_string(&Protocol::MagicStateInjection).unwrap();
        assert_eq!(json, "\"magic_state_injection\"");
        let prefs: ProtocolPreferences =
            serde_json::from_str(r#"{"prefer": "lattice_surgery", "per_gate": {"CCX": "teleportation"}}"#)
                .unwrap();
        assert_eq!(prefs.prefer, Some(Protocol::LatticeSurgery));
        assert_eq!(prefs.pinned("ccx"), Some(Protocol::Teleportation));
    }
}
