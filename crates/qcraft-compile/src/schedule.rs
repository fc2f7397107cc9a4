//! Syndrome-extraction scheduling and decoder placement.

use qcraft_ir::DeviceCapabilities;
use serde::{Deserialize, Serialize};

/// Decoder batch size when no schedule exists.
pub const DEFAULT_DECODER_BATCH: u64 = 16;

/// Resource schedule for error correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchedule {
    /// Logical cycles between syndrome extraction rounds, in `1..=10`.
    pub syndrome_cadence_cycles: u64,
    /// Fraction of device qubits held back as spare ancillas.
    pub ancilla_reserved_fraction: f64,
    pub decoder_batch_size: u64,
}

impl ResourceSchedule {
    /// Derive a schedule from the T depth and the device size.
    pub fn new(t_depth: u64, max_qubits: u32) -> Self {
        Self {
            syndrome_cadence_cycles: (t_depth / 4 + 1).clamp(1, 10),
            ancilla_reserved_fraction: if max_qubits >= 50 { 0.2 } else { 0.1 },
            decoder_batch_size: (t_depth * 2).max(8),
        }
    }
}

/// Where syndrome decoding runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderPlacement {
    Local,
    Remote,
}

/// Decoder placement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderPlan {
    pub local_decoder: bool,
    pub placement: DecoderPlacement,
    pub batch_size: u64,
}

impl DecoderPlan {
    /// Decode locally iff the device can feed results forward.
    pub fn new(capabilities: &DeviceCapabilities, schedule: Option<&ResourceSchedule>) -> Self {
        let local = capabilities.supports_feed_forward();
        Self {
            local_decoder: local,
            placement: if local {
                DecoderPlacement::Local
            } else {
                DecoderPlacement::Remote
            },
            batch_size: schedule.map_or(DEFAULT_DECODER_BATCH, |s| s.decoder_batch_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_formulas() {
        let s = ResourceSchedule::new(0, 20);
        assert_eq!(s.syndrome_cadence_cycles, 1);
        assert_eq!(s.ancilla_reserved_fraction, 0.1);
        assert_eq!(s.decoder_batch_size, 8);

        let s = ResourceSchedule::new(13, 50);
        assert_eq!(s.syndrome_cadence_cycles, 4);
        assert_eq!(s.ancilla_reserved_fraction, 0.2);
        assert_eq!(s.decoder_batch_size, 26);

        assert_eq!(ResourceSchedule::new(400, 127).syndrome_cadence_cycles, 10);
    }

    #[test]
    fn test_decoder_placement() {
        let schedule = ResourceSchedule::new(10, 60);
        let plan = DecoderPlan::new(&DeviceCapabilities::none().with_conditional(true), Some(&schedule));
        assert!(plan.local_decoder);
        assert_eq!(plan.placement, DecoderPlacement::Local);
        assert_eq!(plan.batch_size, 20);

        let plan = DecoderPlan::new(&DeviceCapabilities::none(), None);
        assert!(!plan.local_decoder);
        assert_eq!(plan.placement, DecoderPlacement::Remote);
        assert_eq!(plan.batch_size, DEFAULT_DECODER_BATCH);

        let json = serde_json::to_value(plan).unwrap();
        assert_eq!(json["placement"], "remote");
    }
}
