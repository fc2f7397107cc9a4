//! Provenance and export policy properties.

use proptest::prelude::*;
use qcraft_export::{ExportPolicy, JobPackager, ProvenanceManifest};
use qcraft_ir::{CircuitIr, DeviceCapabilities, DeviceProfile};
use serde_json::json;

proptest! {
    /// The same metadata and timestamp always produce the same signature.
    #[test]
    fn test_signature_is_deterministic(
        device in "[a-z_]{1,12}",
        distance in 3_u32..15,
        timestamp in 0.0_f64..2.0e9,
    ) {
        let metadata = json!({"device": device, "code_distance": distance, "strategy": "A"});
        let first = ProvenanceManifest::generate_at(&metadata, timestamp).unwrap();
        let second = ProvenanceManifest::generate_at(&metadata, timestamp).unwrap();
        prop_assert_eq!(&first.signature, &second.signature);
        prop_assert!(first.verify().unwrap());
    }

    /// Changing the timestamp changes the signature.
    #[test]
    fn test_signature_covers_timestamp(t in 0.0_f64..1.0e9, dt in 1.0_f64..1000.0) {
        let metadata = json!({"provider": "sim"});
        let a = ProvenanceManifest::generate_at(&metadata, t).unwrap();
        let b = ProvenanceManifest::generate_at(&metadata, t + dt).unwrap();
        prop_assert_ne!(a.signature, b.signature);
    }
}

#[test]
fn test_obfuscated_package_keeps_instructions() {
    let device = DeviceProfile::new("sim", "local", 8);
    let circuit = CircuitIr::new(2).gate("H", [0]).gate("CX", [0, 1]);
    let pkg = JobPackager::new(&device, DeviceCapabilities::none())
        .with_comments("internal")
        .package(&circuit);

    let exported = ExportPolicy::Obfuscate.apply(pkg).unwrap();
    let json = serde_json::to_value(&exported).unwrap();
    assert_eq!(json["native_job"]["instructions"].as_array().unwrap().len(), 2);
    assert!(json["native_job"].get("qcraft_circuit").is_none());
    assert_eq!(json["metadata"]["comments"], "<redacted>");
}
