//! Signed provenance manifests.
//!
//! The signature is the hex SHA-256 of the compact, key-sorted JSON encoding
//! of `{metadata, timestamp, version}`. It detects tampering; it does not
//! authenticate the signer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ExportResult;
use crate::package::unix_seconds;

/// Manifest format version.
pub const MANIFEST_VERSION: &str = "1.0";

/// Signature algorithm identifier.
pub const SIGNATURE_ALG: &str = "sha256";

/// Record of the compilation decisions behind a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceManifest {
    pub version: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub metadata: Value,
    pub signature: String,
    pub signature_alg: String,
}

impl ProvenanceManifest {
    /// Sign `metadata` at the current time.
    pub fn generate(metadata: &impl Serialize) -> ExportResult<Self> {
        Self::generate_at(metadata, unix_seconds())
    }

    /// Sign `metadata` at `timestamp`.
    pub fn generate_at(metadata: &impl Serialize, timestamp: f64) -> ExportResult<Self> {
        let metadata = serde_json::to_value(metadata)?;
        let signature = sign(MANIFEST_VERSION, timestamp, &metadata)?;
        Ok(Self {
            version: MANIFEST_VERSION.to_string(),
            timestamp,
            metadata,
            signature,
            signature_alg: SIGNATURE_ALG.to_string(),
        })
    }

    /// Recompute the signature and compare.
    pub fn verify(&self) -> ExportResult<bool> {
        Ok(sign(&self.version, self.timestamp, &self.metadata)? == self.signature)
    }
}

fn sign(version: &str, timestamp: f64, metadata: &Value) -> ExportResult<String> {
    let canonical = canonical_json(version, timestamp, metadata)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Compact JSON of the signed body with object keys sorted at every level,
/// whatever order the `Value` maps keep.
fn canonical_json(version: &str, timestamp: f64, metadata: &Value) -> ExportResult<String> {
    #[derive(Serialize)]
    struct SignedBody<'a> {
        metadata: Sorted<'a>,
        timestamp: f64,
        version: &'a str,
    }

    Ok(serde_json::to_string(&SignedBody {
        metadata: Sorted(metadata),
        timestamp,
        version,
    })?)
}

struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let sorted: BTreeMap<&str, Sorted<'_>> =
                    map.iter().map(|(k, v)| (k.as_str(), Sorted(v))).collect();
                sorted.serialize(serializer)
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(Sorted)),
            other => other.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_signature() {
        let manifest = ProvenanceManifest::generate_at(&json!({"b": 1, "a": "x"}), 1.5).unwrap();
        let canonical = r#"{"metadata":{"a":"x","b":1},"timestamp":1.5,"version":"1.0"}"#;
        assert_eq!(manifest.signature, hex::encode(Sha256::digest(canonical.as_bytes())));
        assert_eq!(manifest.version, "1.0");
        assert_eq!(manifest.signature_alg, "sha256");
        assert_eq!(manifest.signature.len(), 64);
    }

    #[test]
    fn test_tampering_is_detected() {
        let mut manifest =
            ProvenanceManifest::generate_at(&json!({"device": "ibm_kyiv"}), 100.0).unwrap();
        assert!(manifest.verify().unwrap());
        manifest.metadata["device"] = json!("ibm_sherbrooke");
        assert!(!manifest.verify().unwrap());
    }

    #[test]
    fn test_current_time() {
        let manifest = ProvenanceManifest::generate(&json!({})).unwrap();
        assert!(manifest.timestamp > 0.0);
        assert!(manifest.verify().unwrap());
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let mut inner = serde_json::Map::new();
        inner.insert("z".into(), json!(1));
        inner.insert("a".into(), json!([{"y": true, "b": null}]));
        let mut outer = serde_json::Map::new();
        outer.insert("kpis".into(), Value::Object(inner));
        outer.insert("device".into(), json!("line"));

        let canonical = canonical_json("1.0", 2.0, &Value::Object(outer)).unwrap();
        assert_eq!(
            canonical,
            r#"{"metadata":{"device":"line","kpis":{"a":[{"b":null,"y":true}],"z":1}},"timestamp":2.0,"version":"1.0"}"#
        );
    }
}
