//! Export redaction policies.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::package::JobPackage;

/// Replacement for redacted metadata values.
pub const REDACTED: &str = "<redacted>";

/// What may leave the machine in a job package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportPolicy {
    /// Export unchanged.
    #[serde(rename = "none")]
    None,
    /// Strip the embedded circuit and redact comments.
    #[default]
    #[serde(rename = "obfuscate")]
    Obfuscate,
    /// Never export.
    #[serde(rename = "strict-local")]
    StrictLocal,
}

impl ExportPolicy {
    /// Policy name as written in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportPolicy::None => "none",
            ExportPolicy::Obfuscate => "obfuscate",
            ExportPolicy::StrictLocal => "strict-local",
        }
    }

    /// Apply the policy to `package`.
    ///
    /// `strict-local` fails with [`ExportError::PermissionDenied`].
    pub fn apply(&self, mut package: JobPackage) -> ExportResult<JobPackage> {
        match self {
            ExportPolicy::None => Ok(package),
            ExportPolicy::StrictLocal => Err(ExportError::PermissionDenied {
                policy: self.as_str().to_string(),
            }),
            ExportPolicy::Obfuscate => {
                package.native_job.qcraft_circuit = None;
                if let Some(comments) = package.metadata.comments.as_mut() {
                    *comments = REDACTED.to_string();
                }
                debug!("Obfuscated job package for {}", package.device);
                Ok(package)
            }
        }
    }
}

impl FromStr for ExportPolicy {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ExportPolicy::None),
            "obfuscate" => Ok(ExportPolicy::Obfuscate),
            "strict-local" => Ok(ExportPolicy::StrictLocal),
            other => Err(ExportError::UnknownPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder recorded instead of a package the policy refused to export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedJob {
    /// Always `"blocked"`.
    pub status: String,
    pub policy: ExportPolicy,
}

impl BlockedJob {
    /// Placeholder for a package blocked by `policy`.
    pub fn new(policy: ExportPolicy) -> Self {
        Self {
            status: "blocked".to_string(),
            policy,
        }
    }
}

/// A package after the export policy ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportedJob {
    Package(Box<JobPackage>),
    Blocked(BlockedJob),
}

impl ExportedJob {
    /// Apply `policy`, turning a permission failure into a [`BlockedJob`].
    ///
    /// Returns the error alongside the placeholder so the caller can log it.
    pub fn from_policy(policy: ExportPolicy, package: JobPackage) -> (Self, Option<ExportError>) {
        match policy.apply(package) {
            Ok(package) => (ExportedJob::Package(Box::new(package)), None),
            Err(e) => (ExportedJob::Blocked(BlockedJob::new(policy)), Some(e)),
        }
    }

    /// Check if export was refused.
    pub fn is_blocked(&self) -> bool {
        matches!(self, ExportedJob::Blocked(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::JobPackager;
    use qcraft_ir::{CircuitIr, DeviceCapabilities, DeviceProfile};

    fn package(comments: Option<&str>) -> JobPackage {
        let device = DeviceProfile::new("sim", "local", 4);
        let mut packager = JobPackager::new(&device, DeviceCapabilities::none());
        if let Some(c) = comments {
            packager = packager.with_comments(c);
        }
        packager.package_at(&CircuitIr::new(1).gate("X", [0]), 10.0)
    }

    #[test]
    fn test_none_is_passthrough() {
        let pkg = package(Some("secret"));
        assert_eq!(ExportPolicy::None.apply(pkg.clone()).unwrap(), pkg);
    }

    #[test]
    fn test_obfuscate() {
        let out = ExportPolicy::Obfuscate.apply(package(Some("secret"))).unwrap();
        assert!(out.native_job.qcraft_circuit.is_none());
        assert_eq!(out.native_job.instructions.len(), 1);
        assert_eq!(out.metadata.comments.as_deref(), Some(REDACTED));

        let out = ExportPolicy::Obfuscate.apply(package(None)).unwrap();
        assert!(out.metadata.comments.is_none());
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["native_job"].get("qcraft_circuit").is_none());
    }

    #[test]
    fn test_strict_local_denies() {
        assert!(matches!(
            ExportPolicy::StrictLocal.apply(package(None)),
            Err(ExportError::PermissionDenied { policy }) if policy == "strict-local"
        ));
        let (job, err) = ExportedJob::from_policy(ExportPolicy::StrictLocal, package(None));
        assert!(job.is_blocked());
        assert!(err.is_some());
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json, serde_json::json!({"status": "blocked", "policy": "strict-local"}));
    }

    #[test]
    fn test_parse_policy_names() {
        assert_eq!("none".parse::<ExportPolicy>().unwrap(), ExportPolicy::None);
        assert_eq!("strict-local".parse::<ExportPolicy>().unwrap(), ExportPolicy::StrictLocal);
        assert!(matches!(
            "encrypt".parse::<ExportPolicy>(),
            Err(ExportError::UnknownPolicy(name)) if name == "encrypt"
        ));
        assert_eq!(ExportPolicy::default(), ExportPolicy::Obfuscate);
        let parsed: ExportPolicy = serde_json::from_str("\"strict-local\"").unwrap();
        assert_eq!(parsed, ExportPolicy::StrictLocal);
    }
}
