//! QCraft export boundary.
//!
//! Packages a compiled circuit for a provider ([`JobPackager`]), applies the
//! configured [`ExportPolicy`] and signs a [`ProvenanceManifest`] describing
//! the compilation decisions.

pub mod error;
pub mod manifest;
pub mod package;
pub mod policy;

pub use error::{ExportError, ExportResult};
pub use manifest::{MANIFEST_VERSION, ProvenanceManifest, SIGNATURE_ALG};
pub use package::{JobMetadata, JobPackage, JobPackager, NativeJob, unix_seconds};
pub use policy::{BlockedJob, ExportPolicy, ExportedJob, REDACTED};
