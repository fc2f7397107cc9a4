//! QCraft QEC Code Families
//!
//! Generation of error-correcting code patches and their placement on
//! hardware.
//!
//! # Core Components
//!
//! - **Code spaces**: [`CodeSpace`] for one patch, [`MultiPatchLayout`] for
//!   several patches in a shared global id space
//! - **Families**: the [`FamilyProvider`] trait with the [`SurfaceProvider`]
//!   (planar, rotated, color) and [`QldpcProvider`] (declared parity checks)
//! - **Registry**: [`FamilyRegistry`], an explicit table of provider
//!   factories keyed by family name
//! - **Mapping**: the [`MappingStrategy`] contract and the deterministic
//!   [`GreedyMapper`]
//! - **Distance selection**: [`AutoDistanceSelector`] driven by a
//!   [`LogicalErrorEstimator`]
//!
//! # Example
//!
//! ```rust
//! use qcraft_codes::{FamilyRegistry, MappingConstraints};
//! use qcraft_ir::{DeviceProfile, QubitGraph};
//!
//! let registry = FamilyRegistry::with_builtin_families();
//! let surface = registry.get_family_api("surface").unwrap();
//!
//! let device = DeviceProfile::new("sim", "grid", 64).with_connectivity(QubitGraph::grid(8, 8));
//! let mapped = surface
//!     .get_multi_patch_mapping(Some(3), "planar", &MappingConstraints::with_patches(2), &device)
//!     .unwrap();
//! assert_eq!(mapped.layout.num_patches(), 2);
//! assert!(!mapped.mapping.has_overlap);
//! ```

pub mod code_space;
pub mod error;
pub mod estimator;
pub mod kpis;
pub mod mapper;
pub mod provider;
pub mod qldpc;
pub mod registry;
pub mod selector;
pub mod surface;

pub use code_space::{
    CodeSpace, LogicalOperators, MultiPatchLayout, PatchInfo, QubitRole, QubitSite, Stabilizer,
    StabilizerMap,
};
pub use error::{CodeError, CodeResult};
pub use estimator::{LogicalErrorEstimator, NoiseModel, ThresholdEstimator};
pub use kpis::MappingKpis;
pub use mapper::{
    GreedyMapper, Mapping, MappingConstraints, MappingMetrics, MappingStrategy, PatchAssignment,
};
pub use provider::{DEFAULT_DISTANCE, FamilyProvider, MappedLayout};
pub use qldpc::{QldpcCodeSpec, QldpcConfig, QldpcProvider};
pub use registry::{FamilyDescriptor, FamilyRegistry};
pub use selector::AutoDistanceSelector;
pub use surface::SurfaceProvider;
