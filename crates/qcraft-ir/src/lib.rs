//! QCraft Circuit and Device Model
//!
//! This crate holds the boundary types every other QCraft crate builds on:
//! the logical circuit handed to the compiler and the immutable profile of the
//! target device.
//!
//! # Core Components
//!
//! - **Circuit**: [`CircuitIr`] with [`QubitSpec`] and ordered [`GateRecord`]s
//! - **Device**: [`DeviceProfile`] with per-gate and per-qubit error data
//! - **Connectivity**: [`QubitGraph`], an undirected graph over canonical
//!   `u32` qubit ids with deterministic iteration order
//! - **Capabilities**: [`DeviceCapabilities`] resolved by
//!   [`detect_capabilities`]
//! - **Gate classes**: [`gate::classify`] and friends
//!
//! # Example
//!
//! ```rust
//! use qcraft_ir::{CircuitIr, DeviceProfile, QubitGraph};
//!
//! let circuit = CircuitIr::new(2).gate("H", [0]).gate("CNOT", [0, 1]);
//! circuit.validate().unwrap();
//!
//! let device = DeviceProfile::new("sim", "line-5", 5)
//!     .with_connectivity(QubitGraph::linear(5))
//!     .with_gate_error("cx", 0.01);
//! assert_eq!(device.physical_qubits().len(), 5);
//! ```

pub mod capability;
pub mod circuit;
pub mod device;
pub mod error;
pub mod gate;
pub mod graph;

pub use capability::{DeclaredCapabilities, DeviceCapabilities, detect_capabilities};
pub use circuit::{CircuitIr, GateRecord, QubitSpec};
pub use device::{DeviceProfile, QubitProperties};
pub use error::{IrError, IrResult};
pub use gate::GateClass;
pub use graph::QubitGraph;
