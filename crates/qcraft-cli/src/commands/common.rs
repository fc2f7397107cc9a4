//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use qcraft_ir::{CircuitIr, DeviceProfile};
use qcraft_orchestrator::OrchestratorConfig;
use tracing::debug;

/// Load a circuit from a JSON file.
pub fn load_circuit(path: &str) -> Result<CircuitIr> {
    let source = read_json_file(path)?;
    let circuit =
        CircuitIr::from_json(&source).with_context(|| format!("Invalid circuit in {path}"))?;
    circuit
        .validate()
        .with_context(|| format!("Invalid circuit in {path}"))?;
    Ok(circuit)
}

/// Load a device profile from a JSON file.
pub fn load_device(path: &str) -> Result<DeviceProfile> {
    let source = read_json_file(path)?;
    let device =
        DeviceProfile::from_json(&source).with_context(|| format!("Invalid device in {path}"))?;
    device
        .validate()
        .with_context(|| format!("Invalid device in {path}"))?;
    debug!(
        "Loaded device {}/{} with {} qubits",
        device.provider_name, device.device_name, device.max_qubits
    );
    Ok(device)
}

/// Load the orchestrator configuration: defaults, then `path`, then
/// `QCRAFT_*` environment variables.
pub fn load_config(path: Option<&str>) -> Result<OrchestratorConfig> {
    let config = OrchestratorConfig::load(path).context("Failed to load configuration")?;
    debug!(
        "Workflow modules: {}",
        config.workflow_policy.module_sequence.join(", ")
    );
    Ok(config)
}

fn read_json_file(path: &str) -> Result<String> {
    let path_obj = Path::new(path);
    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }
    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !ext.is_empty() && !ext.eq_ignore_ascii_case("json") {
        anyhow::bail!("Unsupported file format '.{ext}': expected JSON");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}
