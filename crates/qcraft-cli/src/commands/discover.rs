//! Discover command implementation.

use anyhow::Result;
use console::style;
use qcraft_compile::PatchDiscoverer;

use super::common::{load_circuit, load_config, load_device};

/// Execute the discover command.
pub fn execute(input: &str, device: &str, config: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let circuit = load_circuit(input)?;
    let device = load_device(device)?;
    let registry = config.family_registry();

    let discovery = PatchDiscoverer::new(&registry, &device)
        .with_cost_config(config.cost_model.clone())
        .discover(&circuit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
        return Ok(());
    }

    if discovery.candidates.is_empty() {
        println!(
            "{} No code patch fits {} logical qubit(s) on {} ({} qubits)",
            style("!").yellow().bold(),
            circuit.num_qubits(),
            device.device_name,
            device.max_qubits
        );
        return Ok(());
    }

    println!(
        "{} {} candidate(s) for {} on {}:\n",
        style("✓").green().bold(),
        discovery.candidates.len(),
        style(input).green(),
        style(&device.device_name).yellow()
    );
    println!(
        "  {:<4} {:<8} {:<8} {:>3} {:>8} {:>8} {:>10}",
        "#", "family", "layout", "d", "qubits", "ancilla", "score"
    );
    for (rank, c) in discovery.candidates.iter().enumerate() {
        println!(
            "  {:<4} {:<8} {:<8} {:>3} {:>8} {:>8} {:>10.4}",
            rank + 1,
            c.family,
            c.layout_type,
            c.distance,
            c.resources.phys_qubits,
            c.resources.ancilla,
            c.score
        );
    }
    if let Some(patches) = discovery.hints.num_patches {
        println!("\n  Hint: {} patch(es), shapes {:?}", patches, discovery.hints.patch_shapes);
    }
    Ok(())
}
