//! Families command implementation.

use anyhow::Result;
use console::style;

use super::common::{load_config, load_device};

/// Execute the families command.
pub fn execute(config: Option<&str>, device: Option<&str>) -> Result<()> {
    let config = load_config(config)?;
    let device = device.map(load_device).transpose()?;
    let registry = config.family_registry();

    println!("{}", style("Code families:").bold());
    for descriptor in registry.descriptors() {
        if !descriptor.enabled {
            println!("  {} {}", style("-").dim(), style(&descriptor.name).dim());
            continue;
        }
        let provider = match registry.get_family_api(&descriptor.name) {
            Ok(p) => p,
            Err(e) => {
                println!("  {} {}: {}", style("✗").red(), descriptor.name, e);
                continue;
            }
        };
        println!("  {} {}", style("✓").green(), style(&descriptor.name).cyan());
        for layout in provider.list_layout_types() {
            match &device {
                Some(device) => {
                    let distances = provider.list_code_distances(device, &layout);
                    let smallest = distances
                        .first()
                        .map(|&d| format!(", {} qubits at d={d}", provider.required_qubits(&layout, d, 1)))
                        .unwrap_or_default();
                    println!("      {layout:<8} distances {distances:?}{smallest}");
                }
                None => println!("      {layout}"),
            }
        }
    }
    Ok(())
}
